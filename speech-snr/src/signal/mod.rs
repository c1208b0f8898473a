//! Signal processing: weighting, convolution, SNR estimation and signal summation.

/// Linear convolution, `scipy.signal.convolve` style.
pub mod convolve;

/// Zero padding and summation along the time axis.
pub mod padding;

/// Speech-weighted SNR estimation.
pub mod snr;

/// Capability traits implemented by the kernels.
pub mod traits;

/// Speech weighting filter coefficients.
pub mod weighting;

pub use padding::{pad, sum_signals};
pub use snr::speechweighted_snr;
