//! Linear convolution with a selectable time- or frequency-domain method.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D};
use crate::signal::traits::Convolve1D;
use ndarray::ArrayView1;
use num_traits::{Float, NumAssign};
use rustfft::FftNum;
use speech_snr_core::num_rs;
use speech_snr_core::Result;

pub use speech_snr_core::num_rs::ConvolveMode;

/// Below this many multiply-adds the direct method beats the transform overhead.
const DIRECT_MAX_PRODUCTS: usize = 4096;
/// Inputs this short are always convolved directly.
const DIRECT_MIN_LEN: usize = 8;

/// How the convolution is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvolveMethod {
    /// Pick [ConvolveMethod::Direct] or [ConvolveMethod::Fft] from the input sizes.
    #[default]
    Auto,
    /// Time-domain sum of products.
    Direct,
    /// Zero-padded FFT, multiply, inverse FFT.
    Fft,
}

/// Resolve [ConvolveMethod::Auto] into a concrete method for inputs of length `n` and `m`.
///
/// ```
/// use speech_snr::signal::convolve::{choose_conv_method, ConvolveMethod};
///
/// assert_eq!(choose_conv_method(32, 16), ConvolveMethod::Direct);
/// assert_eq!(choose_conv_method(48_000, 513), ConvolveMethod::Fft);
/// assert_eq!(choose_conv_method(1_000_000, 4), ConvolveMethod::Direct);
/// ```
pub fn choose_conv_method(n: usize, m: usize) -> ConvolveMethod {
    if n.min(m) < DIRECT_MIN_LEN || n.saturating_mul(m) <= DIRECT_MAX_PRODUCTS {
        ConvolveMethod::Direct
    } else {
        ConvolveMethod::Fft
    }
}

/// Convolve two one-dimensional sequences.
///
/// Mirrors `scipy.signal.convolve` for 1D input: `mode` selects the output window (see
/// [ConvolveMode]) and `method` how it is computed. Both methods agree to within
/// floating-point rounding. Empty input on either side returns an empty output.
///
/// ```
/// use approx::assert_abs_diff_eq;
/// use speech_snr::signal::convolve::{convolve, ConvolveMethod, ConvolveMode};
///
/// let a = [1., 2., 3.];
/// let v = [0., 1., 0.5];
/// let expected = [0., 1., 2.5, 4., 1.5];
/// for method in [ConvolveMethod::Direct, ConvolveMethod::Fft, ConvolveMethod::Auto] {
///     let y = convolve(&a, &v, ConvolveMode::Full, method).unwrap();
///     for (y, e) in y.iter().zip(expected) {
///         assert_abs_diff_eq!(*y, e, epsilon = 1e-12);
///     }
/// }
/// ```
pub fn convolve<F>(
    in1: &[F],
    in2: &[F],
    mode: ConvolveMode,
    method: ConvolveMethod,
) -> Result<Vec<F>>
where
    F: Float + FftNum + NumAssign,
{
    let method = match method {
        ConvolveMethod::Auto => {
            let chosen = choose_conv_method(in1.len(), in2.len());
            tracing::trace!(
                in1_len = in1.len(),
                in2_len = in2.len(),
                method = ?chosen,
                "auto-selected convolution method"
            );
            chosen
        }
        method => method,
    };

    match method {
        ConvolveMethod::Fft => num_rs::fftconvolve(in1, in2, mode),
        _ => num_rs::convolve(ArrayView1::from(in1), ArrayView1::from(in2), mode)
            .map(|y| y.to_vec()),
    }
}

/// Constructor config for [`ConvolveKernel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvolveConfig {
    /// Output window.
    pub mode: ConvolveMode,
    /// Evaluation method.
    pub method: ConvolveMethod,
}

/// Checked 1D convolution kernel.
#[derive(Debug, Clone, Copy)]
pub struct ConvolveKernel {
    mode: ConvolveMode,
    method: ConvolveMethod,
}

impl ConvolveKernel {
    /// Configured output window.
    pub fn mode(&self) -> ConvolveMode {
        self.mode
    }

    /// Configured evaluation method.
    pub fn method(&self) -> ConvolveMethod {
        self.method
    }
}

impl KernelLifecycle for ConvolveKernel {
    type Config = ConvolveConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        Ok(Self {
            mode: config.mode,
            method: config.method,
        })
    }
}

impl<F> Convolve1D<F> for ConvolveKernel
where
    F: Float + FftNum + NumAssign,
{
    fn run_into<I1, I2, O>(
        &self,
        in1: &I1,
        in2: &I2,
        out: &mut O,
    ) -> core::result::Result<(), ExecInvariantViolation>
    where
        I1: Read1D<F> + ?Sized,
        I2: Read1D<F> + ?Sized,
        O: Write1D<F> + ?Sized,
    {
        let in1 = in1.read_slice().map_err(ExecInvariantViolation::from)?;
        let in2 = in2.read_slice().map_err(ExecInvariantViolation::from)?;
        let out_slice = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        let expected = self.mode.output_len(in1.len(), in2.len());
        if out_slice.len() != expected {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected,
                got: out_slice.len(),
            });
        }
        let y = convolve(in1, in2, self.mode, self.method)?;
        out_slice.copy_from_slice(&y);
        Ok(())
    }

    fn run_alloc<I1, I2>(
        &self,
        in1: &I1,
        in2: &I2,
    ) -> core::result::Result<Vec<F>, ExecInvariantViolation>
    where
        I1: Read1D<F> + ?Sized,
        I2: Read1D<F> + ?Sized,
    {
        let in1 = in1.read_slice().map_err(ExecInvariantViolation::from)?;
        let in2 = in2.read_slice().map_err(ExecInvariantViolation::from)?;
        Ok(convolve(in1, in2, self.mode, self.method)?)
    }
}
