//! Speech-weighted SNR estimation and helpers for mixing signals.
//!
//! - [`signal::speechweighted_snr`] filters a target and a noise signal through a fixed speech
//!   weighting filter and returns the ratio of their RMS values. The bundled taps are a
//!   stand-in design; see [`signal::weighting`] for importing the reference coefficients.
//! - [`signal::pad`] and [`signal::sum_signals`] zero pad and add signals of different lengths
//!   along their time axis (axis 0), for any number of channels.
//!
//! ```
//! use ndarray::array;
//! use speech_snr::signal::{speechweighted_snr, sum_signals};
//!
//! let target: Vec<f64> = (0..2205).map(|i| (i as f64 * 0.05).sin()).collect();
//! let noise: Vec<f64> = (0..2205).map(|i| 0.1 * (i as f64 * 1.3).cos()).collect();
//! let snr = speechweighted_snr(&target, &noise).unwrap();
//! assert!(snr > 1.0);
//!
//! let mix = sum_signals(&[array![1.0, 1.0, 1.0], array![0.5]]).unwrap();
//! assert_eq!(mix, array![1.5, 1.0, 1.0]);
//! ```

#![deny(missing_docs)]

pub mod kernel;

pub mod signal;

pub mod stats;

pub use ndarray;
pub use speech_snr_core::{Error, Result};
