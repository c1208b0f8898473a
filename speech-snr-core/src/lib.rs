//! Core numeric routines shared by the `speech-snr` crates.
//!
//! Holds the common [`Error`] type and numpy-flavoured array routines in [`num_rs`].

#![deny(missing_docs)]

mod error;

/// Numpy-style routines over one-dimensional arrays.
pub mod num_rs;

pub use error::*;
