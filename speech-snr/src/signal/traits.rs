//! Trait interfaces for signal-processing capabilities.

use crate::kernel::{ExecInvariantViolation, Read1D, Write1D};

/// 1D convolution capability.
pub trait Convolve1D<T> {
    /// Run convolution into a caller-provided output buffer.
    fn run_into<I1, I2, O>(
        &self,
        in1: &I1,
        in2: &I2,
        out: &mut O,
    ) -> Result<(), ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run convolution and allocate output.
    fn run_alloc<I1, I2>(&self, in1: &I1, in2: &I2) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized;
}

/// Energy ratio between a target signal and an interfering signal.
pub trait SignalRatio1D<T> {
    /// Compute `energy(target) / energy(noise)` as an amplitude ratio.
    fn run<I1, I2>(&self, target: &I1, noise: &I2) -> Result<T, ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized;
}
