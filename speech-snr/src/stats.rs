//! Reductions used to measure signal energy.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use core::{borrow::Borrow, ops::Add};
use num_traits::{Float, Num, NumCast};

/// 1D root-mean-square reduction capability.
pub trait RmsReduce1D<T> {
    /// Compute the RMS and sample count.
    fn run<I>(&self, input: &I) -> Result<(T, usize), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// Empty config for stateless kernels.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsConfig;

/// RMS kernel over contiguous input.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmsKernel;

impl KernelLifecycle for RmsKernel {
    type Config = StatsConfig;

    fn try_new(_: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self)
    }
}

impl<T> RmsReduce1D<T> for RmsKernel
where
    T: Float + Default,
{
    fn run<I>(&self, input: &I) -> Result<(T, usize), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        Ok((rms(input.iter()), input.len()))
    }
}

///
/// Compute the mean of the signal, `y`
///
/// Return the mean and the number of points averaged
///
/// ```
/// use approx::assert_relative_eq;
/// use speech_snr::stats::mean;
///
/// let y: [f64; 5] = [1.,2.,3.,4.,5.];
/// assert_relative_eq!(3f64, mean::<_, f64>(y.iter()).0);
///
/// let y: [i64; 5] = [1,2,3,4,5];
/// assert_eq!(3i64, mean::<_, i64>(y.iter()).0);
///
/// let y: &[f32] = &[];
/// assert_eq!((0f32, 0), mean::<_, f32>(y.iter()));
///
/// ```
///
pub fn mean<YI, F>(y: YI) -> (F, usize)
where
    F: Num + NumCast + Default + Copy + Add,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    let (sum, count) = y.fold(Default::default(), |acc: (F, usize), yi| {
        (acc.0 + *yi.borrow(), acc.1 + 1)
    });
    match F::from(count) {
        Some(n) if count > 0 => (sum / n, count),
        _ => Default::default(),
    }
}

///
/// Root Mean Square (RMS) of signal `y`, `sqrt(mean(y^2))`.
///
/// No mean is removed first. An empty signal has no defined energy and yields NaN.
///
/// ```
/// use approx::assert_relative_eq;
/// use speech_snr::stats::rms;
///
/// let y: [f64; 4] = [1., -1., 1., -1.];
/// assert_relative_eq!(1f64, rms::<_, f64>(y.iter()));
///
/// let y: [f64; 2] = [3., 4.];
/// assert_relative_eq!(12.5f64.sqrt(), rms::<_, f64>(y.iter()));
///
/// let y: &[f64] = &[];
/// assert!(rms::<_, f64>(y.iter()).is_nan());
/// ```
pub fn rms<YI, F>(y: YI) -> F
where
    F: Float + Default,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    match mean::<_, F>(y.map(|yi| {
        let yi = *yi.borrow();
        yi * yi
    })) {
        (_, 0) => F::nan(),
        (mean_square, _) => mean_square.sqrt(),
    }
}
