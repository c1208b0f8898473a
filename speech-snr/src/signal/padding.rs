//! Zero padding and summation of signals along the time axis.
//!
//! Signals are ndarrays whose first axis is time; any further axes (channels, ...) are carried
//! through untouched. Mono and stereo signals are handled alike.

use crate::kernel::{ConfigError, KernelLifecycle};
use core::ops::AddAssign;
use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Slice};
use num_traits::Zero;
use speech_snr_core::{Error, Result};

/// Time axis of every signal.
const TIME: Axis = Axis(0);

/// Zero pad `signal` along its first axis to `length` samples.
///
/// Other axes get no padding. The input is left as is and a new array is returned.
///
/// # Errors
/// - `signal` is zero-dimensional, so it has no time axis.
/// - `length` is shorter than the signal. Signals are never truncated.
///
/// ```
/// use ndarray::array;
/// use speech_snr::signal::padding::pad;
///
/// let stereo = array![[1, -1], [2, -2]];
/// assert_eq!(pad(&stereo, 3).unwrap(), array![[1, -1], [2, -2], [0, 0]]);
/// assert!(pad(&stereo, 1).is_err());
/// ```
pub fn pad<A, S, D>(signal: &ArrayBase<S, D>, length: usize) -> Result<Array<A, D>>
where
    A: Clone + Zero,
    S: Data<Elem = A>,
    D: Dimension,
{
    let current = time_len(signal, "signal")?;
    if length < current {
        return Err(Error::InvalidArg {
            arg: "length".into(),
            reason: format!("cannot pad a {current} sample signal to {length} samples"),
        });
    }

    let mut shape = signal.raw_dim();
    shape[TIME.index()] = length;
    let mut padded = Array::zeros(shape);
    padded
        .slice_axis_mut(TIME, Slice::from(..current))
        .assign(signal);
    Ok(padded)
}

/// Sum signals of possibly different lengths.
///
/// Every signal is zero padded to the longest one and the results are added sample by sample,
/// so a shorter signal contributes nothing past its own end. The output has as many samples as
/// the longest input.
///
/// # Errors
/// - `signals` is empty.
/// - A signal is zero-dimensional.
/// - Signals disagree on any axis other than time (channel count, ...).
///
/// ```
/// use ndarray::array;
/// use speech_snr::signal::padding::sum_signals;
///
/// let speech = array![0.5, 0.5, 0.5];
/// let noise = array![0.25];
/// assert_eq!(sum_signals(&[speech, noise]).unwrap(), array![0.75, 0.5, 0.5]);
/// ```
pub fn sum_signals<A, S, D>(signals: &[ArrayBase<S, D>]) -> Result<Array<A, D>>
where
    A: Clone + Zero + AddAssign,
    S: Data<Elem = A>,
    D: Dimension,
{
    let (first, rest) = signals.split_first().ok_or_else(|| Error::EmptyInput {
        arg: "signals".into(),
    })?;

    let mut max_len = time_len(first, "signals[0]")?;
    for (i, signal) in rest.iter().enumerate() {
        if signal.ndim() != first.ndim() || signal.shape()[1..] != first.shape()[1..] {
            let mut expected = first.shape().to_vec();
            expected[TIME.index()] = signal.shape().first().copied().unwrap_or(0);
            return Err(Error::ShapeMismatch {
                arg: format!("signals[{}]", i + 1),
                expected,
                got: signal.shape().to_vec(),
            });
        }
        max_len = max_len.max(signal.len_of(TIME));
    }

    let mut total = pad(first, max_len)?;
    for signal in rest {
        let mut head = total.slice_axis_mut(TIME, Slice::from(..signal.len_of(TIME)));
        head += signal;
    }
    Ok(total)
}

/// Length of the time axis, or an error for arrays without one.
fn time_len<S, D>(signal: &ArrayBase<S, D>, arg: &str) -> Result<usize>
where
    S: Data,
    D: Dimension,
{
    if signal.ndim() == 0 {
        return Err(Error::InvalidArg {
            arg: arg.into(),
            reason: "a signal needs a time axis".into(),
        });
    }
    Ok(signal.len_of(TIME))
}

/// Constructor config for [`PadKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadConfig {
    /// Number of samples along the time axis after padding.
    pub length: usize,
}

/// Pads signals to a fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadKernel {
    length: usize,
}

impl KernelLifecycle for PadKernel {
    type Config = PadConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        Ok(Self {
            length: config.length,
        })
    }
}

impl PadKernel {
    /// Configured output length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Pad `signal` to the configured length. See [`pad`].
    pub fn run<A, S, D>(&self, signal: &ArrayBase<S, D>) -> Result<Array<A, D>>
    where
        A: Clone + Zero,
        S: Data<Elem = A>,
        D: Dimension,
    {
        pad(signal, self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, array, s, Array1, Array2, ArrayD, IxDyn};
    use rand::Rng;

    #[test]
    fn pad_to_same_length_is_identity() {
        let x = array![0.1, -0.2, 0.3];
        assert_eq!(pad(&x, 3).unwrap(), x);

        let stereo = array![[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(pad(&stereo, 2).unwrap(), stereo);
    }

    #[test]
    fn pad_appends_zeros_only_in_time() {
        let mut rng = rand::rng();
        for _ in 0..25 {
            let len = rng.random_range(0..50);
            let channels = rng.random_range(1..4);
            let extra = rng.random_range(0..20);
            let x = Array2::from_shape_fn((len, channels), |_| rng.random_range(-1.0..1.0));

            let padded = pad(&x, len + extra).unwrap();
            assert_eq!(padded.shape(), &[len + extra, channels]);
            assert_eq!(padded.slice(s![..len, ..]), x);
            assert!(padded.slice(s![len.., ..]).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn pad_does_not_touch_input() {
        let x = array![1, 2];
        let padded = pad(&x.view(), 4).unwrap();
        assert_eq!(padded, array![1, 2, 0, 0]);
        assert_eq!(x, array![1, 2]);
    }

    #[test]
    fn pad_refuses_to_truncate() {
        let x = array![1.0, 2.0, 3.0];
        let err = pad(&x, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidArg { ref arg, .. } if arg == "length"));
    }

    #[test]
    fn pad_needs_a_time_axis() {
        let scalar = arr0(1.0);
        assert!(matches!(
            pad(&scalar, 1).unwrap_err(),
            Error::InvalidArg { ref arg, .. } if arg == "signal"
        ));
    }

    #[test]
    fn pad_dynamic_dimensions() {
        let x = ArrayD::<f32>::ones(IxDyn(&[2, 3, 2]));
        let padded = pad(&x, 5).unwrap();
        assert_eq!(padded.shape(), &[5, 3, 2]);
        assert_eq!(padded.sum(), 12.0);
    }

    #[test]
    fn pad_kernel_matches_function() {
        let kernel = PadKernel::try_new(PadConfig { length: 6 }).expect("kernel");
        assert_eq!(kernel.length(), 6);
        let x = array![[1, 1], [2, 2]];
        assert_eq!(kernel.run(&x).unwrap(), pad(&x, 6).unwrap());
        assert!(kernel.run(&Array1::<i32>::zeros(7)).is_err());
    }

    #[test]
    fn sum_of_one_signal_is_itself() {
        let x = array![[0.5, -0.5], [0.25, -0.25], [0.0, 1.0]];
        assert_eq!(sum_signals(&[x.clone()]).unwrap(), x);
    }

    #[test]
    fn sum_of_equal_lengths_is_elementwise() {
        let a = array![1.0, 2.0, 3.0];
        let b = array![0.5, -2.0, 10.0];
        assert_eq!(sum_signals(&[a.clone(), b.clone()]).unwrap(), &a + &b);
    }

    #[test]
    fn sum_pads_shorter_signals() {
        let mut rng = rand::rng();
        let lens = [40usize, 3, 75, 0, 75, 12];
        let signals = lens
            .iter()
            .map(|&n| Array2::from_shape_fn((n, 2), |_| rng.random_range(-5i64..5)))
            .collect::<Vec<_>>();

        let total = sum_signals(&signals).unwrap();
        assert_eq!(total.shape(), &[75, 2]);

        let mut expected = Array2::<i64>::zeros((75, 2));
        for signal in &signals {
            expected += &pad(signal, 75).unwrap();
        }
        assert_eq!(total, expected);
    }

    #[test]
    fn sum_of_views() {
        let speech = array![1.0, 1.0, 1.0, 1.0];
        let noise = array![0.5, 0.5];
        let total = sum_signals(&[speech.view(), noise.view()]).unwrap();
        assert_eq!(total, array![1.5, 1.5, 1.0, 1.0]);
    }

    #[test]
    fn sum_of_nothing_is_an_error() {
        let signals: [Array1<f64>; 0] = [];
        assert_eq!(
            sum_signals(&signals).unwrap_err(),
            Error::EmptyInput {
                arg: "signals".into()
            }
        );
    }

    #[test]
    fn sum_rejects_channel_mismatch() {
        let stereo = Array2::<f64>::zeros((10, 2));
        let mono_column = Array2::<f64>::zeros((4, 1));
        assert_eq!(
            sum_signals(&[stereo, mono_column]).unwrap_err(),
            Error::ShapeMismatch {
                arg: "signals[1]".into(),
                expected: vec![4, 2],
                got: vec![4, 1],
            }
        );
    }

    #[test]
    fn sum_rejects_rank_mismatch() {
        let a = ArrayD::<f64>::zeros(IxDyn(&[8, 2]));
        let b = ArrayD::<f64>::zeros(IxDyn(&[8]));
        assert!(matches!(
            sum_signals(&[a, b]).unwrap_err(),
            Error::ShapeMismatch { .. }
        ));
    }
}
