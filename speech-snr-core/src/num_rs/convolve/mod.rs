mod fft;

pub use fft::fftconvolve;

use crate::{Error, Result};
use core::ops::Range;
use ndarray::{s, Array1, ArrayView1, Axis, Slice};
use ndarray_conv::{ConvExt, ConvMode, PaddingMode};

/// Convolution mode determines behavior near edges and output size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvolveMode {
    /// Full convolution, output size is `in1.len() + in2.len() - 1`
    #[default]
    Full,
    /// Valid convolution, output size is `max(in1.len(), in2.len()) - min(in1.len(), in2.len()) + 1`
    Valid,
    /// Same convolution, output size is `in1.len()`, centred on the full output
    Same,
}

impl ConvolveMode {
    /// Number of output samples produced for inputs of length `n` and `m`.
    ///
    /// Empty inputs always produce an empty output.
    pub fn output_len(self, n: usize, m: usize) -> usize {
        self.output_range(n, m).len()
    }

    /// Window of the full convolution kept by this mode.
    pub(crate) fn output_range(self, n: usize, m: usize) -> Range<usize> {
        if n == 0 || m == 0 {
            return 0..0;
        }
        let full = n + m - 1;
        let len = match self {
            ConvolveMode::Full => full,
            ConvolveMode::Same => n,
            ConvolveMode::Valid => n.max(m) - n.min(m) + 1,
        };
        let start = (full - len) / 2;
        start..start + len
    }
}

/// Time-domain linear convolution of two one-dimensional sequences.
///
/// `v` does not need to be shorter than `a`; the longer sequence is run as the signal since
/// convolution commutes. Output sizes follow [ConvolveMode].
///
/// # Parameters
/// * `a` : (N,) [[array_like]]([ndarray::Array1])  
///   First one-dimensional input.
/// * `v` : (M,) [[array_like]]([ndarray::Array1])  
///   Second one-dimensional input.
/// * `mode` : [ConvolveMode]  
///   [ConvolveMode::Full] returns every point of overlap, (N+M-1,).  
///   [ConvolveMode::Same] returns (N,) samples centred on the full result.  
///   [ConvolveMode::Valid] returns only points where the inputs overlap completely.
///
/// Either input being empty yields an empty output.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use speech_snr_core::num_rs::{ConvolveMode, convolve};
///
/// let a = array![1., 2., 3.];
/// let v = array![0., 1., 0.5];
///
/// let full = convolve(a.view(), v.view(), ConvolveMode::Full).unwrap();
/// assert_eq!(full, array![0., 1., 2.5, 4., 1.5]);
///
/// let same = convolve(a.view(), v.view(), ConvolveMode::Same).unwrap();
/// assert_eq!(same, array![1., 2.5, 4.]);
///
/// let valid = convolve(a.view(), v.view(), ConvolveMode::Valid).unwrap();
/// assert_eq!(valid, array![2.5]);
/// ```
pub fn convolve<'a, T>(
    a: ArrayView1<'a, T>,
    v: ArrayView1<'a, T>,
    mode: ConvolveMode,
) -> Result<Array1<T>>
where
    T: num_traits::NumAssign + core::marker::Copy,
{
    let range = mode.output_range(a.len(), v.len());
    if range.is_empty() {
        return Ok(Array1::from_vec(Vec::new()));
    }

    let (signal, kernel) = if a.len() >= v.len() { (a, v) } else { (v, a) };
    // ndarray-conv slides the kernel without flipping it, i.e. it correlates.
    let flipped = kernel.slice(s![..;-1]).to_owned();
    let full = signal
        .conv(&flipped, ConvMode::Full, PaddingMode::Zeros)
        .map_err(|e| Error::Conv {
            reason: e.to_string(),
        })?;

    Ok(full.slice_axis(Axis(0), Slice::from(range)).to_owned())
}
