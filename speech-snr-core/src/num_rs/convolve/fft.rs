use super::ConvolveMode;
use crate::{Error, Result};
use num_traits::Float;
use rustfft::num_complex::Complex;
use rustfft::{FftNum, FftPlanner};

/// Linear convolution through the frequency domain.
///
/// Both inputs are zero padded to the next power of two at or above `a.len() + v.len() - 1`,
/// transformed, multiplied bin by bin and transformed back. The result matches
/// [convolve](super::convolve) to within floating-point rounding, and the output window is
/// chosen by `mode` the same way.
///
/// Either input being empty yields an empty output.
///
/// ```
/// use approx::assert_abs_diff_eq;
/// use speech_snr_core::num_rs::{ConvolveMode, fftconvolve};
///
/// let y = fftconvolve(&[1., 2., 3.], &[0., 1., 0.5], ConvolveMode::Full).unwrap();
/// let expected = [0., 1., 2.5, 4., 1.5];
/// assert_eq!(y.len(), expected.len());
/// for (y, e) in y.iter().zip(expected) {
///     assert_abs_diff_eq!(*y, e, epsilon = 1e-12);
/// }
/// ```
pub fn fftconvolve<F>(a: &[F], v: &[F], mode: ConvolveMode) -> Result<Vec<F>>
where
    F: Float + FftNum,
{
    let range = mode.output_range(a.len(), v.len());
    if range.is_empty() {
        return Ok(Vec::new());
    }

    let fft_len = (a.len() + v.len() - 1).next_power_of_two();
    let scale = F::from(fft_len)
        .map(F::recip)
        .ok_or_else(|| Error::InvalidArg {
            arg: "fft_len".into(),
            reason: "transform length is not representable in the sample type".into(),
        })?;

    let mut planner = FftPlanner::<F>::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);
    let scratch_len = fft
        .get_inplace_scratch_len()
        .max(ifft.get_inplace_scratch_len());
    let mut scratch = vec![Complex::new(F::zero(), F::zero()); scratch_len];

    let mut lhs = zero_padded(a, fft_len);
    let mut rhs = zero_padded(v, fft_len);
    fft.process_with_scratch(&mut lhs, &mut scratch);
    fft.process_with_scratch(&mut rhs, &mut scratch);

    for (l, r) in lhs.iter_mut().zip(rhs.iter()) {
        *l = *l * *r;
    }
    ifft.process_with_scratch(&mut lhs, &mut scratch);

    // rustfft leaves the inverse unnormalised
    Ok(lhs[range].iter().map(|c| c.re * scale).collect())
}

fn zero_padded<F: Float>(x: &[F], len: usize) -> Vec<Complex<F>> {
    let mut buf = Vec::with_capacity(len);
    buf.extend(x.iter().map(|&xi| Complex::new(xi, F::zero())));
    buf.resize(len, Complex::new(F::zero(), F::zero()));
    buf
}
