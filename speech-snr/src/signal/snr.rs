//! Speech-weighted signal-to-noise ratio.
//!
//! Both signals are passed through the speech weighting filter (full linear convolution) and
//! the ratio of their RMS values is reported. Weighting first means energy the listener would
//! barely hear, such as rumble or very high frequencies, counts for less.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use crate::signal::convolve::ConvolveMethod;
use crate::signal::traits::SignalRatio1D;
use crate::signal::weighting::SpeechFilter;
use crate::stats::rms;
use speech_snr_core::{Error, Result};

/// Constructor config for [`SpeechWeightedSnrKernel`].
#[derive(Debug, Clone)]
pub struct SpeechWeightedSnrConfig {
    /// Weighting filter applied to both signals.
    pub filter: SpeechFilter,
    /// How the weighting convolution is evaluated.
    pub method: ConvolveMethod,
}

impl Default for SpeechWeightedSnrConfig {
    /// The bundled filter, evaluated through the FFT.
    fn default() -> Self {
        Self {
            filter: SpeechFilter::bundled().clone(),
            method: ConvolveMethod::Fft,
        }
    }
}

/// Speech-weighted SNR estimator with an explicitly supplied filter.
#[derive(Debug, Clone)]
pub struct SpeechWeightedSnrKernel {
    filter: SpeechFilter,
    method: ConvolveMethod,
}

impl KernelLifecycle for SpeechWeightedSnrKernel {
    type Config = SpeechWeightedSnrConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        Ok(Self {
            filter: config.filter,
            method: config.method,
        })
    }
}

impl SpeechWeightedSnrKernel {
    /// Filter this kernel weights with.
    pub fn filter(&self) -> &SpeechFilter {
        &self.filter
    }

    /// Speech-weighted RMS ratio of `target` over `noise`.
    ///
    /// Returns `f64::INFINITY` when the weighted noise has zero RMS, whatever the target.
    /// An empty signal has undefined RMS, so either input being empty gives NaN. NaN or
    /// infinite samples propagate the same way.
    pub fn ratio(&self, target: &[f64], noise: &[f64]) -> Result<f64> {
        let target_rms = rms::<_, f64>(self.filter.apply(target, self.method)?.iter());
        let noise_rms = rms::<_, f64>(self.filter.apply(noise, self.method)?.iter());

        if noise_rms == 0.0 {
            return Ok(f64::INFINITY);
        }
        Ok(target_rms / noise_rms)
    }

    /// The gain to multiply `noise` by so that the mix has a speech-weighted SNR of `snr_db`.
    ///
    /// # Errors
    /// When the weighted ratio is zero, infinite or NaN no gain can reach the requested level.
    pub fn noise_gain_for_snr_db(
        &self,
        target: &[f64],
        noise: &[f64],
        snr_db: f64,
    ) -> Result<f64> {
        let ratio = self.ratio(target, noise)?;
        if !ratio.is_finite() || ratio == 0.0 {
            return Err(Error::InvalidArg {
                arg: "noise".into(),
                reason: format!(
                    "speech-weighted SNR is {ratio}; no noise gain reaches {snr_db} dB"
                ),
            });
        }
        Ok(ratio / 10f64.powf(snr_db / 20.0))
    }
}

impl SignalRatio1D<f64> for SpeechWeightedSnrKernel {
    fn run<I1, I2>(
        &self,
        target: &I1,
        noise: &I2,
    ) -> core::result::Result<f64, ExecInvariantViolation>
    where
        I1: Read1D<f64> + ?Sized,
        I2: Read1D<f64> + ?Sized,
    {
        let target = target.read_slice().map_err(ExecInvariantViolation::from)?;
        let noise = noise.read_slice().map_err(ExecInvariantViolation::from)?;
        Ok(self.ratio(target, noise)?)
    }
}

///
/// Speech-weighted SNR of `target` against `noise` using the bundled filter.
///
/// Both signals are convolved (full mode, via the FFT) with the speech weighting filter and the
/// ratio of their RMS values is returned as a plain amplitude ratio. A silent noise signal gives
/// `f64::INFINITY`; an empty signal gives NaN.
///
/// ```
/// use approx::assert_relative_eq;
/// use speech_snr::signal::snr::speechweighted_snr;
///
/// let speech: Vec<f64> = (0..4410).map(|i| (i as f64 * 0.07).sin()).collect();
/// let noise: Vec<f64> = speech.iter().map(|x| 0.5 * x).collect();
/// assert_relative_eq!(speechweighted_snr(&speech, &noise).unwrap(), 2.0, max_relative = 1e-9);
///
/// let silence = vec![0.0; 4410];
/// assert_eq!(speechweighted_snr(&speech, &silence).unwrap(), f64::INFINITY);
/// ```
pub fn speechweighted_snr(target: &[f64], noise: &[f64]) -> Result<f64> {
    speechweighted_snr_with(SpeechFilter::bundled(), target, noise)
}

/// [`speechweighted_snr`] with a caller supplied filter.
pub fn speechweighted_snr_with(
    filter: &SpeechFilter,
    target: &[f64],
    noise: &[f64],
) -> Result<f64> {
    SpeechWeightedSnrKernel {
        filter: filter.clone(),
        method: ConvolveMethod::Fft,
    }
    .ratio(target, noise)
}

/// Gain for `noise` that mixes it with `target` at a speech-weighted SNR of `snr_db`,
/// weighting with `filter`. See [`SpeechWeightedSnrKernel::noise_gain_for_snr_db`].
///
/// ```
/// use approx::assert_relative_eq;
/// use speech_snr::signal::snr::noise_gain_for_snr_db;
/// use speech_snr::signal::weighting::SpeechFilter;
///
/// let identity = SpeechFilter::from_taps(vec![1.0]).unwrap();
/// let gain = noise_gain_for_snr_db(&identity, &[2.0, -2.0], &[1.0, -1.0], 0.0).unwrap();
/// assert_relative_eq!(gain, 2.0, max_relative = 1e-12);
/// ```
pub fn noise_gain_for_snr_db(
    filter: &SpeechFilter,
    target: &[f64],
    noise: &[f64],
    snr_db: f64,
) -> Result<f64> {
    SpeechWeightedSnrKernel {
        filter: filter.clone(),
        method: ConvolveMethod::Fft,
    }
    .noise_gain_for_snr_db(target, noise, snr_db)
}

/// Speech-weighted SNR in decibels, `20 * log10(speechweighted_snr(target, noise))`.
pub fn speechweighted_snr_db(target: &[f64], noise: &[f64]) -> Result<f64> {
    speechweighted_snr(target, noise).map(snr_to_db)
}

/// Convert an amplitude ratio to decibels.
///
/// ```
/// use speech_snr::signal::snr::snr_to_db;
///
/// assert_eq!(snr_to_db(10.0), 20.0);
/// assert_eq!(snr_to_db(f64::INFINITY), f64::INFINITY);
/// ```
pub fn snr_to_db(ratio: f64) -> f64 {
    20.0 * ratio.log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array1;
    use rand::Rng;
    use std::f64::consts::PI;

    const FS: f64 = 44_100.0;

    fn noise(len: usize) -> Vec<f64> {
        let mut rng = rand::rng();
        (0..len).map(|_| rng.random_range(-1.0..1.0)).collect()
    }

    fn tone(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / FS).sin())
            .collect()
    }

    #[test]
    fn silent_noise_is_infinite() {
        let x = noise(2048);
        let silence = vec![0.0; x.len()];
        assert_eq!(speechweighted_snr(&x, &silence).unwrap(), f64::INFINITY);
        assert_eq!(speechweighted_snr(&silence, &silence).unwrap(), f64::INFINITY);
    }

    #[test]
    fn same_signal_is_unity() {
        let x = noise(3000);
        let snr = speechweighted_snr(&x, &x).unwrap();
        assert!(snr.is_finite());
        assert_relative_eq!(snr, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn scaled_noise_gives_reciprocal() {
        let x = noise(5000);
        for k in [0.01, 0.5, 3.0, 250.0] {
            let scaled = x.iter().map(|v| k * v).collect::<Vec<_>>();
            assert_relative_eq!(
                speechweighted_snr(&x, &scaled).unwrap(),
                1.0 / k,
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn swapping_inputs_inverts_ratio() {
        let a = noise(4000);
        let b = tone(3000.0, 2500);
        let ab = speechweighted_snr(&a, &b).unwrap();
        let ba = speechweighted_snr(&b, &a).unwrap();
        assert!(ab != ba);
        assert_relative_eq!(ab * ba, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn weighting_favours_speech_band() {
        // Equal-amplitude tones: unweighted SNR would be 1.
        let speech = tone(500.0, 8192);
        let hiss = tone(20_000.0, 8192);
        let snr = speechweighted_snr(&speech, &hiss).unwrap();
        assert!(snr > 5.0, "snr = {snr}");
    }

    #[test]
    fn empty_signals_give_nan() {
        let x = noise(100);
        assert!(speechweighted_snr(&[], &x).unwrap().is_nan());
        assert!(speechweighted_snr(&x, &[]).unwrap().is_nan());
        assert!(speechweighted_snr(&[], &[]).unwrap().is_nan());
    }

    #[test]
    fn nan_samples_propagate() {
        let mut x = noise(256);
        x[10] = f64::NAN;
        let y = noise(256);
        assert!(speechweighted_snr(&x, &y).unwrap().is_nan());
    }

    #[test]
    fn identity_filter_reduces_to_rms_ratio() {
        let identity = SpeechFilter::from_taps(vec![1.0]).unwrap();
        let target = [3.0, -3.0, 3.0, -3.0];
        let noise = [1.0, -1.0];
        let snr = speechweighted_snr_with(&identity, &target, &noise).unwrap();
        assert_relative_eq!(snr, 3.0, max_relative = 1e-12);
    }

    #[test]
    fn direct_and_fft_kernels_agree() {
        let target = noise(1500);
        let interferer = noise(900);
        let ratio = |method| {
            SpeechWeightedSnrKernel::try_new(SpeechWeightedSnrConfig {
                method,
                ..Default::default()
            })
            .expect("kernel")
            .ratio(&target, &interferer)
            .unwrap()
        };
        assert_relative_eq!(
            ratio(ConvolveMethod::Direct),
            ratio(ConvolveMethod::Fft),
            max_relative = 1e-9
        );
        assert_relative_eq!(
            ratio(ConvolveMethod::Auto),
            ratio(ConvolveMethod::Fft),
            max_relative = 1e-9
        );
    }

    #[test]
    fn asymmetric_filter_is_convolved_by_every_method() {
        let taps = vec![1.0, 0.0, -2.0, 0.5, 3.0];
        let filter = SpeechFilter::from_taps(taps.clone()).unwrap();
        let target = noise(600);
        let interferer = noise(400);

        let mut expected = vec![0.0; target.len() + taps.len() - 1];
        for (i, x) in target.iter().enumerate() {
            for (j, h) in taps.iter().enumerate() {
                expected[i + j] += x * h;
            }
        }

        let mut ratios = Vec::new();
        for method in [ConvolveMethod::Direct, ConvolveMethod::Auto, ConvolveMethod::Fft] {
            let kernel = SpeechWeightedSnrKernel::try_new(SpeechWeightedSnrConfig {
                filter: filter.clone(),
                method,
            })
            .expect("kernel");

            let weighted = kernel.filter().apply(&target, method).unwrap();
            assert_eq!(weighted.len(), expected.len());
            for (y, e) in weighted.iter().zip(&expected) {
                assert_relative_eq!(*y, *e, epsilon = 1e-10);
            }
            ratios.push(kernel.ratio(&target, &interferer).unwrap());
        }
        assert_relative_eq!(ratios[0], ratios[2], max_relative = 1e-9);
        assert_relative_eq!(ratios[1], ratios[2], max_relative = 1e-9);
    }

    #[test]
    fn kernel_accepts_ndarray_input() {
        let kernel = SpeechWeightedSnrKernel::try_new(SpeechWeightedSnrConfig::default())
            .expect("kernel");
        assert_eq!(kernel.filter(), SpeechFilter::bundled());

        let target = Array1::from(noise(1024));
        let quiet = &target * 0.1;
        let snr = kernel.run(&target, &quiet).expect("ratio");
        assert_relative_eq!(snr, 10.0, max_relative = 1e-9);
    }

    #[test]
    fn decibels() {
        let x = noise(2000);
        let half = x.iter().map(|v| v * 0.5).collect::<Vec<_>>();
        assert_relative_eq!(
            speechweighted_snr_db(&x, &half).unwrap(),
            20.0 * 2f64.log10(),
            max_relative = 1e-9
        );
        assert_eq!(snr_to_db(1.0), 0.0);
    }

    #[test]
    fn noise_gain_reaches_requested_snr() {
        let kernel = SpeechWeightedSnrKernel::try_new(SpeechWeightedSnrConfig::default())
            .expect("kernel");
        let speech = tone(440.0, 6000);
        let babble = noise(6000);
        for snr_db in [-5.0, 0.0, 12.0] {
            let gain = kernel
                .noise_gain_for_snr_db(&speech, &babble, snr_db)
                .expect("gain");
            let scaled = babble.iter().map(|v| gain * v).collect::<Vec<_>>();
            assert_relative_eq!(
                snr_to_db(kernel.ratio(&speech, &scaled).unwrap()),
                snr_db,
                epsilon = 1e-9
            );
        }

        let silence = vec![0.0; 6000];
        assert!(kernel
            .noise_gain_for_snr_db(&speech, &silence, 0.0)
            .is_err());
        assert!(kernel
            .noise_gain_for_snr_db(&silence, &babble, 0.0)
            .is_err());
    }

    #[test]
    fn free_noise_gain_uses_the_given_filter() {
        let filter = SpeechFilter::from_taps(vec![0.5, 0.25, -0.125]).unwrap();
        let speech = tone(300.0, 2000);
        let babble = noise(2000);
        let gain = noise_gain_for_snr_db(&filter, &speech, &babble, 6.0).unwrap();
        let scaled = babble.iter().map(|v| gain * v).collect::<Vec<_>>();
        assert_relative_eq!(
            snr_to_db(speechweighted_snr_with(&filter, &speech, &scaled).unwrap()),
            6.0,
            epsilon = 1e-9
        );
        assert!(noise_gain_for_snr_db(&filter, &speech, &[0.0; 2000], 6.0).is_err());
    }
}
