//! Speech weighting filter coefficients.
//!
//! The bundled filter is a 513-tap linear-phase FIR designed to the long-term average speech
//! spectrum at 44.1 kHz. It stands in for the reference `speech_weight.mat` coefficients, which
//! are not distributed with the crate; SNR values only match the reference once those taps are
//! imported with `cargo xtask import-filter <speech_weight.mat>`, which rewrites the resource.
//!
//! The taps are stored as a named array in a JSON resource next to the crate sources
//! (`data/speech_weight.json`, key [`FILTER_KEY`]) and compiled into the library. The bundled
//! copy is parsed once, on first use, and shared read-only for the life of the process.
//!
//! Callers that ship their own coefficients load them with [`SpeechFilter::from_path`] and
//! pass the result to [`SpeechWeightedSnrKernel`](crate::signal::snr::SpeechWeightedSnrKernel)
//! explicitly.

use crate::signal::convolve::{convolve, ConvolveMethod, ConvolveMode};
use serde::Deserialize;
use speech_snr_core::{Error, Result};
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, LazyLock};

/// Name of the coefficient array inside a filter resource.
pub const FILTER_KEY: &str = "filt";

const BUNDLED_JSON: &str = include_str!("../../data/speech_weight.json");

static BUNDLED: LazyLock<SpeechFilter> =
    LazyLock::new(|| match SpeechFilter::from_json_str(BUNDLED_JSON) {
        Ok(filter) => {
            tracing::debug!(taps = filter.len(), "loaded bundled speech weighting filter");
            filter
        }
        // The crate cannot measure anything without its filter; there is no fallback.
        Err(e) => panic!("bundled speech weighting filter is unusable: {e}"),
    });

/// A coefficient array as it may appear in a resource: plain taps, or a matrix holding a
/// single row or column of taps.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TapArray {
    Flat(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl TapArray {
    /// Drop singleton dimensions, leaving 1D taps.
    fn squeeze(self) -> Result<Vec<f64>> {
        match self {
            TapArray::Flat(taps) => Ok(taps),
            TapArray::Matrix(mut rows) => {
                if rows.len() == 1 {
                    return Ok(rows.swap_remove(0));
                }
                if rows.iter().all(|row| row.len() == 1) {
                    return Ok(rows.into_iter().flatten().collect());
                }
                let cols = rows.first().map_or(0, Vec::len);
                Err(Error::FilterLoad {
                    reason: format!(
                        "`{FILTER_KEY}` must be a vector, got a {}x{cols} matrix",
                        rows.len()
                    ),
                })
            }
        }
    }
}

/// Immutable FIR filter taps. Cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechFilter {
    taps: Arc<[f64]>,
}

impl SpeechFilter {
    /// The filter bundled with the crate.
    ///
    /// Parsed on first call and shared by every later call, from any thread.
    ///
    /// # Panics
    /// If the bundled resource is malformed. This is a build defect, not a runtime condition.
    pub fn bundled() -> &'static SpeechFilter {
        &BUNDLED
    }

    /// Build a filter from raw taps.
    ///
    /// # Errors
    /// Empty taps or any non-finite tap.
    ///
    /// ```
    /// use speech_snr::signal::weighting::SpeechFilter;
    ///
    /// let filter = SpeechFilter::from_taps(vec![0.25, 0.5, 0.25]).unwrap();
    /// assert_eq!(filter.len(), 3);
    /// assert!(SpeechFilter::from_taps(vec![]).is_err());
    /// assert!(SpeechFilter::from_taps(vec![1.0, f64::NAN]).is_err());
    /// ```
    pub fn from_taps(taps: Vec<f64>) -> Result<Self> {
        if taps.is_empty() {
            return Err(reject(format!("`{FILTER_KEY}` holds no taps")));
        }
        if let Some(i) = taps.iter().position(|t| !t.is_finite()) {
            return Err(reject(format!(
                "`{FILTER_KEY}` tap {i} is not finite ({})",
                taps[i]
            )));
        }
        Ok(Self { taps: taps.into() })
    }

    /// Parse a JSON object and take the taps stored under [`FILTER_KEY`].
    ///
    /// Other keys in the object are ignored. The taps may be a flat array or a matrix with a
    /// single row or column.
    ///
    /// ```
    /// use speech_snr::signal::weighting::SpeechFilter;
    ///
    /// let flat = SpeechFilter::from_json_str(r#"{"filt": [0.5, 0.5]}"#).unwrap();
    /// let column = SpeechFilter::from_json_str(r#"{"filt": [[0.5], [0.5]]}"#).unwrap();
    /// assert_eq!(flat, column);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_str_with_key(json, FILTER_KEY)
    }

    /// [`SpeechFilter::from_json_str`] with an explicit array name.
    pub fn from_json_str_with_key(json: &str, key: &str) -> Result<Self> {
        let mut object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| reject(format!("not a JSON object of named arrays: {e}")))?;
        let value = object
            .remove(key)
            .ok_or_else(|| reject(format!("no array named `{key}`")))?;
        let taps = serde_json::from_value::<TapArray>(value)
            .map_err(|_| reject(format!("`{key}` is not a numeric vector or matrix")))?
            .squeeze()?;
        let filter = Self::from_taps(taps)?;
        tracing::debug!(key, taps = filter.len(), "parsed filter resource");
        Ok(filter)
    }

    /// Read a JSON filter resource from `reader`.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut json = String::new();
        reader
            .read_to_string(&mut json)
            .map_err(|e| reject(format!("failed to read filter resource: {e}")))?;
        Self::from_json_str(&json)
    }

    /// Read a JSON filter resource from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| reject(format!("cannot open {}: {e}", path.display())))?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Filter taps, in convolution order.
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Number of taps.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Always false; a filter holds at least one tap.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Full linear convolution of `signal` with the taps, `signal.len() + self.len() - 1`
    /// samples long (empty for an empty signal).
    pub fn apply(&self, signal: &[f64], method: ConvolveMethod) -> Result<Vec<f64>> {
        convolve(signal, &self.taps, ConvolveMode::Full, method)
    }
}

fn reject(reason: String) -> Error {
    tracing::warn!(%reason, "rejected filter resource");
    Error::FilterLoad { reason }
}
