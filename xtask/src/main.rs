use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use serde_json::json;
use speech_snr::signal::convolve::{convolve, ConvolveMethod, ConvolveMode};
use speech_snr::signal::padding::{pad, sum_signals};
use speech_snr::signal::snr::speechweighted_snr_with;
use speech_snr::signal::weighting::{SpeechFilter, FILTER_KEY};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

const DEFAULT_PYTHON_BIN: &str = "python";
const PYTHON_BIN_ENV: &str = "XTASK_PYTHON";
const BUNDLED_FILTER_PATH: &str = "speech-snr/data/speech_weight.json";

/// Relative tolerance for the SNR cases, absolute tolerance for sample-wise cases.
const SNR_TOLERANCE: f64 = 1e-9;
const SAMPLE_TOLERANCE: f64 = 1e-9;

const PY_REFERENCE_SCRIPT: &str = r#"
import json
import sys
import time
import numpy as np
import scipy
import scipy.signal

env = json.loads(sys.stdin.read())
op = env["op"]
iters = int(env["iters"])
p = env["payload"]

def _as_array(key):
    return np.asarray(p[key], dtype=float)

def _pad(signal, length):
    assert length >= signal.shape[0]
    return np.pad(
        signal, [(0, length - signal.shape[0])] + [(0, 0)] * (len(signal.shape) - 1)
    )

def _snr(target, noise, taps):
    target_filt = scipy.signal.convolve(target, taps, mode="full", method="fft")
    noise_filt = scipy.signal.convolve(noise, taps, mode="full", method="fft")
    targ_rms = np.sqrt(np.mean(target_filt ** 2))
    noise_rms = np.sqrt(np.mean(noise_filt ** 2))
    if noise_rms == 0:
        return np.inf
    return targ_rms / noise_rms

def _compute():
    if op == "speechweighted_snr":
        taps = _as_array("taps")
        return np.array([
            _snr(np.asarray(t, dtype=float), np.asarray(n, dtype=float), taps)
            for t, n in zip(p["targets"], p["noises"])
        ])
    if op == "convolve":
        return scipy.signal.convolve(
            _as_array("in1"), _as_array("in2"), mode=p["mode"], method=p["method"]
        )
    if op == "pad":
        return _pad(np.asarray(p["signal"], dtype=float), int(p["length"]))
    if op == "sum_signals":
        signals = [np.asarray(s, dtype=float) for s in p["signals"]]
        max_length = max(x.shape[0] for x in signals)
        return sum(_pad(x, max_length) for x in signals)

    raise RuntimeError(f"unsupported op: {op}")

y = np.asarray(_compute(), dtype=float).reshape(-1)

t0 = time.perf_counter_ns()
for _ in range(iters):
    _compute()
t1 = time.perf_counter_ns()

print(json.dumps({
    "output": [None if not np.isfinite(v) else float(v) for v in y],
    "avg_ns": (t1 - t0) / max(iters, 1),
    "python_version": sys.version.split()[0],
    "numpy_version": np.__version__,
    "scipy_version": scipy.__version__
}))
"#;

const PY_IMPORT_FILTER_SCRIPT: &str = r#"
import json
import sys
import numpy as np
import scipy.io

env = json.loads(sys.stdin.read())
mat = scipy.io.loadmat(env["path"], squeeze_me=True)
filt = np.atleast_1d(np.asarray(mat[env["key"]], dtype=float))
print(json.dumps({env["key"]: filt.tolist()}))
"#;

#[derive(Debug, Serialize, Deserialize, Clone)]
struct PythonEval {
    /// Non-finite values come back as `null`.
    output: Vec<Option<f64>>,
    avg_ns: f64,
    python_version: String,
    numpy_version: String,
    scipy_version: String,
}

#[derive(Debug, Serialize, Clone)]
struct ParityRow {
    case_id: String,
    samples: usize,
    max_abs: f64,
    max_rel: f64,
    passed: bool,
    rust_ns: f64,
    python_ns: f64,
    speedup_vs_python: f64,
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("parity") => run_parity(),
        Some("import-filter") => {
            let mat = args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("import-filter needs the path of a .mat file"))?;
            let out = args
                .next()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(BUNDLED_FILTER_PATH));
            run_import_filter(&mat, &out)
        }
        _ => {
            eprintln!("Usage:");
            eprintln!("  cargo run -p xtask -- parity");
            eprintln!("  cargo run -p xtask -- import-filter <speech_weight.mat> [out.json]");
            Ok(())
        }
    }
}

fn run_parity() -> Result<()> {
    let python_bin = detect_python_bin();
    let filter = SpeechFilter::bundled();
    let taps = filter.taps().to_vec();
    let mut rows = Vec::new();
    let mut versions = None;

    // Speech-like target (harmonic stack with a slow envelope) and broadband noise.
    let speech = |n: usize| -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / 44_100.0;
                let envelope = 0.6 + 0.4 * (2.0 * std::f64::consts::PI * 3.0 * t).sin();
                envelope
                    * (1..6)
                        .map(|h| {
                            let h = h as f64;
                            (2.0 * std::f64::consts::PI * 140.0 * h * t).sin() / h
                        })
                        .sum::<f64>()
            })
            .collect()
    };
    let hiss = |n: usize, seed: u64| -> Vec<f64> {
        // Deterministic LCG so both sides see identical input.
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                (state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
            })
            .collect()
    };

    // Speech-weighted SNR
    {
        let case_id = "speechweighted_snr";
        let targets = vec![speech(44_100), speech(4_410), hiss(1_000, 3), speech(22_050)];
        let noises = vec![hiss(44_100, 1), hiss(9_000, 2), vec![0.0; 1_000], hiss(300, 4)];

        let snr_all = || -> Result<Vec<f64>> {
            targets
                .iter()
                .zip(noises.iter())
                .map(|(t, n)| speechweighted_snr_with(filter, t, n).map_err(|e| anyhow!("{e}")))
                .collect()
        };
        let candidate = snr_all()?;
        let py = python_reference(
            &python_bin,
            "speechweighted_snr",
            json!({ "taps": taps, "targets": targets, "noises": noises }),
            10,
        )?;
        let rust_ns = benchmark_avg_ns(10, || snr_all().map(|_| ()))?;
        rows.push(compare(case_id, &candidate, &py, rust_ns, SNR_TOLERANCE, true)?);
        versions.get_or_insert(py);
    }

    // Weighting convolution, both methods
    for method in [ConvolveMethod::Fft, ConvolveMethod::Direct] {
        let case_id = format!("convolve_full_{method:?}").to_lowercase();
        let in1 = speech(8_192);
        let run = || {
            convolve(&in1, &taps, ConvolveMode::Full, method).map_err(|e| anyhow!("{e}"))
        };
        let candidate = run()?;
        let py_method = match method {
            ConvolveMethod::Direct => "direct",
            _ => "fft",
        };
        let py = python_reference(
            &python_bin,
            "convolve",
            json!({ "in1": in1, "in2": taps, "mode": "full", "method": py_method }),
            20,
        )?;
        let rust_ns = benchmark_avg_ns(20, || run().map(|_| ()))?;
        rows.push(compare(&case_id, &candidate, &py, rust_ns, SAMPLE_TOLERANCE, false)?);
    }

    // Padding a stereo signal
    {
        let case_id = "pad_stereo";
        let signal = Array2::from_shape_vec((1_000, 2), hiss(2_000, 5))?;
        let run = || pad(&signal, 1_500).map_err(|e| anyhow!("{e}"));
        let candidate = run()?;
        let py = python_reference(
            &python_bin,
            "pad",
            json!({ "signal": rows_of(&signal), "length": 1_500 }),
            50,
        )?;
        let rust_ns = benchmark_avg_ns(50, || run().map(|_| ()))?;
        let flat = candidate.iter().copied().collect::<Vec<_>>();
        rows.push(compare(case_id, &flat, &py, rust_ns, SAMPLE_TOLERANCE, false)?);
    }

    // Summing mono signals of unequal length
    {
        let case_id = "sum_signals_mono";
        let signals = vec![
            Array1::from(speech(3_000)),
            Array1::from(hiss(1_200, 6)),
            Array1::from(hiss(4_410, 7)),
        ];
        let run = || sum_signals(&signals[..]).map_err(|e| anyhow!("{e}"));
        let candidate = run()?;
        let py = python_reference(
            &python_bin,
            "sum_signals",
            json!({ "signals": signals.iter().map(|s| s.to_vec()).collect::<Vec<_>>() }),
            50,
        )?;
        let rust_ns = benchmark_avg_ns(50, || run().map(|_| ()))?;
        rows.push(compare(case_id, &candidate.to_vec(), &py, rust_ns, SAMPLE_TOLERANCE, false)?);
    }

    if let Some(py) = versions {
        println!(
            "python {} / numpy {} / scipy {} ({})",
            py.python_version,
            py.numpy_version,
            py.scipy_version,
            python_bin.display()
        );
    }
    println!(
        "{:<24} {:>8} {:>12} {:>12} {:>8} {:>10}",
        "case", "samples", "max_abs", "max_rel", "passed", "speedup"
    );
    for row in &rows {
        println!(
            "{:<24} {:>8} {:>12.3e} {:>12.3e} {:>8} {:>10.2}",
            row.case_id, row.samples, row.max_abs, row.max_rel, row.passed, row.speedup_vs_python
        );
    }

    let out_dir = PathBuf::from("target/parity");
    fs::create_dir_all(&out_dir).context("creating parity output directory")?;
    let summary = out_dir.join("summary.json");
    fs::write(&summary, serde_json::to_vec_pretty(&rows)?)
        .with_context(|| format!("writing {}", summary.display()))?;
    println!("summary: {}", summary.display());

    let failed = rows.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        bail!("{failed} parity case(s) exceeded tolerance");
    }
    Ok(())
}

fn run_import_filter(mat: &Path, out: &Path) -> Result<()> {
    let python_bin = detect_python_bin();
    let stdout = run_python(
        &python_bin,
        PY_IMPORT_FILTER_SCRIPT,
        json!({ "path": mat, "key": FILTER_KEY }),
    )?;
    let filter = SpeechFilter::from_json_str(stdout.trim())
        .map_err(|e| anyhow!("{} does not hold a usable filter: {e}", mat.display()))?;

    let mut resource = serde_json::Map::new();
    resource.insert(FILTER_KEY.to_string(), json!(filter.taps()));
    fs::write(out, serde_json::to_string(&resource)?)
        .with_context(|| format!("writing {}", out.display()))?;
    println!(
        "wrote {} taps from {} to {}",
        filter.len(),
        mat.display(),
        out.display()
    );
    Ok(())
}

fn detect_python_bin() -> PathBuf {
    std::env::var_os(PYTHON_BIN_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PYTHON_BIN))
}

fn python_reference(
    python_bin: &Path,
    op: &str,
    payload: serde_json::Value,
    iters: usize,
) -> Result<PythonEval> {
    let stdout = run_python(
        python_bin,
        PY_REFERENCE_SCRIPT,
        json!({
            "op": op,
            "iters": iters,
            "payload": payload
        }),
    )?;
    serde_json::from_str(stdout.trim()).context("parsing python json")
}

fn run_python(python_bin: &Path, script: &str, payload: serde_json::Value) -> Result<String> {
    let mut child = Command::new(python_bin)
        .arg("-c")
        .arg(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning python interpreter at {}", python_bin.display()))?;

    {
        let stdin = child.stdin.as_mut().context("opening python stdin")?;
        let payload_bytes = serde_json::to_vec(&payload).context("serializing python payload")?;
        stdin
            .write_all(&payload_bytes)
            .context("writing payload to python stdin")?;
    }

    let output = child
        .wait_with_output()
        .context("waiting for python process")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("python execution failed: {stderr}");
    }
    String::from_utf8(output.stdout).context("parsing python stdout utf8")
}

fn rows_of(signal: &Array2<f64>) -> Vec<Vec<f64>> {
    signal.outer_iter().map(|row| row.to_vec()).collect()
}

/// Compare element-wise. Non-finite values must match exactly (python sends them as `null`).
fn compare(
    case_id: &str,
    candidate: &[f64],
    py: &PythonEval,
    rust_ns: f64,
    tolerance: f64,
    relative: bool,
) -> Result<ParityRow> {
    if candidate.len() != py.output.len() {
        bail!(
            "case {case_id} has mismatched output lengths: rust={}, python={}",
            candidate.len(),
            py.output.len()
        );
    }

    let mut max_abs: f64 = 0.0;
    let mut max_rel: f64 = 0.0;
    let mut passed = true;
    for (c, p) in candidate.iter().zip(py.output.iter()) {
        match p {
            Some(p) if c.is_finite() => {
                let abs = (c - p).abs();
                let rel = if *p == 0.0 { abs } else { abs / p.abs() };
                max_abs = max_abs.max(abs);
                max_rel = max_rel.max(rel);
                passed &= if relative { rel <= tolerance } else { abs <= tolerance };
            }
            Some(_) => passed = false,
            None => passed &= !c.is_finite(),
        }
    }

    Ok(ParityRow {
        case_id: case_id.to_string(),
        samples: candidate.len(),
        max_abs,
        max_rel,
        passed,
        rust_ns,
        python_ns: py.avg_ns,
        speedup_vs_python: py.avg_ns / rust_ns,
    })
}

fn benchmark_avg_ns<F>(iters: usize, mut f: F) -> Result<f64>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    Ok(start.elapsed().as_nanos() as f64 / iters as f64)
}
