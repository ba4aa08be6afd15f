//! BenchRecord schema v1 - canonical schema for all benchmark outputs.

use serde::{Deserialize, Serialize};

use super::env::EnvironmentInfo;

/// Schema version for forward compatibility
pub const SCHEMA_VERSION: u32 = 1;

/// Timing statistics for a benchmark phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingStat {
    pub iterations: u32,
    pub mean_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev_ms: Option<f64>,
    pub min_ms: f64,
    pub max_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95_ms: Option<f64>,
}

impl TimingStat {
    /// Create TimingStat from a slice of sample times in milliseconds
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return TimingStat {
                iterations: 0,
                mean_ms: 0.0,
                median_ms: None,
                stddev_ms: None,
                min_ms: 0.0,
                max_ms: 0.0,
                p95_ms: None,
            };
        }

        let iterations = n as u32;
        let sum: f64 = samples.iter().sum();
        let mean_ms = sum / n as f64;

        let min_ms = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_ms = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let variance: f64 = samples.iter().map(|x| (x - mean_ms).powi(2)).sum::<f64>() / n as f64;
        let stddev_ms = Some(variance.sqrt());

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median_ms = if n % 2 == 0 {
            Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
        } else {
            Some(sorted[n / 2])
        };

        // p95: index = ceil(0.95 * n) - 1, clamped
        let p95_idx = ((0.95 * n as f64).ceil() as usize)
            .saturating_sub(1)
            .min(n - 1);
        let p95_ms = Some(sorted[p95_idx]);

        TimingStat {
            iterations,
            mean_ms,
            median_ms,
            stddev_ms,
            min_ms,
            max_ms,
            p95_ms,
        }
    }
}

/// Engine information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Run configuration for benchmarks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub warmup_iterations: u32,
    pub measured_iterations: u32,
    pub samples: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            warmup_iterations: 0,
            measured_iterations: 1,
            samples: 4,
            seed: None,
        }
    }
}

/// Canonical benchmark record - the unified output schema for all benchmarks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchRecord {
    /// Schema version for forward compatibility
    pub schema_version: u32,

    /// Unique identifier for this record
    pub record_id: String,

    /// ISO 8601 timestamp
    pub timestamp: String,

    /// Target function name (short identifier)
    pub function_name: String,

    /// Source-like rendering of the function, e.g. `x - 24`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_source: Option<String>,

    /// Environment information (CPU, OS, git, etc.)
    pub env: EnvironmentInfo,

    /// Engine used for compilation and evaluation
    pub engine: EngineInfo,

    /// Run configuration
    pub config: RunConfig,

    // --- Timing statistics ---
    /// Compilation timing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_stats: Option<TimingStat>,

    /// Per-sample evaluation timing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_stats: Option<TimingStat>,

    // --- Accuracy ---
    /// Exact-match accuracy over the sampled inputs, in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_percent: Option<f64>,

    /// Number of sampled inputs evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_total: Option<u32>,

    /// Number of samples whose result matched the reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_correct: Option<u32>,

    // --- Circuit metrics ---
    /// Node count of the compiled operation graph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_node_count: Option<u32>,

    /// Widest encrypted node in the graph, in bits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bit_width: Option<u32>,

    /// Number of calibration inputset samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputset_size: Option<u32>,

    /// SHA-256 fingerprint of the function definition and inputset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_sha256: Option<String>,

    // --- Memory metrics ---
    /// Peak resident set size in MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_rss_mb: Option<f64>,

    // --- CLI context ---
    /// Command line arguments used
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cli_args: Vec<String>,
}

impl BenchRecord {
    /// Create a new BenchRecord with required fields
    pub fn new(
        function_name: String,
        env: EnvironmentInfo,
        engine: EngineInfo,
        config: RunConfig,
    ) -> Self {
        // Generate a unique record ID from timestamp + nanos
        let timestamp = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let record_id = format!(
            "{:x}-{}",
            nanos,
            &timestamp[..19].replace([':', '-', 'T'], "")
        );

        BenchRecord {
            schema_version: SCHEMA_VERSION,
            record_id,
            timestamp,
            function_name,
            function_source: None,
            env,
            engine,
            config,
            compile_stats: None,
            eval_stats: None,
            accuracy_percent: None,
            samples_total: None,
            samples_correct: None,
            graph_node_count: None,
            max_bit_width: None,
            inputset_size: None,
            inputs_sha256: None,
            peak_rss_mb: None,
            cli_args: Vec::new(),
        }
    }
}
