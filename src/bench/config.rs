use std::path::Path;

use serde::Deserialize;

use crate::engine::graph::{FunctionDef, FunctionOp, OpKind};
use crate::{BenchError, BenchResult};

/// A benchmark target resolved from the config file.
#[derive(Debug, Clone)]
pub struct TargetSpec {
    pub function: FunctionDef,
    /// Input domain is `0 .. 2^bit_width`
    pub bit_width: u32,
    pub samples: u32,
    pub sample_min: i64,
    pub sample_max: i64,
}

#[derive(Debug, Deserialize)]
struct RawOp {
    pub op: OpKind,
    pub value: i64,
}

#[derive(Debug, Deserialize)]
struct RawFunction {
    pub name: String,
    pub ops: Vec<RawOp>,
    pub bit_width: u32,
    #[serde(default)]
    pub samples: Option<u32>,
    #[serde(default)]
    pub sample_min: Option<i64>,
    #[serde(default)]
    pub sample_max: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BenchConfig {
    #[serde(rename = "function")]
    pub functions: Vec<RawFunction>,
}

const MAX_BIT_WIDTH: u32 = 16;
const DEFAULT_SAMPLES: u32 = 4;

fn into_spec(raw: RawFunction) -> BenchResult<TargetSpec> {
    if raw.bit_width == 0 || raw.bit_width > MAX_BIT_WIDTH {
        return Err(BenchError::Message(format!(
            "function `{}`: bit_width must be in 1..={MAX_BIT_WIDTH}",
            raw.name
        )));
    }
    let domain_max = (1i64 << raw.bit_width) - 1;
    let sample_min = raw.sample_min.unwrap_or(0);
    let sample_max = raw.sample_max.unwrap_or(domain_max);
    if sample_min > sample_max {
        return Err(BenchError::Message(format!(
            "function `{}`: sample_min > sample_max",
            raw.name
        )));
    }
    let ops = raw
        .ops
        .into_iter()
        .map(|o| FunctionOp {
            kind: o.op,
            value: o.value,
        })
        .collect();
    Ok(TargetSpec {
        function: FunctionDef::new(raw.name, ops),
        bit_width: raw.bit_width,
        samples: raw.samples.unwrap_or(DEFAULT_SAMPLES),
        sample_min,
        sample_max,
    })
}

/// Load and validate all targets from a bench config file.
pub fn load_bench_config(path: &Path) -> BenchResult<Vec<TargetSpec>> {
    let s = std::fs::read_to_string(path).map_err(|e| BenchError::Message(e.to_string()))?;
    let cfg: BenchConfig = toml::from_str(&s).map_err(|e| BenchError::Message(e.to_string()))?;
    cfg.functions.into_iter().map(into_spec).collect()
}

/// List (name, source form) pairs for the targets in a config file.
pub fn list_functions_in_config(path: &Path) -> BenchResult<Vec<(String, String)>> {
    let specs = load_bench_config(path)?;
    Ok(specs
        .into_iter()
        .map(|s| {
            let source = s.function.source_form();
            (s.function.name, source)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_bench_config() {
        let f = write_config(
            r#"
[[function]]
name = "x_minus_24"
bit_width = 6
ops = [{ op = "sub", value = 24 }]
samples = 4
sample_min = 40
sample_max = 47

[[function]]
name = "x_plus_42"
bit_width = 3
ops = [{ op = "add", value = 42 }]
"#,
        );
        let specs = load_bench_config(f.path()).unwrap();
        assert_eq!(specs.len(), 2);

        assert_eq!(specs[0].function.name, "x_minus_24");
        assert_eq!(specs[0].bit_width, 6);
        assert_eq!(specs[0].samples, 4);
        assert_eq!(specs[0].sample_min, 40);
        assert_eq!(specs[0].sample_max, 47);
        assert_eq!(specs[0].function.evaluate(40).unwrap(), 16);

        // Defaults: samples 4, sample range is the whole domain
        assert_eq!(specs[1].samples, 4);
        assert_eq!(specs[1].sample_min, 0);
        assert_eq!(specs[1].sample_max, 7);
    }

    #[test]
    fn test_rejects_zero_bit_width() {
        let f = write_config(
            r#"
[[function]]
name = "bad"
bit_width = 0
ops = [{ op = "add", value = 1 }]
"#,
        );
        let err = load_bench_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("bit_width"));
    }

    #[test]
    fn test_rejects_inverted_sample_range() {
        let f = write_config(
            r#"
[[function]]
name = "bad"
bit_width = 4
ops = [{ op = "add", value = 1 }]
sample_min = 10
sample_max = 2
"#,
        );
        let err = load_bench_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("sample_min"));
    }

    #[test]
    fn test_list_functions() {
        let f = write_config(
            r#"
[[function]]
name = "x_minus_24"
bit_width = 6
ops = [{ op = "sub", value = 24 }]
"#,
        );
        let listed = list_functions_in_config(f.path()).unwrap();
        assert_eq!(listed, vec![("x_minus_24".to_string(), "x - 24".to_string())]);
    }
}
