//! End-to-end smoke tests for the benchmark driver through the public API.

use std::io::Write;

use fhe_bench::bench::bench_cmd::run_target;
use fhe_bench::bench::load_bench_config;
use fhe_bench::storage::JsonlWriter;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f
}

#[test]
fn bench_from_config_to_jsonl() {
    let cfg = write_config(
        r#"
[[function]]
name = "x_minus_24"
bit_width = 6
ops = [{ op = "sub", value = 24 }]
samples = 4
sample_min = 40
sample_max = 47
"#,
    );
    let specs = load_bench_config(cfg.path()).unwrap();
    let outcome = run_target(&specs[0], None, 1, 0, None, Some(3)).unwrap();

    // In-domain samples score perfectly
    assert_eq!(outcome.record.accuracy_percent, Some(100.0));
    assert_eq!(outcome.record.engine.name, "clear");
    assert_eq!(outcome.record.max_bit_width, Some(7)); // x - 24 needs int7

    // Record round-trips through JSONL storage
    let dir = tempfile::tempdir().unwrap();
    let writer = JsonlWriter::new(dir.path().join("bench.jsonl"));
    writer.append(&outcome.record).unwrap();
    let read_back = writer.read_all().unwrap();
    assert_eq!(read_back.len(), 1);
    assert_eq!(read_back[0].function_name, "x_minus_24");
    assert_eq!(read_back[0].accuracy_percent, Some(100.0));
}

#[test]
fn mock_engine_offset_is_visible_in_accuracy() {
    use fhe_bench::engine::mock::{MockConfig, MockEngine};
    use fhe_bench::engine::Engine;
    use fhe_bench::engine::graph::{FunctionDef, FunctionOp, OpKind};

    let function = FunctionDef::new(
        "x_minus_24",
        vec![FunctionOp {
            kind: OpKind::Sub,
            value: 24,
        }],
    );
    let inputset: Vec<i64> = (0..64).collect();
    let engine = MockEngine::new(MockConfig::new("mock").with_result_offset(1));
    let circuit = engine.compile(&function, &inputset).unwrap();

    // Every result is off by one against the reference
    for x in [40, 41, 42, 43] {
        assert_eq!(circuit.run(x).unwrap(), function.evaluate(x).unwrap() + 1);
    }
}

#[test]
fn multi_op_target_benches_cleanly() {
    let cfg = write_config(
        r#"
[[function]]
name = "x_times_3_minus_5"
bit_width = 4
ops = [{ op = "mul", value = 3 }, { op = "sub", value = 5 }]
samples = 8
sample_min = 2
sample_max = 15
"#,
    );
    let specs = load_bench_config(cfg.path()).unwrap();
    let outcome = run_target(&specs[0], None, 2, 1, None, Some(11)).unwrap();

    assert_eq!(outcome.record.accuracy_percent, Some(100.0));
    // input + two (constant, binary) pairs
    assert_eq!(outcome.record.graph_node_count, Some(5));
    assert_eq!(outcome.record.compile_stats.as_ref().unwrap().iterations, 2);
    assert_eq!(outcome.record.eval_stats.as_ref().unwrap().iterations, 8);
}
