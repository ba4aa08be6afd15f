//! Mock engine for testing.

use crate::{BenchError, BenchResult};

use super::graph::{FunctionDef, OpGraph};
use super::{Capabilities, Circuit, Engine};

/// Configuration for mock engine behavior.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Name to report
    pub name: String,
    /// Version to report
    pub version: Option<String>,
    /// Capabilities to report
    pub capabilities: Capabilities,
    /// Added to every circuit result, to provoke accuracy misses
    pub result_offset: i64,
    /// Whether compile should fail
    pub compile_fails: bool,
    /// Whether run should fail
    pub run_fails: bool,
}

impl MockConfig {
    /// Create a new mock config with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        MockConfig {
            name: name.into(),
            version: Some("mock-1.0.0".to_string()),
            capabilities: Capabilities::simulated(),
            result_offset: 0,
            compile_fails: false,
            run_fails: false,
        }
    }

    /// Offset every result by the given amount.
    pub fn with_result_offset(mut self, offset: i64) -> Self {
        self.result_offset = offset;
        self
    }

    /// Make compile fail.
    pub fn compile_fails(mut self) -> Self {
        self.compile_fails = true;
        self
    }

    /// Make run fail.
    pub fn run_fails(mut self) -> Self {
        self.run_fails = true;
        self
    }

    /// Set capabilities.
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.capabilities = caps;
        self
    }
}

/// Mock engine for unit testing.
///
/// Compiles through the same graph calibration as the simulated engine but
/// returns configurable fake behavior on top: forced failures and result
/// offsets.
pub struct MockEngine {
    config: MockConfig,
}

impl MockEngine {
    /// Create a new mock engine with the given configuration.
    pub fn new(config: MockConfig) -> Self {
        MockEngine { config }
    }

    /// Create a mock engine with default configuration.
    pub fn default_mock() -> Self {
        Self::new(MockConfig::new("mock"))
    }
}

impl Engine for MockEngine {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn version(&self) -> Option<String> {
        self.config.version.clone()
    }

    fn capabilities(&self) -> Capabilities {
        self.config.capabilities.clone()
    }

    fn compile(&self, function: &FunctionDef, inputset: &[i64]) -> BenchResult<Box<dyn Circuit>> {
        if self.config.compile_fails {
            return Err(BenchError::Message("mock compile failed".into()));
        }
        let graph = OpGraph::compile(function, inputset)?;
        Ok(Box::new(MockCircuit {
            engine_name: self.config.name.clone(),
            graph,
            result_offset: self.config.result_offset,
            run_fails: self.config.run_fails,
        }))
    }
}

struct MockCircuit {
    engine_name: String,
    graph: OpGraph,
    result_offset: i64,
    run_fails: bool,
}

impl Circuit for MockCircuit {
    fn engine_name(&self) -> &str {
        &self.engine_name
    }

    fn op_graph(&self) -> &OpGraph {
        &self.graph
    }

    fn run(&self, input: i64) -> BenchResult<i64> {
        if self.run_fails {
            return Err(BenchError::Message("mock run failed".into()));
        }
        Ok(self.graph.evaluate_wrapped(input) + self.result_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graph::{FunctionOp, OpKind};

    fn x_minus_24() -> FunctionDef {
        FunctionDef::new(
            "x_minus_24",
            vec![FunctionOp {
                kind: OpKind::Sub,
                value: 24,
            }],
        )
    }

    #[test]
    fn test_mock_engine_default() {
        let engine = MockEngine::default_mock();
        assert_eq!(engine.name(), "mock");
        assert!(engine.version().is_some());
    }

    #[test]
    fn test_mock_compile_and_run() {
        let engine = MockEngine::default_mock();
        let inputset: Vec<i64> = (0..64).collect();
        let circuit = engine.compile(&x_minus_24(), &inputset).unwrap();
        assert_eq!(circuit.run(40).unwrap(), 16);
    }

    #[test]
    fn test_mock_compile_fails() {
        let engine = MockEngine::new(MockConfig::new("mock").compile_fails());
        let inputset: Vec<i64> = (0..64).collect();
        let result = engine.compile(&x_minus_24(), &inputset);
        assert!(result.is_err());
    }

    #[test]
    fn test_mock_run_fails() {
        let engine = MockEngine::new(MockConfig::new("mock").run_fails());
        let inputset: Vec<i64> = (0..64).collect();
        let circuit = engine.compile(&x_minus_24(), &inputset).unwrap();
        assert!(circuit.run(40).is_err());
    }

    #[test]
    fn test_mock_result_offset_breaks_accuracy() {
        let engine = MockEngine::new(MockConfig::new("mock").with_result_offset(1));
        let inputset: Vec<i64> = (0..64).collect();
        let circuit = engine.compile(&x_minus_24(), &inputset).unwrap();
        assert_eq!(circuit.run(40).unwrap(), 17);
    }
}
