//! In-process simulated engine.
//!
//! Compiles functions into width-calibrated operation graphs and evaluates
//! them on plain integers, wrapping every node into its inferred width. No
//! encryption happens; the overflow behavior of a width-limited circuit is
//! preserved, which is what the accuracy measurements care about.

use std::fmt;

use tracing::debug;

use crate::BenchResult;

use super::debugging::format_operation_graph;
use super::graph::{FunctionDef, OpGraph};
use super::{Capabilities, Circuit, Engine};

/// The default engine: exact graph evaluation with per-node width wrapping.
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngine;

impl SimulatedEngine {
    pub fn new() -> Self {
        SimulatedEngine
    }
}

impl Engine for SimulatedEngine {
    fn name(&self) -> &str {
        "clear"
    }

    fn version(&self) -> Option<String> {
        Some(env!("CARGO_PKG_VERSION").to_string())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::simulated()
    }

    fn compile(&self, function: &FunctionDef, inputset: &[i64]) -> BenchResult<Box<dyn Circuit>> {
        let graph = OpGraph::compile(function, inputset)?;
        debug!(
            function = %function.name,
            nodes = graph.node_count(),
            max_width = graph.max_bit_width(),
            "compiled"
        );
        Ok(Box::new(SimulatedCircuit {
            engine_name: self.name().to_string(),
            graph,
        }))
    }
}

/// Circuit produced by `SimulatedEngine`.
#[derive(Debug, Clone)]
pub struct SimulatedCircuit {
    engine_name: String,
    graph: OpGraph,
}

impl SimulatedCircuit {
    /// Compile a function directly, without going through the trait object.
    pub fn compile(function: &FunctionDef, inputset: &[i64]) -> BenchResult<Self> {
        let graph = OpGraph::compile(function, inputset)?;
        Ok(SimulatedCircuit {
            engine_name: "clear".to_string(),
            graph,
        })
    }
}

impl Circuit for SimulatedCircuit {
    fn engine_name(&self) -> &str {
        &self.engine_name
    }

    fn op_graph(&self) -> &OpGraph {
        &self.graph
    }

    fn run(&self, input: i64) -> BenchResult<i64> {
        Ok(self.graph.evaluate_wrapped(input))
    }
}

impl fmt::Display for SimulatedCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_operation_graph(&self.graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::debugging::draw_graph;
    use crate::engine::graph::{FunctionOp, OpKind};

    fn x_plus_42() -> FunctionDef {
        FunctionDef::new(
            "x_plus_42",
            vec![FunctionOp {
                kind: OpKind::Add,
                value: 42,
            }],
        )
    }

    #[test]
    fn test_circuit_display_matches_format_operation_graph() {
        let inputset: Vec<i64> = (0..8).collect();
        let circuit = SimulatedCircuit::compile(&x_plus_42(), &inputset).unwrap();
        assert_eq!(circuit.to_string(), format_operation_graph(circuit.op_graph()));
    }

    #[test]
    fn test_circuit_draw_matches_draw_graph() {
        let inputset: Vec<i64> = (0..8).collect();
        let circuit = SimulatedCircuit::compile(&x_plus_42(), &inputset).unwrap();
        assert_eq!(circuit.draw(true), draw_graph(circuit.op_graph(), true));
        assert_eq!(circuit.draw(false), draw_graph(circuit.op_graph(), false));
    }

    #[test]
    fn test_circuit_run_matches_reference_on_inputset() {
        let f = x_plus_42();
        let inputset: Vec<i64> = (0..8).collect();
        let engine = SimulatedEngine::new();
        let circuit = engine.compile(&f, &inputset).unwrap();
        for x in inputset {
            assert_eq!(circuit.run(x).unwrap(), f.evaluate(x).unwrap());
        }
    }
}
