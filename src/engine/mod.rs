//! Engine abstraction for encrypted-computation backends.
//!
//! The benchmark driver talks to engines through the `Engine` and `Circuit`
//! traits: an engine compiles a `FunctionDef` over a calibration inputset and
//! hands back a runnable circuit. The in-process `SimulatedEngine` is the
//! default; `MockEngine` exists for tests.

pub mod clear;
pub mod debugging;
pub mod graph;
pub mod mock;

use serde::{Deserialize, Serialize};

use crate::{BenchError, BenchResult};

use self::graph::{FunctionDef, OpGraph};

/// Capabilities that an engine may support.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Can compile functions into circuits
    pub can_compile: bool,
    /// Can run compiled circuits
    pub can_run: bool,
    /// Exposes the compiled operation graph
    pub has_op_graph: bool,
    /// Actually encrypts (false for simulation)
    pub encrypts: bool,
}

impl Capabilities {
    /// Capabilities of the in-process simulated engine.
    pub fn simulated() -> Self {
        Capabilities {
            can_compile: true,
            can_run: true,
            has_op_graph: true,
            encrypts: false,
        }
    }
}

/// A compiled, runnable circuit.
pub trait Circuit {
    /// Name of the engine that produced this circuit.
    fn engine_name(&self) -> &str;

    /// The compiled operation graph with calibrated widths.
    fn op_graph(&self) -> &OpGraph;

    /// Run the circuit on a single plain input.
    fn run(&self, input: i64) -> BenchResult<i64>;

    /// DOT rendering of the circuit. Must match
    /// `debugging::draw_graph(self.op_graph(), vertical)`.
    fn draw(&self, vertical: bool) -> String {
        debugging::draw_graph(self.op_graph(), vertical)
    }
}

/// An encrypted-computation engine.
pub trait Engine: Send + Sync {
    /// Returns the engine name (e.g., "clear", "mock").
    fn name(&self) -> &str;

    /// Returns the engine version, if available.
    fn version(&self) -> Option<String>;

    /// Returns the capabilities supported by this engine.
    fn capabilities(&self) -> Capabilities;

    /// Compile a function into a circuit, inferring widths from `inputset`.
    ///
    /// # Errors
    /// Returns an error if the inputset is empty or compilation fails.
    fn compile(&self, function: &FunctionDef, inputset: &[i64]) -> BenchResult<Box<dyn Circuit>>;
}

/// Resolve an engine by name. `None` selects the simulated engine.
pub fn resolve_engine(name: Option<&str>) -> BenchResult<Box<dyn Engine>> {
    match name.unwrap_or("clear") {
        "clear" | "simulated" => Ok(Box::new(clear::SimulatedEngine::new())),
        "mock" => Ok(Box::new(mock::MockEngine::default_mock())),
        other => Err(BenchError::Message(format!("unknown engine: {other}"))),
    }
}
