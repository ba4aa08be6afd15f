//! Operation graphs for univariate integer functions.
//!
//! A `FunctionDef` is the benchmark-facing description of a target function
//! (a chain of constant operations applied to the input `x`). Compiling it
//! produces an `OpGraph` whose per-node integer bounds are calibrated by
//! sweeping an inputset, the same way bit widths are inferred from sample
//! domains in encrypted-computation compilers.

use serde::{Deserialize, Serialize};

use crate::{BenchError, BenchResult};

/// Arithmetic operation kinds supported by target functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Add,
    Sub,
    Mul,
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Sub => "sub",
            OpKind::Mul => "mul",
        }
    }

    /// Infix symbol, used when rendering the function source form.
    pub fn symbol(&self) -> &'static str {
        match self {
            OpKind::Add => "+",
            OpKind::Sub => "-",
            OpKind::Mul => "*",
        }
    }
}

/// One step of a target function: `x <op> value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionOp {
    pub kind: OpKind,
    pub value: i64,
}

/// A univariate integer function, e.g. `x - 24` or `(x + 1) * 3`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub ops: Vec<FunctionOp>,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, ops: Vec<FunctionOp>) -> Self {
        FunctionDef {
            name: name.into(),
            ops,
        }
    }

    /// Exact cleartext evaluation. This is the reference used to label
    /// samples when scoring accuracy.
    ///
    /// # Errors
    /// Returns an error if an intermediate value overflows.
    pub fn evaluate(&self, x: i64) -> BenchResult<i64> {
        let mut v = i128::from(x);
        for op in &self.ops {
            let c = i128::from(op.value);
            v = match op.kind {
                OpKind::Add => v.checked_add(c),
                OpKind::Sub => v.checked_sub(c),
                OpKind::Mul => v.checked_mul(c),
            }
            .ok_or_else(|| overflow_error(&self.name))?;
        }
        i64::try_from(v).map_err(|_| overflow_error(&self.name))
    }

    /// Source-like rendering with the steps applied left to right, e.g.
    /// `x - 24` or `(x - 24) * 3`.
    pub fn source_form(&self) -> String {
        let mut s = "x".to_string();
        for (i, op) in self.ops.iter().enumerate() {
            let lhs = if i == 0 { s } else { format!("({s})") };
            s = format!("{} {} {}", lhs, op.kind.symbol(), op.value);
        }
        s
    }
}

fn overflow_error(name: &str) -> BenchError {
    BenchError::Message(format!("arithmetic overflow evaluating `{name}`"))
}

/// Observed value range of a graph node over the calibration inputset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    pub fn point(value: i64) -> Self {
        Bounds {
            min: value,
            max: value,
        }
    }

    fn update(&mut self, value: i64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn is_signed(&self) -> bool {
        self.min < 0
    }

    /// Minimal bit width able to represent every value in the bounds:
    /// two's complement when the range dips below zero, unsigned otherwise.
    pub fn bit_width(&self) -> u32 {
        if self.is_signed() {
            let mut w = 1;
            while i128::from(self.min) < -(1i128 << (w - 1))
                || i128::from(self.max) >= (1i128 << (w - 1))
            {
                w += 1;
            }
            w
        } else if self.max == 0 {
            1
        } else {
            64 - (self.max as u64).leading_zeros()
        }
    }

    /// Scalar type name in the graph listing, e.g. `uint6` or `int7`.
    pub fn type_name(&self) -> String {
        if self.is_signed() {
            format!("int{}", self.bit_width())
        } else {
            format!("uint{}", self.bit_width())
        }
    }

    /// Wrap an exact value into this node's width, reproducing what a
    /// width-limited circuit does on overflow.
    pub fn wrap(&self, value: i128) -> i64 {
        let modulus = 1i128 << self.bit_width();
        let r = value.rem_euclid(modulus);
        if self.is_signed() && r >= modulus / 2 {
            (r - modulus) as i64
        } else {
            r as i64
        }
    }
}

/// A node's operation within the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOp {
    /// The encrypted input variable.
    Input { name: String },
    /// A clear constant operand.
    Constant { value: i64 },
    /// An arithmetic node over two earlier nodes.
    Binary {
        kind: OpKind,
        lhs: usize,
        rhs: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub op: NodeOp,
    pub bounds: Bounds,
}

impl Node {
    /// Clear operands are not ciphertexts; everything else is.
    pub fn is_encrypted(&self) -> bool {
        !matches!(self.op, NodeOp::Constant { .. })
    }
}

/// Compiled operation graph with calibrated per-node bounds.
#[derive(Debug, Clone)]
pub struct OpGraph {
    pub nodes: Vec<Node>,
    pub output: usize,
}

impl OpGraph {
    /// Build the graph for a function and calibrate node bounds by sweeping
    /// the inputset. An empty inputset cannot infer any width and is
    /// rejected.
    pub fn compile(function: &FunctionDef, inputset: &[i64]) -> BenchResult<OpGraph> {
        if inputset.is_empty() {
            return Err(BenchError::Message(format!(
                "cannot compile `{}`: inputset is empty",
                function.name
            )));
        }

        let mut nodes = vec![Node {
            op: NodeOp::Input {
                name: "x".to_string(),
            },
            bounds: Bounds::point(inputset[0]),
        }];
        let mut last = 0;
        for op in &function.ops {
            let constant = nodes.len();
            nodes.push(Node {
                op: NodeOp::Constant { value: op.value },
                bounds: Bounds::point(op.value),
            });
            let binary = nodes.len();
            nodes.push(Node {
                op: NodeOp::Binary {
                    kind: op.kind,
                    lhs: last,
                    rhs: constant,
                },
                bounds: Bounds::point(0),
            });
            last = binary;
        }

        let mut graph = OpGraph {
            nodes,
            output: last,
        };
        graph
            .calibrate(inputset)
            .map_err(|_| overflow_error(&function.name))?;
        Ok(graph)
    }

    /// Sweep the inputset through exact evaluation, recording each node's
    /// observed min/max.
    fn calibrate(&mut self, inputset: &[i64]) -> BenchResult<()> {
        let mut first = true;
        for &x in inputset {
            let values = self.evaluate_exact_nodes(x)?;
            for (node, &value) in self.nodes.iter_mut().zip(values.iter()) {
                if matches!(node.op, NodeOp::Constant { .. }) {
                    continue;
                }
                if first {
                    node.bounds = Bounds::point(value);
                } else {
                    node.bounds.update(value);
                }
            }
            first = false;
        }
        Ok(())
    }

    fn evaluate_exact_nodes(&self, x: i64) -> BenchResult<Vec<i64>> {
        let mut values = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let v = match &node.op {
                NodeOp::Input { .. } => i128::from(x),
                NodeOp::Constant { value } => i128::from(*value),
                NodeOp::Binary { kind, lhs, rhs } => {
                    let a = i128::from(values[*lhs]);
                    let b = i128::from(values[*rhs]);
                    match kind {
                        OpKind::Add => a + b,
                        OpKind::Sub => a - b,
                        OpKind::Mul => a * b,
                    }
                }
            };
            let v = i64::try_from(v).map_err(|_| {
                BenchError::Message("arithmetic overflow during calibration".to_string())
            })?;
            values.push(v);
        }
        Ok(values)
    }

    /// Evaluate with per-node wrapping into the calibrated widths. Inputs
    /// outside the inputset domain can overflow and come back wrong, exactly
    /// like a width-limited encrypted circuit.
    pub fn evaluate_wrapped(&self, x: i64) -> i64 {
        let mut values: Vec<i64> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let v = match &node.op {
                NodeOp::Input { .. } => node.bounds.wrap(x as i128),
                NodeOp::Constant { value } => *value,
                NodeOp::Binary { kind, lhs, rhs } => {
                    let a = values[*lhs] as i128;
                    let b = values[*rhs] as i128;
                    let exact = match kind {
                        OpKind::Add => a + b,
                        OpKind::Sub => a - b,
                        OpKind::Mul => a * b,
                    };
                    node.bounds.wrap(exact)
                }
            };
            values.push(v);
        }
        values[self.output]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Widest encrypted node in the graph.
    pub fn max_bit_width(&self) -> u32 {
        self.nodes
            .iter()
            .filter(|n| n.is_encrypted())
            .map(|n| n.bounds.bit_width())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_bounds_widths() {
        assert_eq!(Bounds { min: 0, max: 0 }.bit_width(), 1);
        assert_eq!(Bounds { min: 0, max: 7 }.bit_width(), 3);
        assert_eq!(Bounds { min: 0, max: 8 }.bit_width(), 4);
        assert_eq!(Bounds { min: 0, max: 63 }.bit_width(), 6);
        // Signed: [-24, 39] needs int7
        let b = Bounds { min: -24, max: 39 };
        assert!(b.is_signed());
        assert_eq!(b.bit_width(), 7);
        assert_eq!(b.type_name(), "int7");
    }

    #[test]
    fn test_bounds_wrap_unsigned() {
        let b = Bounds { min: 0, max: 63 };
        assert_eq!(b.wrap(63), 63);
        assert_eq!(b.wrap(64), 0);
        assert_eq!(b.wrap(70), 6);
    }

    #[test]
    fn test_bounds_wrap_signed() {
        let b = Bounds { min: -24, max: 39 };
        // int7 wraps into [-64, 64)
        assert_eq!(b.wrap(-24), -24);
        assert_eq!(b.wrap(64), -64);
        assert_eq!(b.wrap(-65), 63);
    }

    #[test]
    fn test_function_evaluate_and_source_form() {
        let f = FunctionDef::new(
            "f",
            vec![
                FunctionOp {
                    kind: OpKind::Sub,
                    value: 24,
                },
                FunctionOp {
                    kind: OpKind::Mul,
                    value: 3,
                },
            ],
        );
        assert_eq!(f.evaluate(30).unwrap(), 18);
        // Steps apply left to right, so the rendering parenthesizes
        assert_eq!(f.source_form(), "(x - 24) * 3");
        assert_eq!(x_plus_42().source_form(), "x + 42");
    }

    #[test]
    fn test_evaluate_reports_overflow() {
        let f = FunctionDef::new(
            "f",
            vec![
                FunctionOp {
                    kind: OpKind::Mul,
                    value: i64::MAX,
                },
                FunctionOp {
                    kind: OpKind::Mul,
                    value: i64::MAX,
                },
                FunctionOp {
                    kind: OpKind::Mul,
                    value: i64::MAX,
                },
            ],
        );
        let err = f.evaluate(2).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn test_compile_infers_widths() {
        let inputset: Vec<i64> = (0..8).collect();
        let graph = OpGraph::compile(&x_plus_42(), &inputset).unwrap();

        // input, constant, add
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.nodes[0].bounds.type_name(), "uint3");
        assert_eq!(graph.nodes[1].bounds.type_name(), "uint6");
        // output range is [42, 49] -> uint6
        assert_eq!(graph.nodes[2].bounds.type_name(), "uint6");
        assert_eq!(graph.max_bit_width(), 6);
    }

    #[test]
    fn test_compile_reports_calibration_overflow() {
        let f = FunctionDef::new(
            "f",
            vec![
                FunctionOp {
                    kind: OpKind::Mul,
                    value: i64::MAX,
                },
                FunctionOp {
                    kind: OpKind::Mul,
                    value: i64::MAX,
                },
            ],
        );
        let err = OpGraph::compile(&f, &[2, 3]).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn test_compile_rejects_empty_inputset() {
        let err = OpGraph::compile(&x_plus_42(), &[]).unwrap_err();
        assert!(err.to_string().contains("inputset is empty"));
    }

    #[test]
    fn test_wrapped_evaluation_matches_reference_on_inputset() {
        let f = FunctionDef::new(
            "x_minus_24",
            vec![FunctionOp {
                kind: OpKind::Sub,
                value: 24,
            }],
        );
        let inputset: Vec<i64> = (0..64).collect();
        let graph = OpGraph::compile(&f, &inputset).unwrap();
        for x in inputset {
            assert_eq!(graph.evaluate_wrapped(x), f.evaluate(x).unwrap());
        }
    }

    #[test]
    fn test_wrapped_evaluation_overflows_outside_inputset() {
        let inputset: Vec<i64> = (0..8).collect();
        let graph = OpGraph::compile(&x_plus_42(), &inputset).unwrap();
        // Every node wraps: 30 enters the calibrated uint3 input as
        // 30 % 8 = 6, so the circuit computes 6 + 42 = 48, not 72
        assert_ne!(graph.evaluate_wrapped(30), 72);
        assert_eq!(graph.evaluate_wrapped(30), (30 % 8) + 42);
    }
}
