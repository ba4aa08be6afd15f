//! Introspection helpers for compiled operation graphs.
//!
//! These are the reference renderings: a circuit's `Display` output and its
//! `draw` output are defined to match `format_operation_graph` and
//! `draw_graph` exactly.

use super::graph::{NodeOp, OpGraph};

fn scalar_type(graph: &OpGraph, index: usize) -> String {
    let node = &graph.nodes[index];
    if node.is_encrypted() {
        format!("EncryptedScalar<{}>", node.bounds.type_name())
    } else {
        format!("ClearScalar<{}>", node.bounds.type_name())
    }
}

fn node_expr(graph: &OpGraph, index: usize) -> String {
    match &graph.nodes[index].op {
        NodeOp::Input { name } => name.clone(),
        NodeOp::Constant { value } => value.to_string(),
        NodeOp::Binary { kind, lhs, rhs } => format!("{}(%{}, %{})", kind.name(), lhs, rhs),
    }
}

/// Render a graph as a numbered listing, one node per line, with scalar type
/// annotations in a trailing comment column.
pub fn format_operation_graph(graph: &OpGraph) -> String {
    let exprs: Vec<String> = (0..graph.nodes.len())
        .map(|i| format!("%{} = {}", i, node_expr(graph, i)))
        .collect();
    let column = exprs.iter().map(|e| e.len()).max().unwrap_or(0) + 8;

    let mut out = String::new();
    for (i, expr) in exprs.iter().enumerate() {
        out.push_str(&format!(
            "{:<width$}# {}\n",
            expr,
            scalar_type(graph, i),
            width = column
        ));
    }
    out.push_str(&format!("return %{}\n", graph.output));
    out
}

/// Render a graph as Graphviz DOT. `vertical` selects top-to-bottom layout,
/// otherwise left-to-right.
pub fn draw_graph(graph: &OpGraph, vertical: bool) -> String {
    let rankdir = if vertical { "TB" } else { "LR" };
    let mut out = String::new();
    out.push_str("digraph op_graph {\n");
    out.push_str(&format!("    rankdir={};\n", rankdir));
    out.push_str("    node [shape=box];\n");
    for i in 0..graph.nodes.len() {
        let label = match &graph.nodes[i].op {
            NodeOp::Input { name } => name.clone(),
            NodeOp::Constant { value } => value.to_string(),
            NodeOp::Binary { kind, .. } => kind.name().to_string(),
        };
        out.push_str(&format!(
            "    n{} [label=\"%{} = {} : {}\"];\n",
            i,
            i,
            label,
            scalar_type(graph, i)
        ));
    }
    for (i, node) in graph.nodes.iter().enumerate() {
        if let NodeOp::Binary { lhs, rhs, .. } = &node.op {
            out.push_str(&format!("    n{} -> n{};\n", lhs, i));
            out.push_str(&format!("    n{} -> n{};\n", rhs, i));
        }
    }
    out.push_str("}\n");
    out
}
