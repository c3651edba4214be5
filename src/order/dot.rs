//! Graphviz rendering of the graph for debugging.

use super::handler::Handler;
use std::fmt::Write;

/// Emits a deterministic Graphviz representation: vertices and edges in
/// ascending index order, labelled with their annotations and edge
/// parameters.
pub fn to_dot(handler: &dyn Handler) -> String {
    let mut keys = handler.keys();
    keys.sort_unstable();

    let mut output = String::from("digraph {\n");
    for &index in &keys {
        if let Some(annotation) = handler.find_annotation(index) {
            let _ = writeln!(output, "  {index}[label=\"{annotation}\"]");
        }
    }
    for &index in &keys {
        for edge in handler.find_edges(index).unwrap_or_default() {
            if edge.parameters.is_empty() {
                let _ = writeln!(output, "  {index} -> {}", edge.target);
            } else {
                let parameters = edge
                    .parameters
                    .iter()
                    .map(|parameter| parameter.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(
                    output,
                    "  {index} -> {}[label=\"({parameters})\"]",
                    edge.target
                );
            }
        }
    }
    output.push_str("}\n");
    output
}
