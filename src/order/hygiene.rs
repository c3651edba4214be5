//! Graph hygiene: normalization, deduplication, edge pruning, and the
//! integrity check.

use super::Order;
use super::handler::{Handler, Target};
use super::store::connect;
use super::subtype::less_or_equal;
use crate::diagnostics::{Error, Result};
use crate::types::Type;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

/// Sorts and deduplicates every backedge list and the successor list of
/// `Bottom`.
pub fn normalize(handler: &mut dyn Handler) {
    for index in handler.keys() {
        if let Some(mut backedges) = handler.find_backedges(index) {
            backedges.sort();
            backedges.dedup();
            handler.set_backedges(index, backedges);
        }
    }
    if let Some(bottom_index) = handler.find_index(&Type::Bottom) {
        if let Some(mut edges) = handler.find_edges(bottom_index) {
            edges.sort();
            edges.dedup();
            handler.set_edges(bottom_index, edges);
        }
    }
}

fn keep_first_per_target(targets: Vec<Target>) -> Vec<Target> {
    let mut seen = std::collections::HashSet::new();
    targets
        .into_iter()
        .filter(|target| seen.insert(target.target))
        .collect()
}

/// Compresses the adjacency of each listed annotation to the first edge
/// per neighbor.
pub fn deduplicate(handler: &mut dyn Handler, annotations: &[Type]) {
    for annotation in annotations {
        let Some(index) = handler.find_index(annotation) else {
            continue;
        };
        if let Some(edges) = handler.find_edges(index) {
            handler.set_edges(index, keep_first_per_target(edges));
        }
        if let Some(backedges) = handler.find_backedges(index) {
            handler.set_backedges(index, keep_first_per_target(backedges));
        }
    }
}

/// Drops direct edges to `top` from listed vertices that have other
/// successors, and direct edges from `bottom` into listed vertices that
/// have other predecessors.
pub fn remove_extra_edges(
    handler: &mut dyn Handler,
    bottom: &Type,
    top: &Type,
    annotations: &[Type],
) {
    let (Some(bottom_index), Some(top_index)) =
        (handler.find_index(bottom), handler.find_index(top))
    else {
        return;
    };
    for annotation in annotations {
        let Some(index) = handler.find_index(annotation) else {
            continue;
        };
        let edges = handler.find_edges(index).unwrap_or_default();
        if edges.len() > 1 && edges.iter().any(|target| target.target == top_index) {
            handler.set_edges(
                index,
                edges
                    .into_iter()
                    .filter(|target| target.target != top_index)
                    .collect(),
            );
            let top_backedges = handler.find_backedges(top_index).unwrap_or_default();
            handler.set_backedges(
                top_index,
                top_backedges
                    .into_iter()
                    .filter(|target| target.target != index)
                    .collect(),
            );
        }
        let backedges = handler.find_backedges(index).unwrap_or_default();
        if backedges.len() > 1
            && backedges.iter().any(|target| target.target == bottom_index)
        {
            handler.set_backedges(
                index,
                backedges
                    .into_iter()
                    .filter(|target| target.target != bottom_index)
                    .collect(),
            );
            let bottom_edges = handler.find_edges(bottom_index).unwrap_or_default();
            handler.set_edges(
                bottom_index,
                bottom_edges
                    .into_iter()
                    .filter(|target| target.target != index)
                    .collect(),
            );
        }
    }
}

/// Connects every listed vertex that is not already below `top` and has no
/// outgoing edges to `top`.
pub fn connect_annotations_to_top(
    handler: &mut dyn Handler,
    top: &Type,
    annotations: &[Type],
) {
    for annotation in annotations {
        let Some(index) = handler.find_index(annotation) else {
            continue;
        };
        let below = {
            let order = Order::without_callbacks(&*handler);
            less_or_equal(&order, annotation, top).unwrap_or(false)
        };
        let has_successors = handler
            .find_edges(index)
            .is_some_and(|edges| !edges.is_empty());
        if !below && !has_successors {
            connect(handler, annotation, top, vec![]);
        }
    }
}

/// Verifies the graph invariants: `Bottom` and `Top` present, every key in
/// all four tables, acyclicity, and mirrored edges in both directions.
pub fn check_integrity(handler: &dyn Handler) -> Result<()> {
    if !handler.contains(&Type::Bottom) {
        return Err(Box::new(Error::incomplete("Bottom is not tracked")));
    }
    if !handler.contains(&Type::Top) {
        return Err(Box::new(Error::incomplete("Top is not tracked")));
    }

    let keys = handler.keys();
    for &index in &keys {
        let Some(annotation) = handler.find_annotation(index) else {
            return Err(Box::new(Error::incomplete(format!(
                "no annotation for index {index}"
            ))));
        };
        if handler.find_index(&annotation) != Some(index) {
            return Err(Box::new(Error::incomplete(format!(
                "index mismatch for {annotation}"
            ))));
        }
        if handler.find_edges(index).is_none() {
            return Err(Box::new(Error::incomplete(format!(
                "no edges for {annotation}"
            ))));
        }
        if handler.find_backedges(index).is_none() {
            return Err(Box::new(Error::incomplete(format!(
                "no backedges for {annotation}"
            ))));
        }
    }

    let mut graph = DiGraphMap::<usize, ()>::new();
    for &index in &keys {
        graph.add_node(index);
        for edge in handler.find_edges(index).unwrap_or_default() {
            graph.add_edge(index, edge.target, ());
        }
    }
    if toposort(&graph, None).is_err() {
        return Err(Box::new(Error::cyclic()));
    }

    for &index in &keys {
        for edge in handler.find_edges(index).unwrap_or_default() {
            let mirrored = handler
                .find_backedges(edge.target)
                .unwrap_or_default()
                .iter()
                .any(|backedge| {
                    backedge.target == index && backedge.parameters == edge.parameters
                });
            if !mirrored {
                return Err(Box::new(Error::incomplete(format!(
                    "no backedge for {index} -> {}",
                    edge.target
                ))));
            }
        }
        for backedge in handler.find_backedges(index).unwrap_or_default() {
            let mirrored = handler
                .find_edges(backedge.target)
                .unwrap_or_default()
                .iter()
                .any(|edge| {
                    edge.target == index && edge.parameters == backedge.parameters
                });
            if !mirrored {
                return Err(Box::new(Error::incomplete(format!(
                    "no edge for {} -> {index}",
                    backedge.target
                ))));
            }
        }
    }
    Ok(())
}
