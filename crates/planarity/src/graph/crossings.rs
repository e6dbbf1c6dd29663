use super::{Edge, Nodes};
use crate::geometry::segments_intersect;

/// Count pairs of non-adjacent edges whose segments cross or touch.
///
/// Edges sharing an endpoint always meet there, so those pairs never count.
pub fn count_crossings(nodes: &Nodes, edges: &[Edge]) -> usize {
    crossing_pairs(nodes, edges).count()
}

/// Index pairs `(i, j)` with `i < j` of the edges that cross.
pub fn crossing_pairs<'a>(
    nodes: &'a Nodes,
    edges: &'a [Edge],
) -> impl Iterator<Item = (usize, usize)> + 'a {
    edges.iter().enumerate().flat_map(move |(i, &e)| {
        edges[i + 1..]
            .iter()
            .enumerate()
            .filter(move |&(_, &f)| !e.shares_endpoint(f) && crosses(nodes, e, f))
            .map(move |(k, _)| (i, i + 1 + k))
    })
}

fn crosses(nodes: &Nodes, e: Edge, f: Edge) -> bool {
    let (e0, e1) = e.endpoints();
    let (f0, f1) = f.endpoints();
    segments_intersect(nodes[e0], nodes[e1], nodes[f0], nodes[f1])
}
