//! Drainage graph construction from channel cells
//!
//! Channel cells (a thresholded accumulation grid) become graph nodes;
//! each node is then wired to the geometrically nearest node with a
//! strictly lower value. This nearest-lower search is an O(n²) proxy
//! for channel connectivity: it assumes channel cells are dense enough
//! that proximity approximates true drainage adjacency. Ties on
//! distance go to the first candidate found.

use demflow_core::{Grid, Node, StreamNetwork};

/// Collect one node per valid cell: center coordinates plus the cell
/// value. Feeds `build_directed` from a thresholded accumulation grid.
pub fn nodes_from_grid(grid: &Grid) -> Vec<Node> {
    let (rows, cols) = grid.shape();
    let mut nodes = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            let v = unsafe { grid.get_unchecked(row, col) };
            if v.is_nan() {
                continue;
            }
            let (x, y) = grid.cell_center(row, col);
            nodes.push(Node::new(x, y, v));
        }
    }
    nodes
}

/// Build a directed drainage graph over the given nodes.
///
/// Nodes are ranked by descending value; each connects by one edge to
/// the nearest strictly-lower node among those ranked below it. Edges
/// always point high → low; the globally lowest node gets no outgoing
/// edge. Equal-value nodes never connect to each other.
pub fn build_directed(nodes: Vec<Node>) -> StreamNetwork {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| {
        nodes[b]
            .value
            .partial_cmp(&nodes[a].value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut network = StreamNetwork::new(nodes);

    for pos in 0..order.len() {
        let i = order[pos];
        let mut best: Option<(usize, f64)> = None;

        for &j in &order[pos + 1..] {
            if network.nodes()[j].value >= network.nodes()[i].value {
                continue;
            }
            let d2 = network.nodes()[i].distance_sq(&network.nodes()[j]);
            match best {
                Some((_, best_d2)) if d2 >= best_d2 => {}
                _ => best = Some((j, d2)),
            }
        }

        if let Some((j, _)) = best {
            network.add_edge(i, j);
        }
    }
    network
}

/// Strahler order for every node of a drainage graph.
///
/// Source nodes get order 1; where two tributaries of equal order meet,
/// the order increments; otherwise the highest tributary order carries
/// through. Nodes are resolved from high value to low, so every inflow
/// is final before its receiver.
pub fn strahler_orders(network: &StreamNetwork) -> Vec<u32> {
    let n = network.node_count();
    let mut inflows: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in network.edges() {
        inflows[edge.to].push(edge.from);
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        network.nodes()[b]
            .value
            .partial_cmp(&network.nodes()[a].value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut result = vec![0u32; n];
    for &i in &order {
        if inflows[i].is_empty() {
            result[i] = 1;
            continue;
        }
        let mut max = 0u32;
        let mut max_count = 0usize;
        for &up in &inflows[i] {
            let o = result[up];
            if o > max {
                max = o;
                max_count = 1;
            } else if o == max {
                max_count += 1;
            }
        }
        result[i] = if max_count >= 2 { max + 1 } else { max };
    }
    result
}
