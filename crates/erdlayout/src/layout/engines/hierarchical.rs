//! Hierarchical (layered) layout engine
//!
//! Connected nodes are assigned a level from the depth of their predecessor
//! chain and placed in horizontal rows, one row per level, growing downward.
//! Isolated nodes are arranged in a centred grid above the topmost row.
//!
//! A node's level is `1 + max(level of its direct predecessors)`, or `0` when
//! it has none. A predecessor that is still being resolved (a cycle) counts as
//! level `0`, so cyclic schemas terminate without special handling.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, trace};
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};
use serde::Deserialize;

use erdlayout_core::geometry::Point;

use crate::{
    graph::{Edge, Node, Partition, merge_by_id, partition},
    layout::engines::centered_slot,
};

/// Y of the level-0 row.
pub const LAYER_ORIGIN_Y: f32 = 200.0;

/// Hierarchical layout options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Horizontal distance between node centres within a row
    pub node_spacing: f32,
    /// Vertical distance between consecutive levels
    pub level_spacing: f32,
    pub center_x: f32,
    pub isolated_nodes_per_row: usize,
    /// Horizontal distance between isolated nodes, `node_spacing` when unset
    pub isolated_node_spacing: Option<f32>,
    pub isolated_row_spacing: f32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            node_spacing: 200.0,
            level_spacing: 150.0,
            center_x: 400.0,
            isolated_nodes_per_row: 5,
            isolated_node_spacing: None,
            isolated_row_spacing: 120.0,
        }
    }
}

/// Hierarchical layout engine
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: Options,
}

impl Engine {
    /// Create a new hierarchical layout engine
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Set how many isolated nodes share a row
    pub fn set_isolated_nodes_per_row(&mut self, per_row: usize) -> &mut Self {
        self.options.isolated_nodes_per_row = per_row;
        self
    }

    fn isolated_node_spacing(&self) -> f32 {
        self.options
            .isolated_node_spacing
            .unwrap_or(self.options.node_spacing)
    }

    /// Place connected nodes in level rows
    fn place_levels(&self, connected: &[Node], edges: &[Edge]) -> Vec<Node> {
        let levels = assign_levels(connected, edges);

        let mut rows: BTreeMap<usize, Vec<&Node>> = BTreeMap::new();
        for (node, level) in connected.iter().zip(levels) {
            rows.entry(level).or_default().push(node);
        }
        debug!(level_count = rows.len(); "Assigned levels");

        rows.iter()
            .flat_map(|(&level, row)| {
                let y = LAYER_ORIGIN_Y + level as f32 * self.options.level_spacing;
                row.iter().enumerate().map(move |(i, node)| {
                    let x = centered_slot(
                        self.options.center_x,
                        row.len(),
                        i,
                        self.options.node_spacing,
                    );
                    node.with_position(Point::new(x, y))
                })
            })
            .collect()
    }

    /// Place isolated nodes in a grid whose lowest row is at `lowest_row_y`
    fn place_isolated(&self, isolated: &[Node], lowest_row_y: f32) -> Vec<Node> {
        let per_row = self.options.isolated_nodes_per_row.max(1);
        let row_count = isolated.len().div_ceil(per_row);
        let spacing = self.isolated_node_spacing();

        isolated
            .chunks(per_row)
            .enumerate()
            .flat_map(|(row, chunk)| {
                let rows_below = (row_count - 1 - row) as f32;
                let y = lowest_row_y - rows_below * self.options.isolated_row_spacing;
                chunk.iter().enumerate().map(move |(col, node)| {
                    let x = centered_slot(self.options.center_x, chunk.len(), col, spacing);
                    node.with_position(Point::new(x, y))
                })
            })
            .collect()
    }
}

impl super::Engine for Engine {
    fn calculate(&self, nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
        if nodes.is_empty() {
            return nodes.to_vec();
        }

        let Partition {
            isolated,
            connected,
        } = partition(nodes, edges);

        let placed = self.place_levels(&connected, edges);

        // Isolated rows end one level above the topmost connected row
        let lowest_isolated_y = placed
            .iter()
            .map(|node| node.position().y())
            .reduce(f32::min)
            .map_or(LAYER_ORIGIN_Y, |top| top - self.options.level_spacing);
        let isolated = self.place_isolated(&isolated, lowest_isolated_y);

        debug!(
            connected_count = placed.len(),
            isolated_count = isolated.len();
            "Hierarchical layout calculated"
        );

        merge_by_id(nodes, placed.into_iter().chain(isolated))
    }
}

/// Level of every node in `nodes`, in the same order.
///
/// Only edges between two of `nodes` are considered.
pub fn assign_levels(nodes: &[Node], edges: &[Edge]) -> Vec<usize> {
    let mut graph = DiGraph::<&str, ()>::with_capacity(nodes.len(), edges.len());
    let indices: HashMap<&str, NodeIndex> = nodes
        .iter()
        .map(|node| (node.id(), graph.add_node(node.id())))
        .collect();

    for edge in edges {
        if let (Some(&source), Some(&target)) = (
            indices.get(edge.source.as_str()),
            indices.get(edge.target.as_str()),
        ) {
            graph.add_edge(source, target, ());
        }
    }

    let mut levels = vec![None; graph.node_count()];
    for start in graph.node_indices() {
        resolve_level(&graph, start, &mut levels);
    }

    levels
        .into_iter()
        .map(|level| level.unwrap_or_default())
        .collect()
}

/// One pending node of the depth-first walk.
struct Frame {
    node: NodeIndex,
    predecessors: Vec<NodeIndex>,
    next: usize,
    deepest: Option<usize>,
}

impl Frame {
    fn new(graph: &DiGraph<&str, ()>, node: NodeIndex) -> Self {
        Self {
            node,
            predecessors: graph.neighbors_directed(node, Direction::Incoming).collect(),
            next: 0,
            deepest: None,
        }
    }
}

/// Resolves the level of `start` and every unresolved ancestor, memoizing into `levels`.
fn resolve_level(
    graph: &DiGraph<&str, ()>,
    start: NodeIndex,
    levels: &mut [Option<usize>],
) {
    if levels[start.index()].is_some() {
        return;
    }

    let mut visiting = HashSet::from([start]);
    let mut stack = vec![Frame::new(graph, start)];

    while let Some(frame) = stack.last_mut() {
        if let Some(&predecessor) = frame.predecessors.get(frame.next) {
            frame.next += 1;

            let known = match levels[predecessor.index()] {
                Some(level) => Some(level),
                None if visiting.contains(&predecessor) => {
                    trace!(node = graph[predecessor]; "Cycle detected, counting as level 0");
                    Some(0)
                }
                None => None,
            };

            match known {
                Some(level) => frame.deepest = frame.deepest.max(Some(level)),
                None => {
                    visiting.insert(predecessor);
                    stack.push(Frame::new(graph, predecessor));
                }
            }
        } else {
            let node = frame.node;
            let level = frame.deepest.map_or(0, |deepest| deepest + 1);
            stack.pop();
            visiting.remove(&node);
            levels[node.index()] = Some(level);

            if let Some(parent) = stack.last_mut() {
                parent.deepest = parent.deepest.max(Some(level));
            }
        }
    }
}
