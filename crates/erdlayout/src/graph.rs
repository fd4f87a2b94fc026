//! Entity graph extraction.
//!
//! Turns an ordered entity list into the [`Graph`] the layout engines work on:
//! one [`Node`] per entity and one [`Edge`] per foreign-key column. Edges are
//! synthesized from column metadata and never stored on the entities.
//!
//! # Handles
//!
//! Every column exposes a left and a right [`Handle`] so an edge can be routed
//! to the exact row it belongs to. Handle ids have the form
//! `{entity}_{column}_{side}`; the referenced column is left through its right
//! handle and the referencing column is entered through its left handle.
//!
//! # Isolation
//!
//! [`partition`] is the single definition of "isolated": a node that is
//! neither the source nor the target of any edge in the given edge set.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use indexmap::{IndexMap, map::Entry};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use erdlayout_core::{
    geometry::{Bounds, Point, Size},
    schema::{Entity, row_offset},
};

/// Layout-time projection of an [`Entity`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    id: String,
    position: Point,
    size: Size,
    data: Entity,
}

impl Node {
    /// Projects an entity, seeding the position from its stored placement.
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.name.clone(),
            position: entity.position.unwrap_or_default(),
            size: entity.size(),
            data: entity.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// The entity this node was projected from, with `position` echoing the node.
    pub fn data(&self) -> &Entity {
        &self.data
    }

    /// Bounds of the node, treating `position` as its top-left corner.
    pub fn bounds(&self) -> Bounds {
        self.position.to_bounds(self.size)
    }

    /// Returns a new node placed at `position`.
    pub fn with_position(&self, position: Point) -> Self {
        let mut node = self.clone();
        node.position = position;
        node.data.position = Some(position);
        node
    }

    /// Returns a new node moved by `offset`.
    pub fn translated(&self, offset: Point) -> Self {
        self.with_position(self.position.add_point(offset))
    }

    /// Left and right handles of every column, in column order.
    pub fn handles(&self) -> Vec<Handle> {
        self.data
            .columns
            .iter()
            .enumerate()
            .flat_map(|(row, column)| {
                [Side::Left, Side::Right].map(|side| Handle {
                    id: handle_id(&self.id, &column.name, side),
                    side,
                    offset_y: row_offset(row),
                })
            })
            .collect()
    }
}

/// Side of a node a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Connection anchor on a node's perimeter, one per column and side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handle {
    pub id: String,
    pub side: Side,
    pub offset_y: f32,
}

/// Builds a handle id: `{entity}_{column}_{side}`.
pub fn handle_id(entity: &str, column: &str, side: Side) -> String {
    format!("{entity}_{column}_{side}")
}

/// A relationship from a referenced entity (`source`) to the referencing one (`target`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_handle: String,
    pub target_handle: String,
}

impl Edge {
    /// Synthesizes the edge for `entity.column -> referenced.referenced_column`.
    pub fn from_reference(
        entity: &str,
        column: &str,
        referenced: &str,
        referenced_column: &str,
    ) -> Self {
        let source_handle = handle_id(referenced, referenced_column, Side::Right);
        let target_handle = handle_id(entity, column, Side::Left);
        Self {
            id: format!("gen__{source_handle}_{target_handle}"),
            source: referenced.to_string(),
            target: entity.to_string(),
            source_handle,
            target_handle,
        }
    }

    /// The endpoints as an order-independent pair.
    fn unordered_pair(&self) -> (&str, &str) {
        if self.source <= self.target {
            (&self.source, &self.target)
        } else {
            (&self.target, &self.source)
        }
    }
}

/// Filter applied to edges sharing the same unordered endpoint pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgePairPolicy {
    /// Keep every edge.
    #[default]
    KeepAll,
    /// Keep an edge only when exactly 0 or exactly 2 edges share its pair.
    ///
    /// The count includes the edge itself, so single and triple references
    /// between two entities are dropped.
    ZeroOrTwo,
}

/// Nodes and edges extracted from an entity list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Extracts nodes and edges from `entities`.
    ///
    /// Entities with a name already seen are skipped. Edges whose endpoints
    /// do not both exist are dropped. Neither case is an error.
    pub fn from_entities(entities: &[Entity], policy: EdgePairPolicy) -> Self {
        let mut nodes: IndexMap<&str, Node> = IndexMap::with_capacity(entities.len());
        for entity in entities {
            match nodes.entry(entity.name.as_str()) {
                Entry::Occupied(_) => {
                    warn!(entity = entity.name; "Skipping entity with duplicate name");
                }
                Entry::Vacant(slot) => {
                    slot.insert(Node::from_entity(entity));
                }
            }
        }

        let mut edges = Vec::new();
        for node in nodes.values() {
            let entity = node.data();
            for column in &entity.columns {
                if let Some(foreign) = &column.foreign_to {
                    edges.push(Edge::from_reference(
                        &entity.name,
                        &column.name,
                        &foreign.name,
                        &foreign.column,
                    ));
                }
            }
        }

        edges.retain(|edge| {
            let known = nodes.contains_key(edge.source.as_str())
                && nodes.contains_key(edge.target.as_str());
            if !known {
                warn!(
                    edge_id = edge.id,
                    source = edge.source,
                    target = edge.target;
                    "Dropping edge that references an unknown entity"
                );
            }
            known
        });

        let edges = apply_pair_policy(edges, policy);

        debug!(
            node_count = nodes.len(),
            edge_count = edges.len();
            "Extracted entity graph"
        );

        Self {
            nodes: nodes.into_values().collect(),
            edges,
        }
    }

    /// Builds a graph from already extracted parts.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Replaces the nodes, keeping the edges.
    pub fn with_nodes(self, nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            edges: self.edges,
        }
    }
}

fn apply_pair_policy(edges: Vec<Edge>, policy: EdgePairPolicy) -> Vec<Edge> {
    match policy {
        EdgePairPolicy::KeepAll => edges,
        EdgePairPolicy::ZeroOrTwo => {
            let mut pair_counts: HashMap<(&str, &str), usize> = HashMap::new();
            for edge in &edges {
                *pair_counts.entry(edge.unordered_pair()).or_default() += 1;
            }
            let keep: Vec<bool> = edges
                .iter()
                .map(|edge| {
                    let count = pair_counts
                        .get(&edge.unordered_pair())
                        .copied()
                        .unwrap_or_default();
                    count == 0 || count == 2
                })
                .collect();

            let dropped = keep.iter().filter(|kept| !**kept).count();
            if dropped > 0 {
                debug!(dropped; "Edge pair policy removed edges");
            }

            edges
                .into_iter()
                .zip(keep)
                .filter_map(|(edge, kept)| kept.then_some(edge))
                .collect()
        }
    }
}

/// Ids of every node that appears as an endpoint of `edges`.
pub fn linked_ids(edges: &[Edge]) -> HashSet<&str> {
    edges
        .iter()
        .flat_map(|edge| [edge.source.as_str(), edge.target.as_str()])
        .collect()
}

/// Nodes split into isolated and connected populations, each in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub isolated: Vec<Node>,
    pub connected: Vec<Node>,
}

/// Splits `nodes` by whether they take part in any of `edges`.
pub fn partition(nodes: &[Node], edges: &[Edge]) -> Partition {
    let linked = linked_ids(edges);
    let (connected, isolated) = nodes
        .iter()
        .cloned()
        .partition(|node| linked.contains(node.id()));
    Partition {
        isolated,
        connected,
    }
}

/// Reassembles nodes laid out in separate passes, in the order of `original`.
///
/// Nodes of `original` missing from `laid_out` are kept as they were.
pub fn merge_by_id(original: &[Node], laid_out: impl IntoIterator<Item = Node>) -> Vec<Node> {
    let mut by_id: HashMap<String, Node> = laid_out
        .into_iter()
        .map(|node| (node.id.clone(), node))
        .collect();
    original
        .iter()
        .map(|node| by_id.remove(node.id()).unwrap_or_else(|| node.clone()))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use erdlayout_core::schema::{Column, Entity};

    use super::{Edge, Node};

    /// An entity with `columns` plain columns.
    pub fn entity(name: &str, columns: usize) -> Entity {
        (0..columns).fold(Entity::new(name), |entity, i| {
            entity.with_column(Column::new(format!("c{i}"), "int"))
        })
    }

    pub fn node(name: &str, columns: usize) -> Node {
        Node::from_entity(&entity(name, columns))
    }

    pub fn edge(source: &str, target: &str) -> Edge {
        Edge::from_reference(target, &format!("{source}_id"), source, "id")
    }
}

#[cfg(test)]
mod tests {
    use erdlayout_core::schema::Column;

    use super::{test_support::*, *};

    fn blog_schema() -> Vec<Entity> {
        vec![
            Entity::new("users")
                .with_column(Column::new("id", "int").primary_key())
                .with_column(Column::new("name", "text")),
            Entity::new("posts")
                .with_column(Column::new("id", "int").primary_key())
                .with_column(Column::new("author_id", "int").references("users", "id")),
            Entity::new("tags").with_column(Column::new("id", "int").primary_key()),
        ]
    }

    #[test]
    fn test_extract_nodes_and_edges() {
        let graph = Graph::from_entities(&blog_schema(), EdgePairPolicy::KeepAll);

        let ids: Vec<&str> = graph.nodes().iter().map(Node::id).collect();
        assert_eq!(ids, ["users", "posts", "tags"]);
        assert_eq!(graph.nodes()[0].size(), Size::new(320.0, 103.0));
        assert_eq!(graph.nodes()[2].size(), Size::new(320.0, 75.0));

        assert_eq!(graph.edges().len(), 1);
        let edge = &graph.edges()[0];
        assert_eq!(edge.source, "users");
        assert_eq!(edge.target, "posts");
        assert_eq!(edge.source_handle, "users_id_right");
        assert_eq!(edge.target_handle, "posts_author_id_left");
        assert_eq!(edge.id, "gen__users_id_right_posts_author_id_left");
    }

    #[test]
    fn test_dangling_edges_are_dropped() {
        let entities = vec![
            Entity::new("orders")
                .with_column(Column::new("customer_id", "int").references("customers", "id")),
        ];
        let graph = Graph::from_entities(&entities, EdgePairPolicy::KeepAll);

        assert_eq!(graph.nodes().len(), 1);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_duplicate_entities_keep_first() {
        let entities = vec![entity("a", 1), entity("a", 4), entity("b", 0)];
        let graph = Graph::from_entities(&entities, EdgePairPolicy::KeepAll);

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.nodes()[0].data().columns.len(), 1);
    }

    #[test]
    fn test_zero_or_two_pair_policy() {
        // a<->b has two edges (kept), a->c has one edge (dropped),
        // b->c has three edges (dropped).
        let entities = vec![
            Entity::new("a")
                .with_column(Column::new("id", "int"))
                .with_column(Column::new("b_id", "int").references("b", "id")),
            Entity::new("b")
                .with_column(Column::new("id", "int"))
                .with_column(Column::new("a_id", "int").references("a", "id")),
            Entity::new("c")
                .with_column(Column::new("a_id", "int").references("a", "id"))
                .with_column(Column::new("b1", "int").references("b", "id"))
                .with_column(Column::new("b2", "int").references("b", "id"))
                .with_column(Column::new("b3", "int").references("b", "id")),
        ];

        let all = Graph::from_entities(&entities, EdgePairPolicy::KeepAll);
        assert_eq!(all.edges().len(), 6);

        let filtered = Graph::from_entities(&entities, EdgePairPolicy::ZeroOrTwo);
        let pairs: Vec<(&str, &str)> = filtered
            .edges()
            .iter()
            .map(|edge| (edge.source.as_str(), edge.target.as_str()))
            .collect();
        assert_eq!(pairs, [("b", "a"), ("a", "b")]);
    }

    #[test]
    fn test_handles() {
        let node = node("users", 2);
        let handles = node.handles();

        assert_eq!(handles.len(), 4);
        assert_eq!(handles[0].id, "users_c0_left");
        assert_eq!(handles[1].id, "users_c0_right");
        assert_eq!(handles[0].offset_y, 47.0);
        assert_eq!(handles[3].id, "users_c1_right");
        assert_eq!(handles[3].offset_y, 75.0);
    }

    #[test]
    fn test_partition() {
        let nodes = vec![node("a", 1), node("b", 1), node("c", 1), node("d", 1)];
        let edges = vec![edge("a", "b"), edge("b", "c")];

        let parts = partition(&nodes, &edges);
        let connected: Vec<&str> = parts.connected.iter().map(Node::id).collect();
        let isolated: Vec<&str> = parts.isolated.iter().map(Node::id).collect();

        assert_eq!(connected, ["a", "b", "c"]);
        assert_eq!(isolated, ["d"]);
    }

    #[test]
    fn test_partition_without_edges_is_all_isolated() {
        let nodes = vec![node("a", 1)];
        let parts = partition(&nodes, &[]);
        assert_eq!(parts.isolated.len(), 1);
        assert!(parts.connected.is_empty());
    }

    #[test]
    fn test_with_position_echoes_into_data() {
        let moved = node("a", 1).with_position(Point::new(5.0, 6.0));
        assert_eq!(moved.position(), Point::new(5.0, 6.0));
        assert_eq!(moved.data().position, Some(Point::new(5.0, 6.0)));
    }

    #[test]
    fn test_merge_by_id_preserves_original_order() {
        let original = vec![node("a", 1), node("b", 1), node("c", 1)];
        let laid_out = vec![
            original[2].with_position(Point::new(3.0, 0.0)),
            original[0].with_position(Point::new(1.0, 0.0)),
        ];

        let merged = merge_by_id(&original, laid_out);
        let xs: Vec<f32> = merged.iter().map(|n| n.position().x()).collect();
        assert_eq!(xs, [1.0, 0.0, 3.0]);
    }

    #[test]
    fn test_serialized_edge_uses_camel_case() {
        let json = serde_json::to_value(edge("a", "b")).expect("serializable");
        assert_eq!(json["sourceHandle"], "a_id_right");
        assert_eq!(json["targetHandle"], "b_a_id_left");
    }
}
