//! Linear layout engine
//!
//! Keeps every entity where it was last placed. Entities without a stored
//! position go to the origin.

use erdlayout_core::geometry::Point;

use crate::graph::{Edge, Node};

/// Layout engine that restores stored positions
#[derive(Debug, Clone, Default)]
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Self
    }
}

impl super::Engine for Engine {
    fn calculate(&self, nodes: &[Node], _edges: &[Edge]) -> Vec<Node> {
        nodes
            .iter()
            .map(|node| node.with_position(node.data().position.unwrap_or(Point::default())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::test_support::{edge, entity, node},
        layout::engines::Engine as _,
    };

    #[test]
    fn test_stored_positions_are_kept() {
        let nodes = vec![
            Node::from_entity(&entity("a", 1).with_position(Point::new(-20.0, 35.5))),
            node("b", 2),
        ];
        let laid_out = Engine::new().calculate(&nodes, &[edge("a", "b")]);

        assert_eq!(laid_out[0].position(), Point::new(-20.0, 35.5));
        assert_eq!(laid_out[1].position(), Point::default());
        assert_eq!(laid_out[1].data().position, Some(Point::default()));
    }

    #[test]
    fn test_empty_input() {
        assert!(Engine::new().calculate(&[], &[]).is_empty());
    }
}
