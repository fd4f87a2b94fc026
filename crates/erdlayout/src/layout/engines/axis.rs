//! Single-axis layout engines
//!
//! - [`Axis::X`] lines nodes up left to right. Every step is the width of the
//!   first node plus the offset, so spacing is uniform.
//! - [`Axis::Y`] stacks nodes top to bottom. Every step is the node's own
//!   height plus the offset, so tall entities never overlap the next one.
//!
//! In both cases the run is centred on the configured centre along its axis
//! and positions are top-left corners.

use serde::Deserialize;

use erdlayout_core::geometry::Point;

use crate::graph::{Edge, Node};

/// Direction nodes are laid along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Single-axis layout options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Minimum gap between consecutive nodes, floored at 0
    pub offset: f32,
    pub center_x: f32,
    pub center_y: f32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            offset: 20.0,
            center_x: 400.0,
            center_y: 300.0,
        }
    }
}

/// Single-axis layout engine
#[derive(Debug, Clone)]
pub struct Engine {
    axis: Axis,
    options: Options,
}

impl Engine {
    /// Engine laying nodes out along the X axis
    pub fn horizontal(options: Options) -> Self {
        Self {
            axis: Axis::X,
            options,
        }
    }

    /// Engine stacking nodes along the Y axis
    pub fn vertical(options: Options) -> Self {
        Self {
            axis: Axis::Y,
            options,
        }
    }

    /// Set the gap between consecutive nodes
    pub fn set_offset(&mut self, offset: f32) -> &mut Self {
        self.options.offset = offset;
        self
    }

    /// Set the centre the run is aligned on
    pub fn set_center(&mut self, center: Point) -> &mut Self {
        self.options.center_x = center.x();
        self.options.center_y = center.y();
        self
    }

    fn offset(&self) -> f32 {
        self.options.offset.max(0.0)
    }

    fn layout_x(&self, nodes: &[Node]) -> Vec<Node> {
        let pitch = nodes[0].size().width() + self.offset();
        let span = pitch * nodes.len() as f32 - self.offset();
        let start = self.options.center_x - span / 2.0;

        nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                node.with_position(Point::new(
                    start + i as f32 * pitch,
                    self.options.center_y,
                ))
            })
            .collect()
    }

    fn layout_y(&self, nodes: &[Node]) -> Vec<Node> {
        let offset = self.offset();
        let span = nodes.iter().map(|node| node.size().height()).sum::<f32>()
            + offset * (nodes.len() - 1) as f32;

        let mut y = self.options.center_y - span / 2.0;
        nodes
            .iter()
            .map(|node| {
                let placed = node.with_position(Point::new(self.options.center_x, y));
                y += node.size().height() + offset;
                placed
            })
            .collect()
    }
}

impl super::Engine for Engine {
    fn calculate(&self, nodes: &[Node], _edges: &[Edge]) -> Vec<Node> {
        if nodes.is_empty() {
            return nodes.to_vec();
        }
        match self.axis {
            Axis::X => self.layout_x(nodes),
            Axis::Y => self.layout_y(nodes),
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::{
        graph::test_support::{entity, node},
        layout::engines::Engine as _,
    };

    #[test]
    fn test_empty_input() {
        let options = Options::default();
        assert!(Engine::horizontal(options.clone()).calculate(&[], &[]).is_empty());
        assert!(Engine::vertical(options).calculate(&[], &[]).is_empty());
    }

    #[test]
    fn test_y_gaps_follow_own_heights() {
        // Heights 75, 131, 103
        let nodes = vec![node("a", 1), node("b", 3), node("c", 2)];
        let mut engine = Engine::vertical(Options::default());
        engine.set_offset(20.0);
        let laid_out = engine.calculate(&nodes, &[]);

        let ys: Vec<f32> = laid_out.iter().map(|node| node.position().y()).collect();
        assert!(ys[1] - ys[0] >= 95.0);
        assert!(ys[2] - ys[1] >= 151.0);
        assert_approx_eq!(f32, ys[1] - ys[0], 95.0);
        assert_approx_eq!(f32, ys[2] - ys[1], 151.0);

        // Stack of 75 + 131 + 103 + 2 * 20 = 349 centred on 300
        assert_approx_eq!(f32, ys[0], 300.0 - 349.0 / 2.0);
        assert!(laid_out.iter().all(|node| node.position().x() == 400.0));
    }

    #[test]
    fn test_y_negative_offset_is_floored() {
        let nodes = vec![node("a", 1), node("b", 1)];
        let mut engine = Engine::vertical(Options::default());
        engine.set_offset(-50.0);
        let laid_out = engine.calculate(&nodes, &[]);

        assert_approx_eq!(
            f32,
            laid_out[1].position().y() - laid_out[0].position().y(),
            75.0
        );
    }

    #[test]
    fn test_x_uses_first_width_as_pitch() {
        let nodes = vec![
            Node::from_entity(&entity("wide", 1).with_width(100.0)),
            Node::from_entity(&entity("narrow", 1).with_width(500.0)),
            node("plain", 1),
        ];
        let mut engine = Engine::horizontal(Options::default());
        engine.set_offset(10.0).set_center(Point::new(0.0, 50.0));
        let laid_out = engine.calculate(&nodes, &[]);

        let xs: Vec<f32> = laid_out.iter().map(|node| node.position().x()).collect();
        // Span 3 * 110 - 10 = 320 centred on 0
        assert_eq!(xs, [-160.0, -50.0, 60.0]);
        assert!(laid_out.iter().all(|node| node.position().y() == 50.0));
    }

    #[test]
    fn test_single_node_is_centred() {
        let laid_out = Engine::horizontal(Options::default()).calculate(&[node("a", 2)], &[]);
        assert_eq!(laid_out[0].position(), Point::new(240.0, 300.0));
    }
}
