//! Box layout engine
//!
//! Packs nodes row-major into a roughly square grid of `ceil(sqrt(n))`
//! columns. Within a row nodes keep their own widths and are separated by
//! `offset_x`, and every row is centred horizontally.
//!
//! Vertically there are two modes. By default every row is as tall as its
//! tallest node and rows are `offset_y` apart. In compact mode each column
//! stacks on its own, so a short node does not leave a hole below it.

use log::debug;
use serde::Deserialize;

use erdlayout_core::geometry::Point;

use crate::graph::{Edge, Node};

/// Box layout options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    pub offset_x: f32,
    pub offset_y: f32,
    pub center_x: f32,
    pub center_y: f32,
    /// Stack each column independently
    pub compact: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            offset_x: 200.0,
            offset_y: 150.0,
            center_x: 400.0,
            center_y: 300.0,
            compact: false,
        }
    }
}

/// Box layout engine
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: Options,
}

impl Engine {
    /// Create a new box layout engine
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Set the horizontal and vertical gaps between nodes
    pub fn set_offsets(&mut self, offset_x: f32, offset_y: f32) -> &mut Self {
        self.options.offset_x = offset_x;
        self.options.offset_y = offset_y;
        self
    }

    /// Switch between uniform rows and independent columns
    pub fn set_compact(&mut self, compact: bool) -> &mut Self {
        self.options.compact = compact;
        self
    }

    /// X of every node, each row centred on `center_x`.
    fn row_xs(&self, nodes: &[Node], cols: usize) -> Vec<f32> {
        let offset_x = self.options.offset_x;
        nodes
            .chunks(cols)
            .flat_map(|row| {
                let row_width = row.iter().map(|node| node.size().width()).sum::<f32>()
                    + offset_x * (row.len() - 1) as f32;
                let mut x = self.options.center_x - row_width / 2.0;
                row.iter()
                    .map(|node| {
                        let current = x;
                        x += node.size().width() + offset_x;
                        current
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Y of every node with rows as tall as their tallest node.
    fn uniform_ys(&self, nodes: &[Node], cols: usize) -> Vec<f32> {
        let offset_y = self.options.offset_y;
        let row_heights: Vec<f32> = nodes
            .chunks(cols)
            .map(|row| {
                row.iter()
                    .map(|node| node.size().height())
                    .fold(0.0, f32::max)
            })
            .collect();
        let total = row_heights.iter().sum::<f32>()
            + offset_y * row_heights.len().saturating_sub(1) as f32;

        let mut row_y = self.options.center_y - total / 2.0;
        let mut ys = Vec::with_capacity(nodes.len());
        for (row, height) in nodes.chunks(cols).zip(&row_heights) {
            ys.extend(std::iter::repeat_n(row_y, row.len()));
            row_y += height + offset_y;
        }
        ys
    }

    /// Y of every node with each column stacked independently.
    fn compact_ys(&self, nodes: &[Node], cols: usize) -> Vec<f32> {
        let offset_y = self.options.offset_y;
        let mut column_heights = vec![0.0f32; cols];
        let ys: Vec<f32> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let column = &mut column_heights[i % cols];
                let y = *column;
                *column += node.size().height() + offset_y;
                y
            })
            .collect();

        let tallest = column_heights.iter().copied().fold(0.0, f32::max) - offset_y;
        let top = self.options.center_y - tallest / 2.0;
        ys.into_iter().map(|y| top + y).collect()
    }
}

impl super::Engine for Engine {
    fn calculate(&self, nodes: &[Node], _edges: &[Edge]) -> Vec<Node> {
        if nodes.is_empty() {
            return nodes.to_vec();
        }

        let cols = (nodes.len() as f64).sqrt().ceil() as usize;
        let rows = nodes.len().div_ceil(cols);
        debug!(cols, rows, compact = self.options.compact; "Box layout grid");

        let xs = self.row_xs(nodes, cols);
        let ys = if self.options.compact {
            self.compact_ys(nodes, cols)
        } else {
            self.uniform_ys(nodes, cols)
        };

        nodes
            .iter()
            .zip(xs.into_iter().zip(ys))
            .map(|(node, (x, y))| node.with_position(Point::new(x, y)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::{graph::test_support::node, layout::engines::Engine as _};

    #[test]
    fn test_empty_input() {
        assert!(Engine::default().calculate(&[], &[]).is_empty());
    }

    #[test]
    fn test_single_node_centred() {
        let laid_out = Engine::default().calculate(&[node("a", 1)], &[]);
        // 320 x 75 centred on (400, 300)
        assert_eq!(laid_out[0].position(), Point::new(240.0, 262.5));
    }

    #[test]
    fn test_five_nodes_use_three_columns() {
        let nodes: Vec<Node> = (0..5).map(|i| node(&format!("n{i}"), 1)).collect();
        let mut engine = Engine::default();
        engine.set_offsets(10.0, 20.0);
        let laid_out = engine.calculate(&nodes, &[]);

        let ys: Vec<f32> = laid_out.iter().map(|node| node.position().y()).collect();
        // Two rows of 75 with a 20 gap, 170 tall in total
        assert_eq!(ys, [215.0, 215.0, 215.0, 310.0, 310.0]);

        // First row spans 3 * 320 + 2 * 10, second 2 * 320 + 10
        assert_eq!(laid_out[0].position().x(), 400.0 - 490.0);
        assert_eq!(laid_out[3].position().x(), 400.0 - 325.0);
        assert_eq!(laid_out[4].position().x(), 400.0 - 325.0 + 330.0);
    }

    #[test]
    fn test_rows_take_tallest_height() {
        // Two columns: short/tall on the first row
        let nodes = vec![node("short", 1), node("tall", 5), node("next", 1)];
        let mut engine = Engine::default();
        engine.set_offsets(0.0, 10.0);
        let laid_out = engine.calculate(&nodes, &[]);

        let gap = laid_out[2].position().y() - laid_out[0].position().y();
        assert_approx_eq!(f32, gap, 187.0 + 10.0);
    }

    #[test]
    fn test_compact_columns_stack_independently() {
        let nodes = vec![node("short", 1), node("tall", 5), node("next", 1)];
        let mut engine = Engine::default();
        engine.set_offsets(0.0, 10.0).set_compact(true);
        let laid_out = engine.calculate(&nodes, &[]);

        // "next" sits right below "short", not below the tall row
        let gap = laid_out[2].position().y() - laid_out[0].position().y();
        assert_approx_eq!(f32, gap, 75.0 + 10.0);

        // Tallest column is the single 187 high node, centred on 300
        assert_approx_eq!(f32, laid_out[1].position().y(), 300.0 - 93.5);
        assert_eq!(laid_out[0].position().y(), laid_out[1].position().y());
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{
        graph::test_support::{entity, node},
        layout::engines::Engine as _,
    };

    fn nodes_strategy() -> impl Strategy<Value = Vec<Node>> {
        prop::collection::vec((0usize..12, prop::option::of(80.0f32..600.0)), 1..30).prop_map(
            |specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (cols, width))| match width {
                        Some(width) => {
                            Node::from_entity(&entity(&format!("n{i}"), cols).with_width(width))
                        }
                        None => node(&format!("n{i}"), cols),
                    })
                    .collect()
            },
        )
    }

    /// Nodes of a row never overlap and consecutive rows keep at least `offset_y` apart.
    fn check_rows_do_not_overlap(
        nodes: Vec<Node>,
        offset_x: f32,
        offset_y: f32,
    ) -> Result<(), TestCaseError> {
        let mut engine = Engine::default();
        engine.set_offsets(offset_x, offset_y);
        let laid_out = engine.calculate(&nodes, &[]);
        let cols = (nodes.len() as f64).sqrt().ceil() as usize;

        let rows: Vec<&[Node]> = laid_out.chunks(cols).collect();
        for row in &rows {
            for pair in row.windows(2) {
                prop_assert!(pair[1].bounds().min_x() >= pair[0].bounds().max_x() - 1e-3);
            }
        }
        for pair in rows.windows(2) {
            let bottom = pair[0]
                .iter()
                .map(|node| node.bounds().max_y())
                .fold(f32::MIN, f32::max);
            let top = pair[1]
                .iter()
                .map(|node| node.bounds().min_y())
                .fold(f32::MAX, f32::min);
            prop_assert!(top - bottom >= offset_y - 1e-2);
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn rows_do_not_overlap(
            nodes in nodes_strategy(),
            offset_x in 0.0f32..300.0,
            offset_y in 0.0f32..300.0,
        ) {
            check_rows_do_not_overlap(nodes, offset_x, offset_y)?;
        }
    }
}
