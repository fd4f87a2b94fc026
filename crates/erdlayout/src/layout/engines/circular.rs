//! Circular layout engine
//!
//! Connected nodes are spread evenly on a circle, starting at the top and
//! going clockwise in input order. Isolated nodes do not take a slot on the
//! circle. They are arranged on their own and moved above it.

use std::f32::consts::{FRAC_PI_2, TAU};

use log::debug;
use serde::Deserialize;

use erdlayout_core::{geometry::Point, schema::DEFAULT_WIDTH};

use crate::{
    graph::{Edge, Node, Partition, merge_by_id, partition},
    layout::engines::{Engine as _, axis, grid, place_above},
};

/// Smallest radius chosen when none is configured.
pub const MIN_AUTO_RADIUS: f32 = 200.0;

/// How isolated nodes are arranged above the circle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolatedArrangement {
    /// Grid packing
    #[default]
    Box,
    /// Single row
    Row,
}

/// Circular layout options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Circle radius, derived from the node count when unset
    pub radius: Option<f32>,
    pub center_x: f32,
    pub center_y: f32,
    pub isolated_arrangement: IsolatedArrangement,
    /// Vertical gap between the isolated block and the top of the circle
    pub isolated_gap: f32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            radius: None,
            center_x: 400.0,
            center_y: 300.0,
            isolated_arrangement: IsolatedArrangement::default(),
            isolated_gap: 100.0,
        }
    }
}

/// Circular layout engine
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: Options,
}

impl Engine {
    /// Create a new circular layout engine
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Set a fixed radius
    pub fn set_radius(&mut self, radius: f32) -> &mut Self {
        self.options.radius = Some(radius);
        self
    }

    /// Set how isolated nodes are arranged
    pub fn set_isolated_arrangement(&mut self, arrangement: IsolatedArrangement) -> &mut Self {
        self.options.isolated_arrangement = arrangement;
        self
    }

    fn center(&self) -> Point {
        Point::new(self.options.center_x, self.options.center_y)
    }

    /// Configured radius, or one that leaves room for `count` default-width nodes.
    fn radius(&self, count: usize) -> f32 {
        match self.options.radius {
            Some(radius) if radius.is_finite() && radius >= 0.0 => radius,
            _ => (count as f32 * DEFAULT_WIDTH / TAU).max(MIN_AUTO_RADIUS),
        }
    }

    fn arrange_isolated(&self, isolated: &[Node]) -> Vec<Node> {
        match self.options.isolated_arrangement {
            IsolatedArrangement::Box => grid::Engine::new(grid::Options {
                center_x: self.options.center_x,
                center_y: self.options.center_y,
                ..Default::default()
            })
            .calculate(isolated, &[]),
            IsolatedArrangement::Row => axis::Engine::horizontal(axis::Options {
                center_x: self.options.center_x,
                center_y: self.options.center_y,
                ..Default::default()
            })
            .calculate(isolated, &[]),
        }
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

        let radius = self.radius(connected.len());
        let on_circle = place_on_circle(&connected, self.center(), radius);

        let circle_top = self.options.center_y - radius;
        let isolated = place_above(
            &self.arrange_isolated(&isolated),
            circle_top,
            self.options.isolated_gap,
        );

        debug!(
            radius,
            connected_count = on_circle.len(),
            isolated_count = isolated.len();
            "Circular layout calculated"
        );

        merge_by_id(nodes, on_circle.into_iter().chain(isolated))
    }
}

/// Places every node of `nodes` on a circle, the first one at the top.
///
/// Node `i` of `n` sits at angle `i * 2π/n - π/2`.
pub fn place_on_circle(nodes: &[Node], center: Point, radius: f32) -> Vec<Node> {
    let step = TAU / nodes.len().max(1) as f32;
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let angle = i as f32 * step - FRAC_PI_2;
            let offset = Point::new(angle.cos(), angle.sin()).scale(radius);
            node.with_position(center.add_point(offset))
        })
        .collect()
}
