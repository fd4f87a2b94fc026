//! Layout engine factory module
//!
//! This module selects and runs one of the layout strategies based on a
//! [`LayoutKind`]. Engines are created on first use with the configured
//! options and cached per kind by the [`EngineBuilder`].
//!
//! The builder can optionally split the nodes into isolated and connected
//! populations, lay each out on its own and merge the results back in the
//! caller's order, with the isolated block placed above the connected one.

pub mod axis;
pub mod circular;
pub mod force;
pub mod grid;
pub mod hierarchical;
pub mod linear;

use std::{collections::HashMap, fmt, str::FromStr};

use log::{debug, info};
use serde::Deserialize;

use erdlayout_core::geometry::{Bounds, Point};

use crate::{
    config::LayoutConfig,
    graph::{Edge, Graph, Node, Partition, merge_by_id, partition},
};

/// Available layout strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    /// Keep every entity at its stored position
    Linear,
    Circular,
    #[default]
    Hierarchical,
    ForceDirected,
    /// Single row, left to right
    X,
    /// Single column, top to bottom
    Y,
    /// Grid packing
    Box,
}

impl FromStr for LayoutKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "circular" => Ok(Self::Circular),
            "hierarchical" => Ok(Self::Hierarchical),
            "force-directed" => Ok(Self::ForceDirected),
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "box" => Ok(Self::Box),
            _ => Err("Unsupported layout kind"),
        }
    }
}

impl From<LayoutKind> for &'static str {
    fn from(val: LayoutKind) -> Self {
        match val {
            LayoutKind::Linear => "linear",
            LayoutKind::Circular => "circular",
            LayoutKind::Hierarchical => "hierarchical",
            LayoutKind::ForceDirected => "force-directed",
            LayoutKind::X => "x",
            LayoutKind::Y => "y",
            LayoutKind::Box => "box",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// Interface shared by all layout strategies.
pub trait Engine {
    /// Computes positions for `nodes`.
    ///
    /// - `nodes`: The nodes to place. They are not modified; new nodes are returned
    ///   in the same order.
    /// - `edges`: Relationships between the nodes. Strategies that ignore
    ///   relationships accept any edge set.
    fn calculate(&self, nodes: &[Node], edges: &[Edge]) -> Vec<Node>;
}

/// Builder for creating, configuring and dispatching layout engines.
pub struct EngineBuilder {
    // Cache for reusing engines of the same kind
    engines: HashMap<LayoutKind, Box<dyn Engine>>,

    hierarchical: hierarchical::Options,
    force: force::Options,
    circular: circular::Options,
    axis: axis::Options,
    grid: grid::Options,

    split_isolated: bool,
    isolated_gap: f32,
}

impl EngineBuilder {
    /// Create a new engine builder with default options for every strategy
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
            hierarchical: hierarchical::Options::default(),
            force: force::Options::default(),
            circular: circular::Options::default(),
            axis: axis::Options::default(),
            grid: grid::Options::default(),
            split_isolated: false,
            isolated_gap: DEFAULT_ISOLATED_GAP,
        }
    }

    /// Create an engine builder from a layout configuration section
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new()
            .with_hierarchical(config.hierarchical().clone())
            .with_force(config.force().clone())
            .with_circular(config.circular().clone())
            .with_axis(config.axis().clone())
            .with_grid(config.grid().clone())
            .with_split_isolated(config.split_isolated())
            .with_isolated_gap(config.isolated_gap())
    }

    /// Set the options of the hierarchical engine
    pub fn with_hierarchical(mut self, options: hierarchical::Options) -> Self {
        self.hierarchical = options;
        self
    }

    /// Set the options of the force-directed engine
    pub fn with_force(mut self, options: force::Options) -> Self {
        self.force = options;
        self
    }

    /// Set the options of the circular engine
    pub fn with_circular(mut self, options: circular::Options) -> Self {
        self.circular = options;
        self
    }

    /// Set the options shared by the X and Y engines
    pub fn with_axis(mut self, options: axis::Options) -> Self {
        self.axis = options;
        self
    }

    /// Set the options of the box engine
    pub fn with_grid(mut self, options: grid::Options) -> Self {
        self.grid = options;
        self
    }

    /// Lay out isolated and connected nodes in separate passes
    pub fn with_split_isolated(mut self, split: bool) -> Self {
        self.split_isolated = split;
        self
    }

    /// Set the vertical gap between the isolated block and the connected block
    pub fn with_isolated_gap(mut self, gap: f32) -> Self {
        self.isolated_gap = gap;
        self
    }

    /// Get an engine of the specified kind with configured options
    pub fn engine(&mut self, kind: LayoutKind) -> &dyn Engine {
        let engine = self.engines.entry(kind).or_insert_with(|| {
            let engine: Box<dyn Engine> = match kind {
                LayoutKind::Linear => Box::new(linear::Engine::new()),
                LayoutKind::Circular => Box::new(circular::Engine::new(self.circular.clone())),
                LayoutKind::Hierarchical => {
                    Box::new(hierarchical::Engine::new(self.hierarchical.clone()))
                }
                LayoutKind::ForceDirected => Box::new(force::Engine::new(self.force.clone())),
                LayoutKind::X => Box::new(axis::Engine::horizontal(self.axis.clone())),
                LayoutKind::Y => Box::new(axis::Engine::vertical(self.axis.clone())),
                LayoutKind::Box => Box::new(grid::Engine::new(self.grid.clone())),
            };
            engine
        });
        // Dereference to avoid returning reference to temporary
        &**engine
    }

    /// Lay out `nodes` with the engine of the given kind.
    pub fn layout(&mut self, kind: LayoutKind, nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
        if nodes.is_empty() {
            return Vec::new();
        }

        let split = self.split_isolated && kind != LayoutKind::Linear;
        let gap = self.isolated_gap;
        let engine = self.engine(kind);

        if !split {
            return engine.calculate(nodes, edges);
        }

        let Partition {
            isolated,
            connected,
        } = partition(nodes, edges);
        debug!(
            kind:% = kind,
            isolated_count = isolated.len(),
            connected_count = connected.len();
            "Laying out isolated and connected nodes separately"
        );

        let connected = engine.calculate(&connected, edges);
        let isolated = engine.calculate(&isolated, &[]);
        let isolated = match top_edge(&connected) {
            Some(top) => place_above(&isolated, top, gap),
            None => isolated,
        };

        merge_by_id(nodes, connected.into_iter().chain(isolated))
    }

    /// Lay out the nodes of `graph`, keeping its edges.
    pub fn build(mut self, kind: LayoutKind, graph: Graph) -> Graph {
        info!(kind:% = kind, node_count = graph.nodes().len(); "Calculating layout");
        let nodes = self.layout(kind, graph.nodes(), graph.edges());
        graph.with_nodes(nodes)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Default vertical gap between an isolated block and the block below it.
pub const DEFAULT_ISOLATED_GAP: f32 = 100.0;

/// X of slot `index` in a row of `count` slots `spacing` apart, centred on `center`.
pub(crate) fn centered_slot(center: f32, count: usize, index: usize, spacing: f32) -> f32 {
    center - (count.saturating_sub(1) as f32) * spacing / 2.0 + index as f32 * spacing
}

/// Smallest top-left y among `nodes`.
pub(crate) fn top_edge(nodes: &[Node]) -> Option<f32> {
    nodes.iter().map(|node| node.position().y()).reduce(f32::min)
}

/// Moves `nodes` vertically so their lowest edge sits `gap` above `top`.
pub(crate) fn place_above(nodes: &[Node], top: f32, gap: f32) -> Vec<Node> {
    let Some(bounds) = Bounds::enclosing(nodes.iter().map(|node| (node.position(), node.size())))
    else {
        return Vec::new();
    };
    let offset = Point::new(0.0, top - gap - bounds.max_y());
    nodes.iter().map(|node| node.translated(offset)).collect()
}
