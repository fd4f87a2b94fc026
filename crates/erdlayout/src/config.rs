//! Configuration types for erdlayout.
//!
//! This module provides the configuration structures that control which
//! layout strategy runs and how each strategy spaces its nodes. All types
//! implement [`serde::Deserialize`] and every field has a default, so a
//! configuration file only needs to name what it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration.
//! - [`LayoutConfig`] - Strategy selection, isolated-node handling, the edge
//!   pair policy and the per-strategy option sections.
//!
//! # Example
//!
//! ```
//! # use erdlayout::{config::AppConfig, layout::LayoutKind};
//! let config = AppConfig::default();
//! assert_eq!(config.layout().engine(), LayoutKind::Hierarchical);
//! ```

use serde::Deserialize;

use crate::{
    graph::EdgePairPolicy,
    layout::{DEFAULT_ISOLATED_GAP, LayoutKind, axis, circular, force, grid, hierarchical},
};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the given layout configuration.
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }
}

/// Layout configuration.
///
/// In TOML the per-strategy options are nested tables:
///
/// ```toml
/// [layout]
/// engine = "force-directed"
/// split_isolated = true
///
/// [layout.force]
/// iterations = 200
/// seed = 7
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Strategy used by [`DiagramBuilder::layout`](crate::DiagramBuilder::layout).
    engine: LayoutKind,

    /// Lay out isolated and connected nodes in separate passes.
    split_isolated: bool,

    /// Gap between the isolated block and the connected block when split.
    isolated_gap: f32,

    /// Filter applied to edges sharing the same endpoints.
    edge_pairs: EdgePairPolicy,

    hierarchical: hierarchical::Options,
    force: force::Options,
    circular: circular::Options,
    axis: axis::Options,
    #[serde(rename = "box")]
    grid: grid::Options,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            engine: LayoutKind::default(),
            split_isolated: false,
            isolated_gap: DEFAULT_ISOLATED_GAP,
            edge_pairs: EdgePairPolicy::default(),
            hierarchical: hierarchical::Options::default(),
            force: force::Options::default(),
            circular: circular::Options::default(),
            axis: axis::Options::default(),
            grid: grid::Options::default(),
        }
    }
}

impl LayoutConfig {
    /// Creates a [`LayoutConfig`] using `engine` and defaults for everything else.
    pub fn new(engine: LayoutKind) -> Self {
        Self {
            engine,
            ..Default::default()
        }
    }

    /// Returns a copy with isolated splitting switched on or off.
    pub fn with_split_isolated(mut self, split: bool) -> Self {
        self.split_isolated = split;
        self
    }

    /// Returns a copy using the given edge pair policy.
    pub fn with_edge_pairs(mut self, policy: EdgePairPolicy) -> Self {
        self.edge_pairs = policy;
        self
    }

    /// Returns a copy using the given force-directed options.
    pub fn with_force(mut self, options: force::Options) -> Self {
        self.force = options;
        self
    }

    /// Returns the selected [`LayoutKind`].
    pub fn engine(&self) -> LayoutKind {
        self.engine
    }

    pub fn split_isolated(&self) -> bool {
        self.split_isolated
    }

    pub fn isolated_gap(&self) -> f32 {
        self.isolated_gap
    }

    pub fn edge_pairs(&self) -> EdgePairPolicy {
        self.edge_pairs
    }

    pub fn hierarchical(&self) -> &hierarchical::Options {
        &self.hierarchical
    }

    pub fn force(&self) -> &force::Options {
        &self.force
    }

    pub fn circular(&self) -> &circular::Options {
        &self.circular
    }

    pub fn axis(&self) -> &axis::Options {
        &self.axis
    }

    /// Returns the options of the box strategy.
    pub fn grid(&self) -> &grid::Options {
        &self.grid
    }
}
