//! erdlayout - Layout engine for entity-relationship diagrams.
//!
//! Takes an ordered list of database entities, derives a graph with one node
//! per entity and one edge per foreign key, and computes a position for every
//! node under one of several strategies.

pub mod config;
pub mod graph;
pub mod layout;

mod error;

pub use erdlayout_core::{geometry, schema};

pub use error::ErdError;

use log::{debug, info, trace};

use config::AppConfig;
use graph::Graph;
use layout::{EngineBuilder, LayoutKind};
use schema::Entity;

/// A laid out diagram, serialized as `{nodes, edges}`.
pub type Diagram = Graph;

/// Builder for parsing and laying out entity-relationship diagrams.
///
/// # Examples
///
/// ```rust
/// use erdlayout::{DiagramBuilder, config::AppConfig};
///
/// let source = r#"[
///     {"name": "users", "columns": [{"name": "id", "dataType": "int"}]},
///     {"name": "posts", "columns": [
///         {"name": "author_id", "dataType": "int",
///          "foreignTo": {"name": "users", "column": "id"}}
///     ]}
/// ]"#;
///
/// let builder = DiagramBuilder::new(AppConfig::default());
/// let entities = builder.parse(source).expect("Failed to parse");
/// let diagram = builder.layout(&entities);
/// assert_eq!(diagram.edges().len(), 1);
///
/// let json = builder.render_json(&diagram).expect("Failed to render");
/// assert!(json.contains("\"sourceHandle\""));
/// ```
#[derive(Default)]
pub struct DiagramBuilder {
    config: AppConfig,
}

impl DiagramBuilder {
    /// Create a new diagram builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration this builder was created with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a JSON array of entities.
    ///
    /// # Errors
    ///
    /// Returns [`ErdError::Schema`] when `source` is not a valid entity list.
    pub fn parse(&self, source: &str) -> Result<Vec<Entity>, ErdError> {
        info!("Parsing entity list");

        let entities: Vec<Entity> = serde_json::from_str(source)
            .map_err(|err| ErdError::new_schema_error(err, source))?;

        debug!(entity_count = entities.len(); "Entity list parsed successfully");
        trace!(entities:?; "Parsed entities");

        Ok(entities)
    }

    /// Extract nodes and edges without positioning them.
    pub fn extract(&self, entities: &[Entity]) -> Graph {
        Graph::from_entities(entities, self.config.layout().edge_pairs())
    }

    /// Lay out `entities` with the configured strategy.
    pub fn layout(&self, entities: &[Entity]) -> Diagram {
        self.layout_with(self.config.layout().engine(), entities)
    }

    /// Lay out `entities` with `kind`, keeping every other configured option.
    pub fn layout_with(&self, kind: LayoutKind, entities: &[Entity]) -> Diagram {
        let graph = self.extract(entities);
        let diagram = EngineBuilder::from_config(self.config.layout()).build(kind, graph);
        info!(
            kind:% = kind,
            node_count = diagram.nodes().len(),
            edge_count = diagram.edges().len();
            "Layout calculated"
        );
        diagram
    }

    /// Serialize a diagram as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ErdError::Export`] if serialization fails.
    pub fn render_json(&self, diagram: &Diagram) -> Result<String, ErdError> {
        let json =
            serde_json::to_string_pretty(diagram).map_err(|err| ErdError::Export(Box::new(err)))?;
        debug!(bytes = json.len(); "Diagram rendered to JSON");
        Ok(json)
    }
}
