//! CLI logic for the erdlayout tool.
//!
//! Reads an entity list, lays it out and writes the `{nodes, edges}`
//! document.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use erdlayout::{DiagramBuilder, ErdError};

/// Run the erdlayout CLI application
///
/// This function processes the input file through the layout pipeline and
/// writes the resulting JSON document to the output file.
///
/// # Errors
///
/// Returns `ErdError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Entity list decoding errors
/// - Serialization errors
pub fn run(args: &Args) -> Result<(), ErdError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing entity list"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let builder = DiagramBuilder::new(app_config);
    let entities = builder.parse(&source)?;
    let kind = args
        .engine
        .unwrap_or_else(|| builder.config().layout().engine());
    let diagram = builder.layout_with(kind, &entities);
    let json = builder.render_json(&diagram)?;

    fs::write(&args.output, json)?;

    info!(output_file = args.output; "Diagram exported successfully");

    Ok(())
}
