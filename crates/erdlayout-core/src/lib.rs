//! erdlayout Core Types and Definitions
//!
//! This crate provides the foundational types shared by the layout engine and
//! its front ends:
//!
//! - **Geometry**: Points, sizes and bounds ([`geometry`] module)
//! - **Schema**: Entities, columns and foreign references, plus the sizing
//!   constants every consumer must agree on ([`schema`] module)

pub mod geometry;
pub mod schema;
