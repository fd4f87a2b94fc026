mod engines;

pub use engines::{
    DEFAULT_ISOLATED_GAP, Engine, EngineBuilder, LayoutKind, axis, circular, force, grid,
    hierarchical, linear,
};
