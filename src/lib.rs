//! Arcade Physics - axis-aligned rectangle physics for 2D games
//!
//! Core modules:
//! - `sim`: Deterministic simulation core (integration, broad phase, separation, dispatch)
//! - `settings`: Process-wide physics configuration, persisted as JSON

pub mod settings;
pub mod sim;

pub use settings::{ConfigError, PhysicsConfig};
pub use sim::{
    Body, BodyHandle, BodySet, Collider, Contact, Edges, Group, GroupId, QuadTree, Rect, Tile,
    TileGrid, TileLayer, World,
};

/// Physics configuration constants
pub mod consts {
    /// Default fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Extra per-step overlap tolerated before a contact is treated as spurious
    pub const OVERLAP_BIAS: f32 = 4.0;

    /// Quad-tree node capacity before it splits
    pub const QUAD_TREE_MAX_OBJECTS: usize = 10;
    /// Quad-tree subdivision limit (root is level 0)
    pub const QUAD_TREE_MAX_LEVELS: u32 = 4;

    /// Velocity cap used when a body's cap is left at zero
    pub const DEFAULT_MAX_VELOCITY: f32 = 10000.0;
    /// Default angular velocity cap (degrees/s)
    pub const DEFAULT_MAX_ANGULAR: f32 = 1000.0;

    /// Default world extents
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;
}

/// Sign used by the elastic exchange: anything not strictly positive counts as negative
#[inline]
pub fn direction(v: f32) -> f32 {
    if v > 0.0 { 1.0 } else { -1.0 }
}

/// Move `value` toward zero by `|amount|` without crossing zero
#[inline]
pub fn approach_zero(value: f32, amount: f32) -> f32 {
    let amount = amount.abs();
    if value - amount > 0.0 {
        value - amount
    } else if value + amount < 0.0 {
        value + amount
    } else {
        0.0
    }
}
