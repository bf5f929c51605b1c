//! Dim layer coordination for compositors.
//!
//! Containers ask for a dim behind themselves once per frame and the [`Dimmer`] turns those
//! requests into surface commands on the frame's [`Transaction`], fading the layer in, handing
//! it over between containers and fading it out again.

pub mod animation;
pub mod bounds;
pub mod config;
pub mod container;
pub mod dimmer;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod mock;
pub mod paths;
pub mod surface;

pub use bounds::DimMode;
pub use config::Config;
pub use container::{Container, ContainerId, DimContainer, TaskFragmentInfo};
pub use dimmer::{DimAnimationKind, DimHost, Dimmer, DimmerSettings};
pub use error::{DimmerError, DimmerResult};
pub use geometry::{Bounds, Position, Size};
pub use surface::{CommandTransaction, Compositor, SurfaceCommand, SurfaceHandle, Transaction};

pub fn version() -> &'static str {
    option_env!("VERSION").unwrap_or("v0.0.0-dev")
}
