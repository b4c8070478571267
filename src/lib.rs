//! Arcade vehicle physics: raycast suspension, curve-driven velocity
//! integration, drift adherence, friction anchoring, client/server
//! reconciliation and the animation pose derived from it all.
//!
//! The core is engine agnostic and talks to its host through the traits in
//! [`host`]. [`rapier_host`] binds it to a rapier3d world.

pub mod adherence;
pub mod animation;
pub mod config;
pub mod correction;
pub mod curve;
pub mod error;
pub mod forces;
pub mod friction;
pub mod history;
pub mod host;
pub mod input;
pub mod integrator;
pub mod math;
pub mod path;
pub mod presets;
pub mod protocol;
pub mod rapier_host;
pub mod runtime;
pub mod settings;
pub mod snapshot;
pub mod suspension;
pub mod variant;
pub mod vehicle;

#[cfg(test)]
mod testing;

pub use error::{CodecError, ConfigError, InitError, InitResult};
pub use vehicle::{Frame, NetRole, Vehicle, VehicleContext};
