//! Endless-flight simulation core.
//!
//! Everything here is renderer-agnostic: the host feeds key state and frame
//! deltas into a [`Session`] and reads transforms back out.

pub mod asset;
pub mod camera;
pub mod collision;
pub mod config;
pub mod pool;
pub mod pose;
pub mod scoring;
pub mod session;
pub mod submit;

pub use asset::{resolve_craft_visual, CraftVisual};
pub use config::{load_config_from_path, validate_config, SimConfig};
pub use pose::FlightInput;
pub use scoring::ScoreSnapshot;
pub use session::{GamePhase, Session, SimEvent};
pub use submit::{ScoreSink, ScoreSubmission, SubmitError, SubmitStatus};
