pub mod aggregate;
pub mod commands;
mod error;
mod tracker;
mod view_model;

pub use error::ProjectError;
pub use tracker::{TrackerState, TrackerStatus};
pub use view_model::ProjectViewModel;
