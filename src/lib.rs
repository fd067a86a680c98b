//! Label GitHub issues and pull requests with a language model.
//!
//! A run loads the label policy ([`config`]), builds the label catalog
//! ([`labels`]), assembles the evidence ([`context`]), asks the model which
//! labels apply ([`decision`]) and attaches them ([`apply`]). [`workflow`]
//! wires these together.

pub mod apply;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod github;
pub mod labels;
pub mod models;
pub mod workflow;

pub use error::LabelerError;
pub use workflow::{Labeler, RunConfig};
