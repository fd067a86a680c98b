//! Domain models for the labeler.
//!
//! # Core Concepts
//!
//! - [`Label`]: A label eligible for a run, carrying the policy shown to the model.
//! - [`Item`]: The issue or pull request being classified.
//! - [`LinkedItem`]: An issue or pull request referenced from the item's body.
//! - [`Decision`]: The model's choice of labels, drawn only from the catalog.
//!
//! All models are read-only value records for the duration of one run.

mod decision;
mod item;
mod label;

pub use decision::*;
pub use item::*;
pub use label::*;
