//! Turn Gherkin feature files into a previewable hierarchy of Jira issues,
//! then create the selected part of it.
//!
//! The pipeline is `gherkin::parse` → `plan::plan` → `service::create_from_plan`.
//! Everything up to the plan is pure; only creation talks to the tracker.

pub mod api;
pub mod config;
pub mod error;
pub mod gherkin;
pub mod materialize;
pub mod models;
pub mod plan;
pub mod service;
pub mod tracker;

pub use error::{Error, Result};
