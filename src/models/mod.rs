//! Domain models for gherkin-jira.
//!
//! # Core Concepts
//!
//! - [`Feature`] / [`Scenario`]: blocks parsed out of a Gherkin document.
//! - [`PlanNode`]: one issue-to-be in a preview. A plan is an ordered `Vec` of
//!   nodes where parents always precede their children.
//! - [`HierarchyConfig`]: project, [`Shape`], type names and field mapping for a run.
//! - [`CreatedIssue`] / [`NodeError`]: the append-only outcome of creating a plan,
//!   gathered into a [`MaterializeReport`].

mod config;
mod document;
mod issue;
mod plan;

pub use config::*;
pub use document::*;
pub use issue::*;
pub use plan::*;
