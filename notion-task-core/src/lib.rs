//! Core library for notion-task.
//!
//! This crate holds the task models and the translation between them and
//! Notion's database shapes (page properties, filter trees, paginated
//! responses), independent of any transport (HTTP client, MCP, CLI).
//!
//! # Usage
//!
//! ```
//! use notion_task_core::models::*;
//! use notion_task_core::query::build_filter;
//!
//! let names = PropertyNames::default();
//! let filter = TaskFilter {
//!     status_group: Some(StatusGroup::Done),
//!     ..Default::default()
//! };
//! assert!(build_filter(&filter, &names).is_some());
//! assert!(build_filter(&TaskFilter::default(), &names).is_none());
//! ```

pub mod mapper;
pub mod models;
pub mod query;

// Re-export commonly used items at crate root
pub use mapper::{to_external_patch, to_normalized};
pub use query::{build_filter, collect_pages, FilterNode, Page, QueryRequest};
