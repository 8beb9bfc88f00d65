//! Notion task database tools for AI agents.
//!
//! [`client::NotionClient`] talks to the Notion REST API using the
//! translation layer in `notion_task_core`; [`mcp`] exposes it as MCP tools
//! and the `notion-task` binary as a CLI.

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod mcp;

pub use client::NotionClient;
pub use config::Config;
pub use error::{Error, Result};
