//! Google Workspace MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing Google Workspace operations
//! as tools: account identity, Gmail sending, Calendar listing and creation,
//! Drive folder listing and search.

pub mod config;
pub mod error;
pub mod google;
pub mod mcp;

pub use config::Config;
pub use error::{Result, WorkspaceMcpError};
