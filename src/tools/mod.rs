//! MCP tool inputs for Prism.
//!
//! This module contains the input types for the MCP tools that expose
//! ServiceNow lookups.

mod inputs;

pub use inputs::*;
