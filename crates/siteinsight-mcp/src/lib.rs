//! Siteinsight MCP Server
//!
//! Model Context Protocol server exposing the question-answering pipeline
//! to AI assistants over stdio.

pub mod protocol;
mod server;
pub mod tools;

pub use server::{start_server, McpServer};
