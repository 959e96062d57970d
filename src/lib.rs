// Taiga MCP server - library root for testing

pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod http_client;
pub mod mcp;
pub mod models;
pub mod pagination;
pub mod resolver;
pub mod services;
