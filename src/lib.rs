//! # codevault — Semantic code search MCP server
//!
//! Indexes source trees into a shared vector store and serves semantic
//! retrieval queries to AI assistants via the Model Context Protocol.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, validation, defaults
//! - **[`indexer`]** — Discovery, pattern matching, chunking, batched ingestion
//! - **[`embedding`]** — Embedding provider abstraction (local HTTP / hosted API / mock)
//! - **[`store`]** — SQLite + sqlite-vec vector store (one shared collection)
//! - **[`query`]** — Search, filters, similarity display, file reconstruction
//! - **[`projects`]** — Derived project registry (metadata scan + grouping)
//! - **[`project`]** — Project id derivation and per-project indexing locks
//! - **[`mcp`]** — MCP server with 7 tool handlers (stdio transport via rmcp)

pub mod config;
pub mod embedding;
pub mod indexer;
pub mod mcp;
pub mod project;
pub mod projects;
pub mod query;
pub mod store;
