//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Token verification (JWT, mock)
//! - `mcp` - JSON-RPC tool surface for AI agents
//! - `memory` - In-memory repository for tests
//! - `postgres` - PostgreSQL database implementations

pub mod auth;
pub mod mcp;
pub mod memory;
pub mod postgres;
