//! Taskdeck - Multi-tenant to-do service for AI agents
//!
//! This crate exposes five task-management tools over the Model Context
//! Protocol (JSON-RPC 2.0), with JWT-verified identity and strict
//! per-user data isolation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
