//! services/api/src/lib.rs
//!
//! The Mindload API service: concrete adapters for the core ports, configuration,
//! and the HTTP surface over the generation workflow.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
