//! Storage abstractions for the service layer
//!
//! Contains the reusable file-backed snapshot store that persists a record
//! table together with its identifier allocation counter as JSON.

pub mod json_snapshot_store;
