//! Domain model for lists, rows, aggregates and finance records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation next to the data it protects.
//!
//! # Invariants
//! - Every persisted object is identified by a stable UUID.
//! - Deletion is represented by `deleted_at` tombstones, not hard delete.

pub mod aggregate;
pub mod calendar;
pub mod finance;
pub mod list;
pub mod row;
