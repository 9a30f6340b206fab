//! Domain model for restaurants, menus and critiques.
//!
//! # Responsibility
//! - Define the in-memory shapes materialized by the mappers.
//! - Keep per-entity consistency rules (validation, mean computation) close
//!   to the data they guard.
//!
//! # Invariants
//! - Every persisted entity is identified by a stable, never reused `Oid`.
//! - Menu entries and critiques are immutable once built; restaurants change
//!   only through menu additions and mean-vote recomputation.

pub mod critique;
pub mod oid;
pub mod restaurant;
