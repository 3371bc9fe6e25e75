//! Domain model for courses, profiles, identities and their relationships.
//!
//! # Responsibility
//! - Define the canonical entity shapes used by repositories and services.
//! - Own the in-memory relationship bookkeeping (`CourseRoster`).
//! - Define read views whose mirror sets are computed, never stored.
//!
//! # Invariants
//! - Every entity is identified by a store-assigned integer id.
//! - Course <-> Student and Course <-> Teacher relationships live once, on
//!   the course side; student/teacher course sets are derived on read.

pub mod course;
pub mod profile;
pub mod roster;
pub mod user;
pub mod view;
