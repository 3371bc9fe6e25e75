//! Use-case services.
//!
//! # Responsibility
//! - Enforce enrollment invariants and authorization above the store.
//! - Run every mutation as one `EntityStore::atomic` unit.
//!
//! # Invariants
//! - Check order is existence -> authorization -> duplicate/capacity ->
//!   mutate. A failed check leaves the store untouched.
//! - Services remain storage-agnostic.

pub mod bootstrap;
pub mod enrollment_service;
pub mod error;
pub mod identity_service;
mod profile_ops;
