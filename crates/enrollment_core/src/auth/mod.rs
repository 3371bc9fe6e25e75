//! Identity/Role Gate and credential capability.
//!
//! # Responsibility
//! - Decide, as a pure function, which callers may mutate which
//!   relationships (`gate`).
//! - Hash and verify credentials behind a swappable trait (`credential`).

pub mod credential;
pub mod gate;
