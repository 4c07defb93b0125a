//! Shared matching helpers used by config resolution and the hook runners.

pub mod glob;
pub mod patterns;
