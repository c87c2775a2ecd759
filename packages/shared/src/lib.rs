//! Utilities shared by the ClassMood packages.

pub mod logger;
pub mod time;
