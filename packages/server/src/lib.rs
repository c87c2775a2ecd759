//! ClassMood live classroom server library.
//!
//! This library binds browser connections (students and teachers) to class rooms,
//! forwards snapshot frames to an external emotion classifier with per-student
//! exclusivity, and aggregates the resulting engagement scores per class.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
