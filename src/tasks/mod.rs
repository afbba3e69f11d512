//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Stats retention: Drops key statistics idle beyond the retention window

mod retention;

pub use retention::spawn_retention_task;
