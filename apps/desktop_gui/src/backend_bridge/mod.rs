//! Backend worker: owns the page controller and the tokio runtime.

pub mod commands;
pub mod runtime;
pub mod view;
