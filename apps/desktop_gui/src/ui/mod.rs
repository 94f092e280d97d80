//! UI layer for desktop GUI: the single page shell.

pub mod app;

pub use app::{ChartDeckApp, StartupConfig};
