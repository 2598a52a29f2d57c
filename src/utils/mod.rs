// src/utils/mod.rs

//! Utility modules for the watcher.

pub mod console;
pub mod http;
