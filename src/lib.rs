// src/lib.rs

//! areawatch: advocacy provider coverage watcher library

pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod providers;
pub mod storage;
pub mod utils;
