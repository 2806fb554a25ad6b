// src/core/mod.rs
pub mod aggregator;
pub mod engine;
pub mod gate;
pub mod monitor;
pub mod scheduler;
mod zones;
