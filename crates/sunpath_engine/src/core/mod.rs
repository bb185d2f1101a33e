//! Core engine services

pub mod config;

pub use config::{ApplicationConfig, EngineConfig, PipelineConfig};
