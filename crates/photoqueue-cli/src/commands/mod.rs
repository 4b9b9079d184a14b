//! Command handlers

pub mod config;
pub mod export;
pub mod image;
pub mod item;
pub mod queue;
pub mod status;
