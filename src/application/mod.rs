//! # Application Layer
//!
//! Contains the core logic and orchestration of the bot: event classification,
//! channel metadata, the channel registry, the delivery scheduler and the control loop.

pub mod classifier;
pub mod context;
pub mod engine;
pub mod identity;
pub mod metadata;
pub mod registry;
pub mod scheduler;
pub mod state;
