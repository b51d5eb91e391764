//! # Interface
//!
//! User-facing command handlers.

pub mod commands;
