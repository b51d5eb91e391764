//! # Infrastructure Layer
//!
//! Handles interactions with external systems and services.
//! Implements the traits defined in the Domain layer (`Transport`, `ContentProducer`).

pub mod producers;
pub mod slack;
