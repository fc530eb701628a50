//! Anonymization data models

pub mod entity;

pub use entity::{DetectionMethod, EntitySpan, EntityType};
