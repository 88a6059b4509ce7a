//! Core domain types and logic.

pub mod table;
pub mod price_row;
pub mod position;
pub mod simulation;
pub mod metrics;
pub mod timeframe;
pub mod indicator;
pub mod target;
pub mod normalize;
pub mod verifier;
pub mod model;
pub mod pipeline;
pub mod config_validation;
pub mod error;
