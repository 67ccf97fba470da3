// harmonist-core/src/parser/mod.rs

pub mod melody;

pub use melody::{format_melody, parse_duration, parse_melody};
