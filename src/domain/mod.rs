//! Domain model
pub mod aggregates;
pub mod catalog;
pub mod content;
pub mod filter;
pub mod pricing;
pub mod value_objects;
