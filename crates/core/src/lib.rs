//! Domain types for property listings and the checks applied to them before
//! they reach storage.

pub mod types;
pub mod validation;

pub use types::{NewProperty, Property, PropertyDraft, Review};
pub use validation::{ReviewRules, ValidationError};
