//! Rules that wrap other rules

pub mod child;
pub mod collection;
pub mod composite;
pub mod conditional;
pub mod transform;

pub use child::ChildValidatorRule;
pub use collection::ForEach;
pub use composite::{Composite, CompositeMode};
pub use conditional::{Condition, Conditional};
pub use transform::{lowercased, trimmed, Transform};
