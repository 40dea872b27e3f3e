//! Mixin composition: merges part units into a target unit, wiring override
//! chains between parts that define the same method.

pub mod compose;
pub mod config;
pub mod error;
pub mod ir;
pub mod naming;
pub mod registry;
pub mod rewrite;
pub mod types;
pub mod visit;

pub use compose::{compose, Composer, CompositionSummary};
pub use config::{ComposeOptions, FieldPolicy};
pub use error::CoreError;
pub use ir::{Catalog, Field, Method, Unit};
pub use types::{Type, TypeSystem};
