//! Domain layer for taskdav
//!
//! Contains the calendar entities, identifiers and value objects shared by
//! every other crate. This layer knows nothing about HTTP, XML or storage.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
