//! Resolved object model for the OME-XML XSD schema.
//!
//! This crate turns a parsed schema tree into the object model a code
//! generator consumes: schema elements become [`ModelObject`]s with ordered
//! [`ModelProperty`] collections, XSD types are resolved to target language
//! types through a pluggable [`LanguagePolicy`], and implied relationships
//! (settings references, back references) are synthesized so the model can
//! be navigated in both directions.
//!
//! The entry point is [`OmeModel::process`], which takes a [`SchemaTree`]
//! and a [`GenerationSession`] and returns the finished registry.

pub mod appinfo;
pub mod config;
pub mod error;
pub mod language;
pub mod model;
pub mod naming;
pub mod object;
pub mod property;
pub mod schema;
pub mod xstypes;

pub use appinfo::Appinfo;
pub use config::{GenerationSession, OverrideTables, DEFAULT_NAMESPACE};
pub use error::ModelProcessingError;
pub use language::{Cxx, Java, LanguagePolicy};
pub use model::{OmeModel, ParentNode};
pub use object::ModelObject;
pub use property::{Delegate, ModelProperty, ReferenceDelegate};
pub use schema::{
    AttributeUse, ElementId, Occurs, SchemaAttribute, SchemaElement, SchemaTree, SimpleType,
    UNBOUNDED,
};
pub use xstypes::OrderedMap;
