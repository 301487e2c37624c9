//! Record mapping and rendering engine behind the `crosswalk` converters.
//!
//! Input documents are parsed into a [`document::Value`] tree, mapped by one of
//! the record mappers ([`evaluation`], [`posture`], [`policy`], [`policyset`])
//! into typed target records, and serialized by [`render`].

pub mod document;
pub mod errors;
pub mod evaluation;
pub mod extract;
pub mod io;
pub mod normalize;
pub mod policy;
pub mod policyset;
pub mod posture;
pub mod render;

// Convenience re-exports
pub use document::{Map, Value};
pub use errors::{ConvertError, ConvertResult, DecodeError};
pub use render::{OutputFormat, RenderConfig, Renderer, TemplateSource};
