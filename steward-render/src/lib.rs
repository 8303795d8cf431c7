//! # steward-render
//!
//! Tera-backed rendering of managed config files. Embedded defaults cover
//! the Cassandra/DataStax config set; a user template directory can
//! override or extend them. See [`Renderer`].

pub mod context;
pub mod engine;
pub mod error;

pub use context::build_context;
pub use engine::{Renderer, TemplateEngine};
pub use error::RenderError;
