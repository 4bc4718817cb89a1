//! Presentation subsystem.
//!
//! # Responsibilities
//! - Turn a request context into a rendered page and status code
//! - Parallel related-content and layout fetches
//! - Error fallback to a custom error layout, an on-disk error page or the embedded page

pub mod document;
pub mod pipeline;
pub mod related;
pub mod render;
pub mod templates;

pub use document::ContentDocument;
pub use pipeline::{Pipeline, PipelineError, Presented, Stage, FALLBACK_PAGE};
pub use related::{NoRelatedContent, RelatedContent};
pub use render::{DeconstLocals, MiniJinjaRenderer, RenderError, RenderScope, Renderer, UrlHelper};
pub use templates::{TemplateError, TemplateLibrary, TemplateMatch};
