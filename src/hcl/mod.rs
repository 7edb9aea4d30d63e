//! In-memory model of configuration-language blocks and their text rendering
//!
//! A [`Block`] holds a kind, up to two quoted labels, ordered attributes and
//! nested blocks. Rendering produces Terraform-style text:
//!
//! ```rust
//! use infra_mgr::hcl::Block;
//!
//! let provider = Block::new("provider")
//!     .with_name("aws")
//!     .with_attribute("profile", "default")
//!     .with_attribute("region", "us-east-1");
//!
//! assert_eq!(
//!     provider.render(),
//!     "provider \"aws\" {\n    profile = \"default\"\n    region = \"us-east-1\"\n}"
//! );
//! ```

pub mod block;
pub mod render;
pub mod value;

pub use block::{Block, ALLOWED_FIELDS};
pub use render::{
    render_document, render_document_with, render_value, RenderConfig, RenderWarning, Rendered,
    Renderer,
};
pub use value::Value;
