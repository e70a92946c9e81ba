//! Serialization of extraction results.
//!
//! Tables are rendered as Markdown for the native strategy and as HTML for
//! the layout strategy; whole documents serialize to JSON.

mod html;
mod json;
mod markdown;

pub use html::{escape_html, table_to_html};
pub use json::{to_json, JsonFormat};
pub use markdown::table_to_markdown;
