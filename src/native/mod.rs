//! Direct access to page content through lopdf, without rasterizing.

mod content;
mod images;

pub use content::extract_page_spans;
pub use images::extract_page_images;
