//! Table reconstruction from positioned text.
//!
//! Both the native strategy (spans decoded from the content stream) and the
//! layout strategy (OCR words inside a table region) feed [`TextSpan`]s into
//! the Stream-mode [`TableDetector`], which groups them into rows and aligned
//! columns without looking at ruling lines.

mod detector;
mod span;

pub use detector::{TableDetector, TableDetectorConfig, TableRegion, TableRowData};
pub use span::TextSpan;
