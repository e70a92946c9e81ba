//! Data model shared by the extraction strategies.
//!
//! Geometry and detection types are ephemeral and live only while a page is
//! being processed; [`PageResult`] and [`DocumentResult`] are what a run
//! hands back to the caller.

mod geometry;
mod media;
mod region;
mod result;
mod table;

pub use geometry::BoundingBox;
pub use media::{ExtractedImage, ImageFormat};
pub use region::{Detection, LayoutRegion, OcrLine, OcrWord, RegionContent, RegionKind};
pub use result::{DocumentResult, PageResult};
pub use table::{Table, TableCell, TableRow};
