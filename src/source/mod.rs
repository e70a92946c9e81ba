//! Loading PDF sources and turning pages into rasters.

mod raster;

pub use raster::{PageRasterizer, Pdftoppm};

use std::path::{Path, PathBuf};

use lopdf::{Document as LopdfDocument, ObjectId};

use crate::detect::{validate_source, PdfHeader};
use crate::error::{Error, Result};

/// An opened PDF document with its pages in document order.
///
/// The lopdf document is owned by the source and released when the source
/// is dropped.
#[derive(Debug)]
pub struct PdfSource {
    path: PathBuf,
    header: PdfHeader,
    doc: LopdfDocument,
    /// (1-based page number, page object id), ascending
    pages: Vec<(u32, ObjectId)>,
}

impl PdfSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let header = validate_source(path)?;
        let doc = LopdfDocument::load(path)?;
        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();

        log::info!(
            "Opened {} ({}, {} pages)",
            path.display(),
            header,
            pages.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            header,
            doc,
            pages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &PdfHeader {
        &self.header
    }

    pub fn document(&self) -> &LopdfDocument {
        &self.doc
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page object ids in document order.
    pub fn page_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.pages.iter().map(|(_, id)| *id)
    }

    /// 1-based page number of the page at `index`.
    pub fn page_number(&self, index: usize) -> Result<u32> {
        self.pages
            .get(index)
            .map(|(num, _)| *num)
            .ok_or(Error::PageOutOfRange(index, self.pages.len()))
    }

    /// Object id of the page at `index`.
    pub fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.pages
            .get(index)
            .map(|(_, id)| *id)
            .ok_or(Error::PageOutOfRange(index, self.pages.len()))
    }

    /// File name of the source, e.g. "report.v2.pdf".
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name up to its first '.', e.g. "report" for "report.v2.pdf".
    pub fn file_stem(&self) -> String {
        file_stem(&self.path)
    }
}

/// File name of `path` up to its first '.'.
pub fn file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    fn write_blank_pdf(path: &Path, pages: usize) {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::from(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_file_stem_stops_at_first_dot() {
        assert_eq!(file_stem(Path::new("/tmp/report.v2.pdf")), "report");
        assert_eq!(file_stem(Path::new("plain")), "plain");
    }

    #[test]
    fn test_open_missing_file() {
        let err = PdfSource::open("/no/such/file.pdf").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_open_counts_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.pages.pdf");
        write_blank_pdf(&path, 3);

        let source = PdfSource::open(&path).unwrap();
        assert_eq!(source.page_count(), 3);
        assert_eq!(source.page_ids().count(), 3);
        assert_eq!(source.page_number(0).unwrap(), 1);
        assert_eq!(source.page_number(2).unwrap(), 3);
        assert!(matches!(
            source.page_number(3),
            Err(Error::PageOutOfRange(3, 3))
        ));
        assert_eq!(source.file_name(), "three.pages.pdf");
        assert_eq!(source.file_stem(), "three");
    }
}
