//! Writing extracted images to disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::{ExtractedImage, PageResult};

/// Writes page images as `<stem>_image_page<page+1>_<index>.<ext>`.
///
/// Names depend only on the source stem, the page and the image position,
/// so rerunning over the same source overwrites the previous files.
#[derive(Debug, Clone)]
pub struct ImageWriter {
    dir: PathBuf,
    stem: String,
}

impl ImageWriter {
    /// Create the output directory (recursively) and a writer for it.
    pub fn create(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| Error::OutputDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            stem: stem.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for image `index` of page `page` (both zero-based).
    pub fn file_name(&self, page: usize, index: usize, image: &ExtractedImage) -> String {
        format!(
            "{}_image_page{}_{}.{}",
            self.stem,
            page + 1,
            index,
            image.extension()
        )
    }

    /// Write every image of `page`, returning the written paths in order.
    pub fn write_page(&self, page: &PageResult) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(page.images.len());
        for (index, image) in page.images.iter().enumerate() {
            let path = self.dir.join(self.file_name(page.index, index, image));
            fs::write(&path, &image.data)?;
            written.push(path);
        }
        if !written.is_empty() {
            log::debug!(
                "Saved {} images for page {} to {}",
                written.len(),
                page.index,
                self.dir.display()
            );
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageFormat;

    fn page_with_images() -> PageResult {
        let mut page = PageResult::empty(1);
        page.images.push(ExtractedImage::new(vec![1, 2, 3], ImageFormat::Jpeg, 1, 1));
        page.images.push(ExtractedImage::new(vec![4, 5], ImageFormat::Png, 1, 1));
        page
    }

    #[test]
    fn test_creates_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("b");
        let writer = ImageWriter::create(&dir, "doc").unwrap();
        assert!(dir.is_dir());
        assert_eq!(writer.dir(), dir.as_path());
    }

    #[test]
    fn test_file_names() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ImageWriter::create(tmp.path(), "report").unwrap();
        let paths = writer.write_page(&page_with_images()).unwrap();

        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["report_image_page2_0.jpg", "report_image_page2_1.png"]
        );
        assert_eq!(fs::read(&paths[1]).unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_rerun_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ImageWriter::create(tmp.path(), "report").unwrap();
        writer.write_page(&page_with_images()).unwrap();
        writer.write_page(&page_with_images()).unwrap();

        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_dir_blocked_by_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let err = ImageWriter::create(tmp.path().join("sub"), "x").unwrap_err();
        assert!(matches!(err, Error::OutputDir { .. }));
    }
}
