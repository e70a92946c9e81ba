//! Tesseract OCR engine.
//!
//! Runs the `tesseract` command-line tool and parses its TSV output, which
//! carries word boxes and confidences in addition to the text.

use std::path::PathBuf;
use std::process::Command;

use image::RgbImage;

use super::OcrEngine;
use crate::error::{Error, Result};
use crate::model::{BoundingBox, OcrLine, OcrWord};

/// Tesseract configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TesseractConfig {
    /// Executable to run
    pub binary: PathBuf,
    /// Language pack(s), e.g. "eng" or "eng+deu"
    pub language: String,
    /// Page segmentation mode passed as `--psm`
    pub psm: Option<u8>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            psm: None,
        }
    }
}

impl TesseractConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = Some(psm);
        self
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }
}

/// OCR through the `tesseract` CLI.
#[derive(Debug, Clone, Default)]
pub struct Tesseract {
    config: TesseractConfig,
}

impl Tesseract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TesseractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TesseractConfig {
        &self.config
    }

    /// Whether the configured binary can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run(&self, image: &RgbImage) -> Result<String> {
        let file = tempfile::Builder::new()
            .prefix("pdf2data-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(file.path(), image::ImageFormat::Png)?;

        let mut cmd = Command::new(&self.config.binary);
        cmd.arg(file.path())
            .arg("stdout")
            .args(["-l", &self.config.language]);
        if let Some(psm) = self.config.psm {
            cmd.args(["--psm", &psm.to_string()]);
        }
        cmd.arg("tsv");

        match cmd.output() {
            Ok(out) if out.status.success() => Ok(String::from_utf8_lossy(&out.stdout).into_owned()),
            Ok(out) => Err(Error::Ocr(format!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::EngineUnavailable(
                format!(
                    "{} not found (install tesseract-ocr)",
                    self.config.binary.display()
                ),
            )),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl OcrEngine for Tesseract {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&mut self, image: &RgbImage) -> Result<Vec<OcrLine>> {
        let tsv = self.run(image)?;
        let lines = parse_tsv(&tsv)?;
        log::debug!(
            "tesseract recognized {} lines in {}x{} image",
            lines.len(),
            image.width(),
            image.height()
        );
        Ok(lines)
    }
}

/// Group the word rows of Tesseract's TSV output into lines.
///
/// Lines keep the order in which Tesseract reports them; words with an
/// empty text or negative confidence are dropped.
pub fn parse_tsv(tsv: &str) -> Result<Vec<OcrLine>> {
    let mut lines: Vec<((u32, u32, u32, u32), Vec<OcrWord>)> = Vec::new();

    for (row_no, row) in tsv.lines().enumerate() {
        if row_no == 0 && row.starts_with("level") {
            continue;
        }
        if row.trim().is_empty() {
            continue;
        }

        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 11 {
            return Err(Error::Ocr(format!("malformed TSV row {}: {:?}", row_no, row)));
        }
        let int = |i: usize| -> Result<i64> {
            cols[i]
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::Ocr(format!("bad TSV value {:?} in row {}", cols[i], row_no)))
        };

        if int(0)? != 5 {
            continue;
        }
        let text = cols.get(11).map(|t| t.trim()).unwrap_or("");
        let conf: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (int(1)? as u32, int(2)? as u32, int(3)? as u32, int(4)? as u32);
        let (left, top, width, height) = (int(6)? as f32, int(7)? as f32, int(8)? as f32, int(9)? as f32);
        let word = OcrWord {
            text: text.to_string(),
            bbox: BoundingBox::new(left, top, left + width, top + height),
            confidence: conf / 100.0,
        };

        match lines.iter_mut().find(|(k, _)| *k == key) {
            Some((_, words)) => words.push(word),
            None => lines.push((key, vec![word])),
        }
    }

    Ok(lines
        .into_iter()
        .map(|(_, words)| OcrLine::from_words(words))
        .collect())
}
