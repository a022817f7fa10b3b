//! OCR of embedded PDF images through the `tesseract` command-line tool.

use std::future::Future;
use std::pin::Pin;

use tokio::process::Command;

use crate::error::CorpusError;

/// Container format of an extracted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Jpeg2000,
}

impl ImageKind {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Jpeg2000 => "jp2",
        }
    }
}

/// An encoded raster image pulled out of a PDF page.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBlob")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

pub trait OcrEngine: Send + Sync {
    /// Recognize the text in `image`.
    fn recognize<'a>(
        &'a self,
        image: &'a ImageBlob,
    ) -> Pin<Box<dyn Future<Output = Result<String, CorpusError>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    languages: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", "eng+chi_tra")
    }
}

impl TesseractOcr {
    #[must_use]
    pub fn new(binary: impl Into<String>, languages: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
        }
    }

    #[must_use]
    pub fn languages(&self) -> &str {
        &self.languages
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize<'a>(
        &'a self,
        image: &'a ImageBlob,
    ) -> Pin<Box<dyn Future<Output = Result<String, CorpusError>> + Send + 'a>> {
        Box::pin(async move {
            let file = tempfile::Builder::new()
                .prefix("refqa-ocr-")
                .suffix(&format!(".{}", image.kind.extension()))
                .tempfile()?;
            tokio::fs::write(file.path(), &image.bytes).await?;

            let output = Command::new(&self.binary)
                .arg(file.path())
                .arg("stdout")
                .arg("-l")
                .arg(&self.languages)
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| CorpusError::Ocr(format!("failed to run {}: {e}", self.binary)))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(CorpusError::Ocr(format!(
                    "{} exited with {}: {}",
                    self.binary,
                    output.status,
                    stderr.trim()
                )));
            }
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        })
    }
}
