//! OCR Providers
//!
//! Defines the provider trait and the Tesseract CLI backend.

use std::collections::BTreeMap;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::types::{Detection, OcrError, Region};

/// OCR provider trait
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Short provider name for logs and health output
    fn name(&self) -> &'static str;

    /// Check if the provider can run
    async fn is_available(&self) -> bool;

    /// Detect text lines in an encoded image, in reading order
    async fn detect(&self, image_data: &[u8]) -> Result<Vec<Detection>, OcrError>;
}

/// Tesseract OCR provider
///
/// Runs `tesseract stdin stdout -l <languages> tsv` and groups the word rows
/// of the TSV report into one detection per text line.
pub struct TesseractProvider {
    binary: String,
    languages: String,
}

impl TesseractProvider {
    pub fn new(languages: &str) -> Self {
        Self {
            binary: "tesseract".to_string(),
            languages: languages.to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }
}

#[async_trait]
impl OcrProvider for TesseractProvider {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn detect(&self, image_data: &[u8]) -> Result<Vec<Detection>, OcrError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.languages.as_str(), "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OcrError::ProviderNotAvailable(format!("Failed to run {}: {}", self.binary, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let data = image_data.to_vec();
            // Feed stdin concurrently so a full stdout pipe cannot stall us
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&data).await {
                    tracing::debug!("Tesseract closed stdin early: {}", e);
                }
            });
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        Ok(parse_tsv(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Tesseract TSV columns
const LEVEL: usize = 0;
const PAGE: usize = 1;
const BLOCK: usize = 2;
const PARAGRAPH: usize = 3;
const LINE: usize = 4;
const LEFT: usize = 6;
const TOP: usize = 7;
const WIDTH: usize = 8;
const HEIGHT: usize = 9;
const CONF: usize = 10;
const TEXT: usize = 11;

/// Word rows carry level 5
const WORD_LEVEL: &str = "5";

#[derive(Default)]
struct LineAccumulator {
    words: Vec<String>,
    confidences: Vec<f32>,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

/// Group Tesseract TSV word rows into line detections.
///
/// Lines keep Tesseract's (page, block, paragraph, line) order; confidence
/// is the mean word confidence scaled to `[0, 1]`.
pub fn parse_tsv(tsv: &str) -> Vec<Detection> {
    let mut lines: BTreeMap<(u32, u32, u32, u32), LineAccumulator> = BTreeMap::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() <= TEXT || cols[LEVEL] != WORD_LEVEL {
            continue;
        }

        let text = cols[TEXT].trim();
        let conf: f32 = cols[CONF].trim().parse().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let num = |i: usize| cols[i].trim().parse::<u32>().unwrap_or(0);
        let px = |i: usize| cols[i].trim().parse::<f32>().unwrap_or(0.0);
        let (left, top, width, height) = (px(LEFT), px(TOP), px(WIDTH), px(HEIGHT));

        let line = lines
            .entry((num(PAGE), num(BLOCK), num(PARAGRAPH), num(LINE)))
            .or_insert_with(|| LineAccumulator {
                left,
                top,
                right: left + width,
                bottom: top + height,
                ..Default::default()
            });

        line.words.push(text.to_string());
        line.confidences.push(conf);
        line.left = line.left.min(left);
        line.top = line.top.min(top);
        line.right = line.right.max(left + width);
        line.bottom = line.bottom.max(top + height);
    }

    lines
        .into_values()
        .map(|line| {
            let mean = line.confidences.iter().sum::<f32>() / line.confidences.len() as f32;
            Detection {
                region: Region::from_rect(line.left, line.top, line.right - line.left, line.bottom - line.top),
                text: line.words.join(" "),
                confidence: (mean / 100.0).clamp(0.0, 1.0),
            }
        })
        .collect()
}

/// Provider used when OCR is switched off
pub struct DisabledOcr;

#[async_trait]
impl OcrProvider for DisabledOcr {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn is_available(&self) -> bool {
        false
    }

    async fn detect(&self, _image_data: &[u8]) -> Result<Vec<Detection>, OcrError> {
        Err(OcrError::ProviderNotAvailable("OCR is disabled".to_string()))
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockOcr {
    pub detections: Vec<Detection>,
}

#[cfg(test)]
#[async_trait]
impl OcrProvider for MockOcr {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn detect(&self, _image_data: &[u8]) -> Result<Vec<Detection>, OcrError> {
        Ok(self.detections.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t
4\t1\t1\t1\t1\t0\t10\t20\t200\t30\t-1\t
5\t1\t1\t1\t1\t1\t10\t20\t80\t30\t90\tHello
5\t1\t1\t1\t1\t2\t100\t22\t110\t28\t70\tworld
5\t1\t1\t1\t2\t1\t12\t60\t50\t25\t20\tfaint
5\t1\t2\t1\t1\t1\t300\t400\t40\t20\t95\t
";

    #[test]
    fn test_parse_tsv_groups_words_into_lines() {
        let detections = parse_tsv(TSV);

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].text, "Hello world");
        assert!((detections[0].confidence - 0.8).abs() < 1e-6);
        assert_eq!(detections[0].region, Region::from_rect(10.0, 20.0, 200.0, 30.0));

        assert_eq!(detections[1].text, "faint");
        assert!((detections[1].confidence - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_tsv_ignores_garbage() {
        assert!(parse_tsv("").is_empty());
        assert!(parse_tsv("header only\n").is_empty());
        assert!(parse_tsv("h\n5\t1\t1\n").is_empty());
    }

    #[tokio::test]
    async fn test_disabled_provider() {
        assert!(!DisabledOcr.is_available().await);
        assert!(matches!(
            DisabledOcr.detect(b"img").await,
            Err(OcrError::ProviderNotAvailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let provider = TesseractProvider::new("eng").with_binary("definitely-not-a-real-ocr-binary");
        assert!(!provider.is_available().await);
        assert!(matches!(
            provider.detect(b"img").await,
            Err(OcrError::ProviderNotAvailable(_))
        ));
    }
}
