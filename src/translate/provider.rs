//! Translation providers
//!
//! Defines the provider trait and the Google Translate (gtx) backend.

use std::time::Duration;

use async_trait::async_trait;

/// Translation provider errors
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider returned an empty translation")]
    EmptyTranslation,
}

/// Translation provider trait
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Translate `text` from `source` (or `auto`) into `target`
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError>;
}

/// Default public endpoint of the Google Translate web client
pub const GOOGLE_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Google Translate provider (unauthenticated gtx client)
pub struct GoogleTranslateProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslateProvider {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn request_url(&self, text: &str, source: &str, target: &str) -> String {
        format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.endpoint,
            urlencoding::encode(source),
            urlencoding::encode(target),
            urlencoding::encode(text)
        )
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let response = self
            .client
            .get(self.request_url(text, source, target))
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Status { status, body });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslateError::InvalidResponse(e.to_string()))?;

        parse_gtx_response(&json)
    }
}

/// Concatenate the translated segments found at `[0][*][0]`
pub fn parse_gtx_response(json: &serde_json::Value) -> Result<String, TranslateError> {
    let segments = json
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslateError::InvalidResponse("missing segment array".to_string()))?;

    let translation: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|v| v.as_str()))
        .collect();

    if translation.is_empty() {
        return Err(TranslateError::EmptyTranslation);
    }

    Ok(translation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_gtx_concatenates_segments() {
        let body = json!([
            [["Xin chào. ", "Hello. ", null, null, 10], ["Bạn khỏe không?", "How are you?", null, null, 10]],
            null,
            "en"
        ]);
        assert_eq!(parse_gtx_response(&body).unwrap(), "Xin chào. Bạn khỏe không?");
    }

    #[test]
    fn test_parse_gtx_rejects_malformed() {
        assert!(matches!(
            parse_gtx_response(&json!({"error": "nope"})),
            Err(TranslateError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_gtx_response(&json!([[]])),
            Err(TranslateError::EmptyTranslation)
        ));
    }

    #[test]
    fn test_request_url_encodes_text() {
        let provider =
            GoogleTranslateProvider::new("https://example.test/translate/", Duration::from_secs(1)).unwrap();
        let url = provider.request_url("a&b c", "auto", "vi");
        assert_eq!(
            url,
            "https://example.test/translate?client=gtx&sl=auto&tl=vi&dt=t&q=a%26b%20c"
        );
    }

    #[tokio::test]
    async fn test_blank_text_skips_network() {
        let provider = GoogleTranslateProvider::new("http://127.0.0.1:1", Duration::from_millis(50)).unwrap();
        assert_eq!(provider.translate("   ", "auto", "vi").await.unwrap(), "   ");
    }
}
