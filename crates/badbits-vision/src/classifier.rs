//! Yes/no questions about an image, answered by a vision-language model.

use std::io::Cursor;
use std::time::Duration;

use badbits_core::error::{BadbitsError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const JPEG_QUALITY: u8 = 90;
const AUTH_HEADER: &str = "X-Moondream-Auth";

// ── Model seam ────────────────────────────────────────────────────────────────

/// Image prepared once per cycle and reused for every question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data_url: String,
}

impl EncodedImage {
    pub fn from_data_url(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

#[allow(async_fn_in_trait)]
pub trait VisionModel {
    fn encode(&self, image: &RgbImage) -> Result<EncodedImage>;

    /// Raw answer text for `question` about `image`.
    async fn query(&self, image: &EncodedImage, question: &str) -> Result<String>;
}

// ── Answer interpretation ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Anything other than a bare yes or no.
    Other,
}

impl Answer {
    /// Only an exact `"yes"` (after trimming and lowercasing) is positive.
    pub fn interpret(answer: &str) -> Self {
        match normalize_answer(answer).as_str() {
            "yes" => Answer::Yes,
            "no" => Answer::No,
            _ => Answer::Other,
        }
    }

    pub fn is_active(self) -> bool {
        self == Answer::Yes
    }
}

pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// ── VisionClassifier ──────────────────────────────────────────────────────────

pub struct VisionClassifier<M> {
    model: M,
}

impl<M: VisionModel> VisionClassifier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn encode(&self, image: &RgbImage) -> Result<EncodedImage> {
        self.model.encode(image)
    }

    /// Ask `prompt` about `image`; the answer comes back trimmed and
    /// lowercased.
    pub async fn classify(&self, image: &EncodedImage, prompt: &str) -> Result<String> {
        let raw = self.model.query(image, prompt).await?;
        let answer = normalize_answer(&raw);
        debug!(answer = %answer, "model answered");
        Ok(answer)
    }

    /// Free-text follow-up. Returned as the model wrote it, minus outer
    /// whitespace.
    pub async fn describe(&self, image: &EncodedImage, prompt: &str) -> Result<String> {
        let raw = self.model.query(image, prompt).await?;
        Ok(raw.trim().to_string())
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

// ── MoondreamClient ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    image_url: &'a str,
    question: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    answer: String,
}

/// HTTP client for a Moondream-compatible `/query` endpoint.
pub struct MoondreamClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl MoondreamClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BadbitsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn query_url(&self) -> String {
        format!("{}/query", self.endpoint.trim_end_matches('/'))
    }
}

impl VisionModel for MoondreamClient {
    fn encode(&self, image: &RgbImage) -> Result<EncodedImage> {
        let mut buf = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
            .encode_image(image)
            .map_err(|e| BadbitsError::Image(format!("JPEG encoding failed: {e}")))?;
        Ok(EncodedImage::from_data_url(format!(
            "data:image/jpeg;base64,{}",
            BASE64.encode(buf.get_ref())
        )))
    }

    async fn query(&self, image: &EncodedImage, question: &str) -> Result<String> {
        let body = QueryRequest {
            image_url: image.data_url(),
            question,
            stream: false,
        };

        let mut request = self.client.post(self.query_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(AUTH_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BadbitsError::Classification(format!("model request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, "model endpoint returned an error");
            return Err(BadbitsError::Classification(format!(
                "model endpoint returned {status}: {}",
                text.trim()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| BadbitsError::Classification(format!("model response unreadable: {e}")))?;
        parse_answer(&text)
    }
}

fn parse_answer(body: &str) -> Result<String> {
    let parsed: QueryResponse = serde_json::from_str(body).map_err(|e| {
        BadbitsError::Classification(format!("unexpected model response: {e}"))
    })?;
    Ok(parsed.answer)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
