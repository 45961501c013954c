use crate::config::Config;
use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::RgbaImage;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, TryRecvError};

pub const CONTRAST_FACTOR: f32 = 2.0;

pub const PROMPT: &str = "Identify and calculate the mathematical expression in the image. \
Only return the answer in numbers. Do not respond with words. \
Look for an equation with an equal sign but no number after it.";

/// Something that can read a handwritten expression from an encoded image.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &Path) -> Result<String>;
}

// ── Gemini ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Image { inline_data: InlineData },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

fn response_text(body: &str) -> Result<String> {
    let response: GenerateResponse =
        serde_json::from_str(body).context("malformed model response")?;
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("model returned no candidates"))?;
    let text: String = candidate
        .content
        .into_iter()
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();
    if text.is_empty() {
        bail!("model returned no text");
    }
    Ok(text)
}

/// Client for the hosted Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    url: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent("math-notes")
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint, config.model
            ),
        })
    }
}

impl Recognizer for GeminiClient {
    fn recognize(&self, image: &Path) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("{} is not set", crate::config::API_KEY_VAR))?;
        let bytes = std::fs::read(image)
            .with_context(|| format!("reading {}", image.display()))?;
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Image {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: general_purpose::STANDARD.encode(bytes),
                        },
                    },
                    Part::Text { text: PROMPT },
                ],
            }],
        };
        let body = serde_json::to_vec(&request).context("encoding request")?;

        tracing::debug!(url = %self.url, "sending recognition request");
        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .context("sending recognition request")?;
        let status = resp.status();
        let text = resp.text().context("reading model response")?;
        if !status.is_success() {
            bail!("model request failed with {status}: {}", text.trim());
        }
        response_text(&text)
    }
}

// ── Pipeline ────────────────────────────────────────────────────────────────

fn encode_to_tempfile(image: &RgbaImage) -> Result<tempfile::NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("math-notes-")
        .suffix(".png")
        .tempfile()
        .context("creating temporary image")?;
    image
        .save_with_format(file.path(), image::ImageFormat::Png)
        .context("encoding PNG")?;
    Ok(file)
}

fn try_recognize(raster: &RgbaImage, recognizer: &dyn Recognizer) -> Result<String> {
    let enhanced = crate::raster::enhance_contrast(raster, CONTRAST_FACTOR);
    // Deleted when dropped, on every return path.
    let file = encode_to_tempfile(&enhanced)?;
    let answer = recognizer.recognize(file.path())?;
    Ok(answer.trim().to_string())
}

/// Run one recognition over a snapshot of the raster. Failures are logged and
/// come back as `None`.
pub fn recognize_surface(raster: &RgbaImage, recognizer: &dyn Recognizer) -> Option<String> {
    match try_recognize(raster, recognizer) {
        Ok(answer) => {
            tracing::info!(%answer, "recognition finished");
            Some(answer)
        }
        Err(err) => {
            tracing::error!("Error during AI calculation: {err:#}");
            None
        }
    }
}

// ── Background Request ──────────────────────────────────────────────────────

/// A recognition running on a worker thread.
pub struct PendingRecognition {
    rx: Receiver<Option<String>>,
}

pub enum Poll {
    Pending,
    Done(Option<String>),
}

impl PendingRecognition {
    pub fn spawn(
        raster: RgbaImage,
        recognizer: std::sync::Arc<dyn Recognizer>,
        on_done: impl FnOnce() + Send + 'static,
    ) -> Self {
        let (tx, rx) = channel();
        std::thread::spawn(move || {
            let answer = recognize_surface(&raster, recognizer.as_ref());
            let _ = tx.send(answer);
            on_done();
        });
        Self { rx }
    }

    pub fn poll(&self) -> Poll {
        match self.rx.try_recv() {
            Ok(answer) => Poll::Done(answer),
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => {
                tracing::error!("recognition worker exited without a result");
                Poll::Done(None)
            }
        }
    }

    /// Block until the worker delivers.
    #[cfg(test)]
    pub fn wait(self) -> Option<String> {
        self.rx.recv().ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    struct Canned {
        reply: Result<String, String>,
        seen: Mutex<Vec<PathBuf>>,
    }

    impl Canned {
        fn new(reply: Result<&str, &str>) -> Self {
            Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<PathBuf> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Recognizer for Canned {
        fn recognize(&self, image: &Path) -> Result<String> {
            assert!(image.exists());
            assert_eq!(image.extension().and_then(|e| e.to_str()), Some("png"));
            image::open(image)?;
            self.seen.lock().unwrap().push(image.to_path_buf());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(msg) => Err(anyhow!(msg.clone())),
            }
        }
    }

    fn raster() -> RgbaImage {
        RgbaImage::from_pixel(32, 16, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn answer_is_trimmed_and_tempfile_removed() {
        let canned = Canned::new(Ok("  4\n"));
        assert_eq!(recognize_surface(&raster(), &canned), Some("4".to_string()));
        let seen = canned.seen();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0].exists());
    }

    #[test]
    fn failure_is_suppressed_and_tempfile_removed() {
        let canned = Canned::new(Err("network down"));
        assert_eq!(recognize_surface(&raster(), &canned), None);
        let seen = canned.seen();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0].exists());
    }

    #[test]
    fn non_numeric_answer_passes_through() {
        let canned = Canned::new(Ok("x = 3?"));
        assert_eq!(
            recognize_surface(&raster(), &canned),
            Some("x = 3?".to_string())
        );
    }

    #[test]
    fn missing_api_key_fails_at_request_time() {
        let config = Config::default();
        let client = GeminiClient::new(&config).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        raster().save(&path).unwrap();
        let err = client.recognize(&path).unwrap_err();
        assert!(err.to_string().contains(crate::config::API_KEY_VAR));
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "4"}, {"text": "2\n"}], "role": "model"}},
                {"content": {"parts": [{"text": "9"}]}}
            ]
        }"#;
        assert_eq!(response_text(body).unwrap(), "42\n");
    }

    #[test]
    fn response_without_candidates_is_an_error() {
        assert!(response_text(r#"{"candidates": []}"#).is_err());
        assert!(response_text(r#"{"promptFeedback": {}}"#).is_err());
        assert!(response_text("not json").is_err());
    }

    #[test]
    fn request_serializes_inline_image_then_prompt() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Image {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: "AAAA".to_string(),
                        },
                    },
                    Part::Text { text: PROMPT },
                ],
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[0]["inline_data"]["data"], "AAAA");
        assert_eq!(parts[1]["text"], PROMPT);
    }

    #[test]
    fn background_request_delivers_answer() {
        let canned: Arc<dyn Recognizer> = Arc::new(Canned::new(Ok("4")));
        let pending = PendingRecognition::spawn(raster(), canned, || {});
        assert_eq!(pending.wait(), Some("4".to_string()));
    }
}
