use std::env;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use groupshot_contracts::catalog::{AspectRatio, PoseId, StyleSelection};
use groupshot_contracts::directive::{build_edit_directive, build_group_directive};
use groupshot_contracts::events::SessionEvents;
use groupshot_contracts::intake::PersonImage;
use groupshot_contracts::receipts::{build_receipt, write_receipt, ComposeReceipt};
use image::{Rgb, RgbImage};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const EXPORT_FILE_NAME: &str = "group-photo.png";
const REQUEST_TIMEOUT_SECONDS: u64 = 90;

/// Error-body fragment Gemini returns when the caller's key cannot reach the
/// requested model; recognized and surfaced as the auth-required condition.
const AUTH_ERROR_SIGNATURE: &str = "requested entity was not found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub directive: String,
    pub aspect_ratio: AspectRatio,
    /// Portraits in intake order; the order binds identities and is
    /// forwarded to the model untouched.
    pub images: Vec<InlineImage>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct EditRequest {
    pub directive: String,
    pub image: InlineImage,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub images: Vec<ImagePayload>,
    pub response_summary: Map<String, Value>,
}

pub trait ImageModel: Send + Sync {
    fn name(&self) -> &str;
    fn compose(&self, request: &ComposeRequest) -> Result<ModelResponse>;
    fn edit(&self, request: &EditRequest) -> Result<ModelResponse>;
}

/// Credential/session collaborator. Queried before every remote call and
/// asked to (re)acquire a credential when the auth-required condition shows
/// up mid-session.
pub trait CredentialGate: Send + Sync {
    fn has_credential(&self) -> bool;
    fn request_credential(&self) -> Result<()>;
}

/// Reads the key from the environment; cannot acquire one interactively.
pub struct EnvCredentialGate;

impl CredentialGate for EnvCredentialGate {
    fn has_credential(&self) -> bool {
        GeminiModel::api_key().is_some()
    }

    fn request_credential(&self) -> Result<()> {
        bail!("GEMINI_API_KEY or GOOGLE_API_KEY not set")
    }
}

pub struct GeminiModel {
    api_base: String,
    http: HttpClient,
}

impl Default for GeminiModel {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiModel {
    pub fn new() -> Self {
        Self {
            api_base: env::var("GEMINI_API_BASE")
                .ok()
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            http: HttpClient::new(),
        }
    }

    pub fn api_key() -> Option<String> {
        non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"))
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn default_safety_settings() -> Vec<Value> {
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| {
            json!({
                "category": category,
                "threshold": "OFF",
            })
        })
        .collect()
    }

    fn generate_content_payload(parts: Vec<Value>, aspect_ratio: Option<&str>) -> Value {
        let mut generation_config = Map::new();
        generation_config.insert(
            "responseModalities".to_string(),
            Value::Array(vec![Value::String("IMAGE".to_string())]),
        );
        if let Some(aspect_ratio) = aspect_ratio {
            let mut image_config = Map::new();
            image_config.insert(
                "aspectRatio".to_string(),
                Value::String(aspect_ratio.to_string()),
            );
            generation_config.insert("imageConfig".to_string(), Value::Object(image_config));
        }

        json!({
            "contents": [{
                "role": "user",
                "parts": parts,
            }],
            "generationConfig": Value::Object(generation_config),
            "safetySettings": Value::Array(Self::default_safety_settings()),
        })
    }

    fn post_generate(&self, model: &str, payload: &Value) -> Result<Value> {
        let Some(api_key) = Self::api_key() else {
            bail!("GEMINI_API_KEY or GOOGLE_API_KEY not set");
        };
        let endpoint = self.endpoint_for_model(model);
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key.as_str())])
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .json(payload)
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        response_json_or_error("Gemini", response)
    }

    fn extract_image_items(response_payload: &Value) -> Result<Vec<ImagePayload>> {
        let candidates = response_payload
            .get("candidates")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut out = Vec::new();

        for candidate in candidates {
            let parts = candidate
                .get("content")
                .and_then(Value::as_object)
                .and_then(|content| content.get("parts"))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for part in parts {
                let inline = part
                    .get("inlineData")
                    .or_else(|| part.get("inline_data"))
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                let data = inline
                    .get("data")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if data.is_empty() {
                    continue;
                }
                let bytes = BASE64
                    .decode(data.as_bytes())
                    .context("Gemini image base64 decode failed")?;
                let mime_type = inline
                    .get("mimeType")
                    .or_else(|| inline.get("mime_type"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                out.push(ImagePayload { bytes, mime_type });
            }
        }

        Ok(out)
    }

    fn response_summary(response_payload: &Value) -> Map<String, Value> {
        map_object(json!({
            "candidates": response_payload
                .get("candidates")
                .and_then(Value::as_array)
                .map(|rows| rows.len())
                .unwrap_or(0),
            "usage_metadata": response_payload
                .get("usageMetadata")
                .cloned()
                .unwrap_or(Value::Null),
        }))
    }
}

impl ImageModel for GeminiModel {
    fn name(&self) -> &str {
        "gemini"
    }

    fn compose(&self, request: &ComposeRequest) -> Result<ModelResponse> {
        let mut parts: Vec<Value> = request.images.iter().map(inline_image_part).collect();
        parts.push(json!({ "text": request.directive }));
        let payload =
            Self::generate_content_payload(parts, Some(request.aspect_ratio.as_str()));
        let response_payload = self.post_generate(&request.model, &payload)?;
        Ok(ModelResponse {
            images: Self::extract_image_items(&response_payload)?,
            response_summary: Self::response_summary(&response_payload),
        })
    }

    fn edit(&self, request: &EditRequest) -> Result<ModelResponse> {
        let parts = vec![
            inline_image_part(&request.image),
            json!({ "text": request.directive }),
        ];
        let payload = Self::generate_content_payload(parts, None);
        let response_payload = self.post_generate(&request.model, &payload)?;
        Ok(ModelResponse {
            images: Self::extract_image_items(&response_payload)?,
            response_summary: Self::response_summary(&response_payload),
        })
    }
}

/// Offline provider: renders a solid-color placeholder whose color is a
/// digest of the directive, so identical requests yield identical bytes.
pub struct DryrunModel;

impl ImageModel for DryrunModel {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn compose(&self, request: &ComposeRequest) -> Result<ModelResponse> {
        let (width, height) = request.aspect_ratio.render_dims();
        let bytes = render_placeholder(width, height, &request.directive)?;
        Ok(ModelResponse {
            images: vec![ImagePayload {
                bytes,
                mime_type: Some("image/png".to_string()),
            }],
            response_summary: map_object(json!({ "endpoint": "dryrun-native" })),
        })
    }

    fn edit(&self, request: &EditRequest) -> Result<ModelResponse> {
        let (width, height) = image::load_from_memory(&request.image.bytes)
            .map(|decoded| (decoded.width(), decoded.height()))
            .unwrap_or((1024, 1024));
        let bytes = render_placeholder(width, height, &request.directive)?;
        Ok(ModelResponse {
            images: vec![ImagePayload {
                bytes,
                mime_type: Some("image/png".to_string()),
            }],
            response_summary: map_object(json!({ "endpoint": "dryrun-native" })),
        })
    }
}

/// The two failure shapes a caller can see from a generation or edit call.
/// `AuthRequired` never carries the raw provider text; it is a signal to
/// re-acquire a credential, not a message to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    AuthRequired,
    Remote(String),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::AuthRequired => write!(f, "AUTH_REQUIRED"),
            GenerateError::Remote(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for GenerateError {}

pub fn classify_generate_error(err: &anyhow::Error) -> GenerateError {
    let text = error_chain_text(err, 512);
    if text.to_ascii_lowercase().contains(AUTH_ERROR_SIGNATURE) {
        GenerateError::AuthRequired
    } else {
        GenerateError::Remote(text)
    }
}

/// Drives one session's remote calls: builds directives, invokes the image
/// model, records artifacts and receipts, and emits session events. Does not
/// queue or cancel; callers hold the single-flight guard.
pub struct ComposeEngine {
    model: Box<dyn ImageModel>,
    credentials: Box<dyn CredentialGate>,
    events: SessionEvents,
    out_dir: PathBuf,
    model_name: String,
}

impl ComposeEngine {
    pub fn new(
        out_dir: impl Into<PathBuf>,
        events_path: impl Into<PathBuf>,
        model: Box<dyn ImageModel>,
        credentials: Box<dyn CredentialGate>,
        model_name: Option<String>,
    ) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
        let session_id = format!("session-{}", timestamp_millis());
        let events = SessionEvents::new(events_path.into(), session_id);
        let engine = Self {
            model,
            credentials,
            events,
            out_dir,
            model_name: model_name.unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
        };
        engine.events.emit(
            "session_started",
            map_object(json!({
                "out_dir": engine.out_dir.to_string_lossy().to_string(),
                "provider": engine.model.name(),
                "model": engine.model_name,
            })),
        )?;
        Ok(engine)
    }

    pub fn events(&self) -> SessionEvents {
        self.events.clone()
    }

    pub fn provider_name(&self) -> &str {
        self.model.name()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// One composition attempt. Credential acquisition runs first; failures
    /// are classified so the caller sees either the auth-required signal or
    /// the verbatim remote message. No automatic retry either way.
    pub fn generate(
        &self,
        images: &[PersonImage],
        pose: PoseId,
        style: &StyleSelection,
    ) -> Result<ImagePayload, GenerateError> {
        if !self.ensure_credential() {
            return Err(GenerateError::AuthRequired);
        }
        match self.run_generate(images, pose, style) {
            Ok(payload) => Ok(payload),
            Err(err) => Err(self.record_failure("generation_failed", &err)),
        }
    }

    /// One refinement attempt against the current result. Blank instructions
    /// resolve to `Ok(None)` without touching the model.
    pub fn edit(
        &self,
        current: &ImagePayload,
        instruction: &str,
    ) -> Result<Option<ImagePayload>, GenerateError> {
        if instruction.trim().is_empty() {
            return Ok(None);
        }
        if !self.ensure_credential() {
            return Err(GenerateError::AuthRequired);
        }
        match self.run_edit(current, instruction) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) => Err(self.record_failure("edit_failed", &err)),
        }
    }

    pub fn export(&self, result: &ImagePayload) -> Result<PathBuf> {
        let path = self.out_dir.join(EXPORT_FILE_NAME);
        fs::write(&path, &result.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        self.events.emit(
            "artifact_exported",
            map_object(json!({
                "image_path": path.to_string_lossy().to_string(),
                "byte_len": result.bytes.len(),
            })),
        )?;
        Ok(path)
    }

    fn ensure_credential(&self) -> bool {
        if self.credentials.has_credential() {
            return true;
        }
        let _ = self.events.emit("auth_required", Map::new());
        if self.credentials.request_credential().is_err() {
            return false;
        }
        self.credentials.has_credential()
    }

    fn record_failure(&self, event_type: &str, err: &anyhow::Error) -> GenerateError {
        let failure = classify_generate_error(err);
        let payload = match &failure {
            GenerateError::AuthRequired => {
                let _ = self.events.emit("auth_required", Map::new());
                return failure;
            }
            GenerateError::Remote(message) => map_object(json!({ "error": message })),
        };
        let _ = self.events.emit(event_type, payload);
        failure
    }

    fn run_generate(
        &self,
        images: &[PersonImage],
        pose: PoseId,
        style: &StyleSelection,
    ) -> Result<ImagePayload> {
        let directive = build_group_directive(images.len(), pose, style);
        self.events.emit(
            "generation_started",
            map_object(json!({
                "person_count": images.len(),
                "pose": pose.as_str(),
                "scene": style.scene,
                "aspect_ratio": style.aspect_ratio.as_str(),
            })),
        )?;

        let request = ComposeRequest {
            directive: directive.clone(),
            aspect_ratio: style.aspect_ratio,
            images: images
                .iter()
                .map(|person| InlineImage {
                    mime_type: person.mime_type.clone(),
                    bytes: person.bytes.clone(),
                })
                .collect(),
            model: self.model_name.clone(),
        };
        let response = self.model.compose(&request)?;
        let payload = first_image_payload(response.images)?;

        let receipt = ComposeReceipt {
            mode: "generate".to_string(),
            person_count: images.len() as u64,
            pose: Some(pose.as_str().to_string()),
            scene: Some(style.scene.clone()),
            aspect_ratio: Some(style.aspect_ratio.as_str().to_string()),
            preserve_outfits: Some(style.preserve_outfits),
            shared_background: Some(style.shared_background),
            directive,
            provider: self.model.name().to_string(),
            model: self.model_name.clone(),
        };
        let (image_path, receipt_path) =
            self.record_artifact(&receipt, &response.response_summary, &payload)?;
        self.events.emit(
            "generation_finished",
            map_object(json!({
                "image_path": image_path.to_string_lossy().to_string(),
                "receipt_path": receipt_path.to_string_lossy().to_string(),
                "byte_len": payload.bytes.len(),
            })),
        )?;
        Ok(payload)
    }

    fn run_edit(&self, current: &ImagePayload, instruction: &str) -> Result<ImagePayload> {
        let directive = build_edit_directive(instruction);
        let request = EditRequest {
            directive: directive.clone(),
            image: InlineImage {
                mime_type: current
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "image/png".to_string()),
                bytes: current.bytes.clone(),
            },
            model: self.model_name.clone(),
        };
        let response = self.model.edit(&request)?;
        let payload = first_image_payload(response.images)?;

        let receipt = ComposeReceipt {
            mode: "edit".to_string(),
            person_count: 1,
            pose: None,
            scene: None,
            aspect_ratio: None,
            preserve_outfits: None,
            shared_background: None,
            directive,
            provider: self.model.name().to_string(),
            model: self.model_name.clone(),
        };
        let (image_path, receipt_path) =
            self.record_artifact(&receipt, &response.response_summary, &payload)?;
        self.events.emit(
            "edit_applied",
            map_object(json!({
                "image_path": image_path.to_string_lossy().to_string(),
                "receipt_path": receipt_path.to_string_lossy().to_string(),
                "byte_len": payload.bytes.len(),
            })),
        )?;
        Ok(payload)
    }

    fn record_artifact(
        &self,
        receipt: &ComposeReceipt,
        response_summary: &Map<String, Value>,
        payload: &ImagePayload,
    ) -> Result<(PathBuf, PathBuf)> {
        let stamp = timestamp_millis();
        let ext = output_extension_from_mime(payload.mime_type.as_deref());
        let image_path = self.out_dir.join(format!("artifact-{stamp}.{ext}"));
        fs::write(&image_path, &payload.bytes)
            .with_context(|| format!("failed to write {}", image_path.display()))?;

        let checksum = hex::encode(Sha256::digest(&payload.bytes));
        let receipt_path = self.out_dir.join(format!("receipt-{stamp}.json"));
        let receipt_payload = build_receipt(
            receipt,
            response_summary,
            &image_path,
            &checksum,
            payload.bytes.len() as u64,
        );
        write_receipt(&receipt_path, &receipt_payload)?;
        Ok((image_path, receipt_path))
    }
}

fn first_image_payload(images: Vec<ImagePayload>) -> Result<ImagePayload> {
    let Some(first) = images.into_iter().next() else {
        bail!("no image data found in the response");
    };
    Ok(first)
}

/// Rotating status lines shown while a request is in flight. Cosmetic; the
/// resolved or rejected outcome is the only authoritative completion signal.
pub const PROGRESS_STATUS_MESSAGES: &[&str] = &[
    "Analyzing reference faces...",
    "Extracting identity features...",
    "Warming up the rendering pipeline...",
    "Arranging composition based on pose...",
    "Calculating lighting and shadows...",
    "Synthesizing 3D environment...",
    "Rendering textures and details...",
    "Finalizing high-speed composite...",
];

pub fn progress_status(elapsed: Duration) -> &'static str {
    let idx = (elapsed.as_secs() / 3) as usize % PROGRESS_STATUS_MESSAGES.len();
    PROGRESS_STATUS_MESSAGES[idx]
}

/// Estimated completion percentage from elapsed time alone: a fast ramp to
/// 80, then a crawl capped at 99.
pub fn progress_percent(elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    let pct = if secs <= 12.0 {
        secs * (80.0 / 12.0)
    } else {
        80.0 + (secs - 12.0) * 0.8
    };
    pct.min(99.0)
}

fn inline_image_part(image: &InlineImage) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": BASE64.encode(&image.bytes),
        }
    })
}

fn render_placeholder(width: u32, height: u32, directive: &str) -> Result<Vec<u8>> {
    let digest = Sha256::digest(directive.as_bytes());
    let mut canvas = RgbImage::new(width, height);
    for pixel in canvas.pixels_mut() {
        *pixel = Rgb([digest[0], digest[1], digest[2]]);
    }
    let mut out = Cursor::new(Vec::new());
    canvas
        .write_to(&mut out, image::ImageFormat::Png)
        .context("failed to encode placeholder image")?;
    Ok(out.into_inner())
}

fn output_extension_from_mime(mime: Option<&str>) -> &'static str {
    if let Some(mime) = mime {
        let lowered = mime.to_ascii_lowercase();
        if lowered.contains("jpeg") || lowered.contains("jpg") {
            return "jpg";
        }
        if lowered.contains("webp") {
            return "webp";
        }
    }
    "png"
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
