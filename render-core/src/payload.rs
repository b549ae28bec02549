//! Payload normalization.
//!
//! [`JobRequest`] is whatever the caller sent. [`JobPayload`] is the closed,
//! fully defaulted set of named arguments the worker receives. The mapping
//! never fails: missing or invalid optional fields are defaulted, and
//! emptiness of `files` is checked by the submission service.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const DEFAULT_MODES: [&str; 3] = ["human", "clean", "blooper"];
pub const DEFAULT_MODE: &str = "human";
pub const DEFAULT_PORTRAIT: bool = true;
pub const DEFAULT_MAX_DURATION: f64 = 220.0;
pub const DEFAULT_MIN_CLIP_SECONDS: f64 = 1.5;
pub const DEFAULT_MAX_CLIP_SECONDS: f64 = 3.3;
pub const DEFAULT_AUDIO: &str = "original";
pub const DEFAULT_OUTPUT_PREFIX: &str = "editdna/outputs";

/// Inbound render request, untrusted. Unknown fields are ignored.
///
/// Only `files` is strict. A wrong-typed optional field decodes as `None`
/// and is defaulted later by [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawJobRequest")]
pub struct JobRequest {
    pub session_id: Option<String>,

    /// Source video references, in order. Missing means empty.
    pub files: Vec<String>,

    pub file_urls: Option<Vec<String>>,
    pub portrait: Option<bool>,
    pub max_duration: Option<f64>,
    pub min_clip_seconds: Option<f64>,
    pub max_clip_seconds: Option<f64>,
    pub audio: Option<String>,
    pub output_prefix: Option<String>,
    pub mode: Option<String>,
    pub funnel_counts: Option<Value>,
}

impl JobRequest {
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Wire shape of [`JobRequest`]. Legacy names are separate fields so that a
/// body carrying both spellings still decodes.
#[derive(Deserialize)]
struct RawJobRequest {
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    session_id: Option<Value>,
    #[serde(default)]
    file_urls: Option<Value>,
    #[serde(default)]
    portrait: Option<Value>,
    #[serde(default)]
    max_duration: Option<Value>,
    #[serde(default)]
    max_duration_seconds: Option<Value>,
    #[serde(default)]
    min_clip_seconds: Option<Value>,
    #[serde(default)]
    max_clip_seconds: Option<Value>,
    #[serde(default)]
    audio: Option<Value>,
    #[serde(default)]
    output_prefix: Option<Value>,
    #[serde(default)]
    s3_prefix: Option<Value>,
    #[serde(default)]
    mode: Option<Value>,
    #[serde(default)]
    funnel_counts: Option<Value>,
}

// The current name wins over the legacy one when both are usable.
impl From<RawJobRequest> for JobRequest {
    fn from(raw: RawJobRequest) -> Self {
        Self {
            session_id: as_string(raw.session_id),
            files: raw.files,
            file_urls: as_string_list(raw.file_urls),
            portrait: raw.portrait.and_then(|v| v.as_bool()),
            max_duration: as_number(raw.max_duration).or_else(|| as_number(raw.max_duration_seconds)),
            min_clip_seconds: as_number(raw.min_clip_seconds),
            max_clip_seconds: as_number(raw.max_clip_seconds),
            audio: as_string(raw.audio),
            output_prefix: as_string(raw.output_prefix).or_else(|| as_string(raw.s3_prefix)),
            mode: as_string(raw.mode),
            funnel_counts: raw.funnel_counts.filter(|v| !v.is_null()),
        }
    }
}

fn as_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn as_number(value: Option<Value>) -> Option<f64> {
    value?.as_f64()
}

fn as_string_list(value: Option<Value>) -> Option<Vec<String>> {
    match value? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

/// Canonical named arguments for the render handler, schema version 1.
///
/// Decoding rejects unknown fields, so nothing slips across the queue
/// boundary that this type does not name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobPayload {
    pub session_id: String,
    pub files: Vec<String>,
    pub file_urls: Vec<String>,
    pub portrait: bool,
    pub max_duration: f64,
    pub min_clip_seconds: f64,
    pub max_clip_seconds: f64,
    pub audio: String,
    pub s3_prefix: String,
    pub mode: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funnel_counts: Option<Value>,
}

impl JobPayload {
    pub fn output_prefix(&self) -> &str {
        &self.s3_prefix
    }

    /// Encode as the handler's keyword arguments
    pub fn to_kwargs(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Decode the keyword arguments recorded on a job
    pub fn from_kwargs(kwargs: &Value) -> serde_json::Result<Self> {
        Self::deserialize(kwargs)
    }
}

/// The closed set of render modes a deployment accepts, plus the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModePolicy {
    allowed: Vec<String>,
    default: String,
}

impl ModePolicy {
    /// Modes are compared lower-cased; the default must be one of `allowed`.
    pub fn new<I, S>(allowed: I, default: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut modes: Vec<String> = Vec::new();
        for mode in allowed {
            let mode = mode.as_ref().trim().to_lowercase();
            if !mode.is_empty() && !modes.contains(&mode) {
                modes.push(mode);
            }
        }
        if modes.is_empty() {
            bail!("at least one render mode must be allowed");
        }

        let default = default.into().trim().to_lowercase();
        if !modes.contains(&default) {
            bail!("default mode {default:?} is not one of {modes:?}");
        }

        Ok(Self {
            allowed: modes,
            default,
        })
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn default_mode(&self) -> &str {
        &self.default
    }

    /// Lower-case `raw` and keep it if allowed; otherwise the default. Never fails.
    pub fn resolve(&self, raw: Option<&str>) -> String {
        raw.map(|m| m.trim().to_lowercase())
            .filter(|m| self.allowed.contains(m))
            .unwrap_or_else(|| self.default.clone())
    }
}

impl Default for ModePolicy {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_MODES.iter().map(|m| m.to_string()).collect(),
            default: DEFAULT_MODE.to_string(),
        }
    }
}

/// Fresh session token: 32 lowercase hex characters from a v4 UUID
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Canonicalize a request. Deterministic apart from a synthesized session id.
pub fn normalize(request: JobRequest, modes: &ModePolicy) -> JobPayload {
    normalize_with(request, modes, new_session_id)
}

/// Same as [`normalize`], with the session id source supplied by the caller
pub fn normalize_with<F>(request: JobRequest, modes: &ModePolicy, session_source: F) -> JobPayload
where
    F: FnOnce() -> String,
{
    let session_id = match request.session_id {
        Some(id) if !id.is_empty() => id,
        _ => session_source(),
    };

    JobPayload {
        session_id,
        mode: modes.resolve(request.mode.as_deref()),
        files: request.files,
        file_urls: request.file_urls.unwrap_or_default(),
        portrait: request.portrait.unwrap_or(DEFAULT_PORTRAIT),
        max_duration: request.max_duration.unwrap_or(DEFAULT_MAX_DURATION),
        min_clip_seconds: request.min_clip_seconds.unwrap_or(DEFAULT_MIN_CLIP_SECONDS),
        max_clip_seconds: request.max_clip_seconds.unwrap_or(DEFAULT_MAX_CLIP_SECONDS),
        audio: request.audio.unwrap_or_else(|| DEFAULT_AUDIO.to_string()),
        s3_prefix: request
            .output_prefix
            .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
        funnel_counts: request.funnel_counts,
    }
}
