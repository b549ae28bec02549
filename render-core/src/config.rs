//! # Gateway configuration
//!
//! Two layers, same as the rest of the workspace:
//! - [`RenderConfig`]: a flat string key/value store (`queue.name`, `http.port`, ...)
//!   filled from the process environment
//! - [`GatewaySettings`]: the typed view built from a snapshot, with defaults
//!
//! Known variables map to dotted keys (`REDIS_URL` -> `queue.url`). Any
//! other key can be set with the `RENDER__` prefix, where `__` separates
//! segments: `RENDER__HTTP__PORT=9000` sets `http.port`.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use render_queue::EnqueuePolicy;

use crate::payload::ModePolicy;

pub const ENV_PREFIX: &str = "RENDER__";

/// Environment variable -> config key
pub const ENV_KEYS: &[(&str, &str)] = &[
    ("HTTP_HOST", "http.host"),
    ("HTTP_PORT", "http.port"),
    ("STORE_BACKEND", "store.backend"),
    ("REDIS_URL", "queue.url"),
    ("QUEUE_NAME", "queue.name"),
    ("QUEUE_KEY_PREFIX", "queue.key_prefix"),
    ("JOB_TIMEOUT_SECS", "queue.job_timeout_secs"),
    ("RESULT_TTL_SECS", "queue.result_ttl_secs"),
    ("FAILURE_TTL_SECS", "queue.failure_ttl_secs"),
    ("RENDER_MODES", "render.modes"),
    ("RENDER_DEFAULT_MODE", "render.default_mode"),
    ("LOG_FORMAT", "log.format"),
];

pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 8000;
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_QUEUE_NAME: &str = "default";
pub const DEFAULT_KEY_PREFIX: &str = "render";

#[derive(Debug, Default, Clone)]
pub struct RenderConfig {
    values: HashMap<String, String>,
}

impl RenderConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Load from the current process environment
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Load from any list of variables. Later entries win, and prefixed
    /// `RENDER__` variables win over the well-known names.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::new();
        let mut prefixed = Vec::new();

        for (key, value) in vars {
            let key = key.as_ref();
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                prefixed.push((normalized, value.into()));
            } else if let Some((_, cfg_key)) = ENV_KEYS.iter().find(|(env, _)| *env == key) {
                config.set(*cfg_key, value);
            }
        }

        for (key, value) in prefixed {
            config.set(key, value);
        }
        config
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn snapshot(&self) -> RenderConfigSnapshot {
        RenderConfigSnapshot::new(self.values.clone())
    }
}

/// Read-only copy of the config, passed to whatever builds typed settings
#[derive(Debug, Clone, Default)]
pub struct RenderConfigSnapshot {
    map: HashMap<String, String>,
}

impl RenderConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    /// Blank values count as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map
            .get(key)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        self.get(key)
            .map(|v| {
                v.parse::<u64>()
                    .with_context(|| format!("config key {key} must be a non-negative integer, got {v:?}"))
            })
            .transpose()
    }

    pub fn get_u16(&self, key: &str) -> Result<Option<u16>> {
        self.get(key)
            .map(|v| {
                v.parse::<u16>()
                    .with_context(|| format!("config key {key} must be a port number, got {v:?}"))
            })
            .transpose()
    }

    /// Comma-separated list; empty items are skipped
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Memory,
}

impl StoreKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown store backend {other:?} (expected redis or memory)")),
        }
    }
}

/// Everything the submission side needs to address the queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSettings {
    pub url: String,
    pub name: String,
    pub key_prefix: String,
    pub policy: EnqueuePolicy,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_REDIS_URL.to_string(),
            name: DEFAULT_QUEUE_NAME.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            policy: EnqueuePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub http_host: String,
    pub http_port: u16,
    pub store: StoreKind,
    pub queue: QueueSettings,
    pub modes: ModePolicy,
    pub log_format: LogFormat,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            store: StoreKind::Redis,
            queue: QueueSettings::default(),
            modes: ModePolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl GatewaySettings {
    /// Build typed settings. Malformed values fail here, at startup, rather
    /// than at the first request.
    pub fn from_snapshot(cfg: &RenderConfigSnapshot) -> Result<Self> {
        let defaults = Self::default();
        let policy_defaults = EnqueuePolicy::default();

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            Ok(cfg.get_u64(key)?.map(Duration::from_secs).unwrap_or(default))
        };

        let policy = EnqueuePolicy {
            job_timeout: secs("queue.job_timeout_secs", policy_defaults.job_timeout)?,
            result_ttl: secs("queue.result_ttl_secs", policy_defaults.result_ttl)?,
            failure_ttl: secs("queue.failure_ttl_secs", policy_defaults.failure_ttl)?,
        };

        let queue = QueueSettings {
            url: cfg.get_string("queue.url").unwrap_or(defaults.queue.url),
            name: cfg.get_string("queue.name").unwrap_or(defaults.queue.name),
            key_prefix: cfg
                .get_string("queue.key_prefix")
                .unwrap_or(defaults.queue.key_prefix),
            policy,
        };

        let modes = match (cfg.get_list("render.modes"), cfg.get("render.default_mode")) {
            (None, None) => ModePolicy::default(),
            (allowed, default_mode) => {
                let base = ModePolicy::default();
                ModePolicy::new(
                    allowed.unwrap_or_else(|| base.allowed().to_vec()),
                    default_mode.unwrap_or(base.default_mode()),
                )?
            }
        };

        let store = match cfg.get("store.backend") {
            Some(raw) => StoreKind::parse(raw)?,
            None => defaults.store,
        };

        let log_format = match cfg.get("log.format").map(str::to_ascii_lowercase).as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("unknown log format {other:?} (expected pretty or json)"),
        };

        Ok(Self {
            http_host: cfg.get_string("http.host").unwrap_or(defaults.http_host),
            http_port: cfg.get_u16("http.port")?.unwrap_or(defaults.http_port),
            store,
            queue,
            modes,
            log_format,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_snapshot(&RenderConfig::from_env().snapshot())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
