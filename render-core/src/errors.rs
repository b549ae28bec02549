//! # Errors
//!
//! Structured gateway errors. Goals:
//! - one status code and class name per kind
//! - can be carried through `anyhow::Error` and recovered with a downcast
//! - transport-agnostic (the HTTP crate decides how to serialize)
//!
//! A job that *failed on the worker* is not an error here. It is reported as a
//! normal [`StatusView`](crate::StatusView) with `ok: false`.

use std::fmt;

use anyhow::Error as AnyError;
use render_queue::QueueError;
use serde_json::Value;

/// A convenience result type for gateway APIs.
pub type RenderResult<T> = std::result::Result<T, AnyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,       // 400
    NotFound,         // 404
    GeneralError,     // 500
    QueueUnavailable, // 503
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::GeneralError => 500,
            ErrorKind::QueueUnavailable => 503,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::QueueUnavailable => "QueueUnavailable",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation-error",
            ErrorKind::NotFound => "not-found",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::QueueUnavailable => "queue-unavailable",
        }
    }

    /// Whether the caller may reasonably retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::QueueUnavailable)
    }
}

/// A structured gateway error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct RenderError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl RenderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find a `RenderError` anywhere in an `anyhow` chain.
    pub fn from_anyhow(err: &AnyError) -> Option<&RenderError> {
        err.chain().find_map(|e| e.downcast_ref::<RenderError>())
    }

    /// Client-safe copy: drops the inner `source`
    pub fn sanitize_for_client(&self) -> RenderError {
        RenderError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    pub fn to_json(&self) -> Value {
        use serde_json::json;

        let mut base = json!({
            "ok": false,
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    // ---- Constructors ----

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn queue_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::QueueUnavailable, msg)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Store failures: connectivity problems stay distinguishable from everything else
impl From<QueueError> for RenderError {
    fn from(err: QueueError) -> Self {
        let kind = if err.is_unavailable() {
            ErrorKind::QueueUnavailable
        } else {
            ErrorKind::GeneralError
        };
        RenderError::new(kind, err.to_string()).with_source(AnyError::new(err))
    }
}

/// Convenience helper for "bail with RenderError".
#[macro_export]
macro_rules! bail_render {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::RenderError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::RenderError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_shape_carries_code_and_class() {
        let err = RenderError::validation("files must not be empty")
            .with_errors(json!({"files": ["required"]}));
        let body = err.to_json();

        assert_eq!(body["ok"], json!(false));
        assert_eq!(body["name"], "ValidationError");
        assert_eq!(body["code"], 400);
        assert_eq!(body["className"], "validation-error");
        assert_eq!(body["errors"], json!({"files": ["required"]}));
        assert!(body.get("data").is_none());
    }

    #[test]
    fn queue_errors_keep_unavailable_distinct() {
        let down: RenderError = QueueError::unavailable("connection refused").into();
        assert_eq!(down.kind, ErrorKind::QueueUnavailable);
        assert_eq!(down.code(), 503);
        assert!(down.kind.is_retryable());
        assert!(down.message.contains("connection refused"));

        let corrupt: RenderError = QueueError::corrupt("j1", "missing kwargs").into();
        assert_eq!(corrupt.kind, ErrorKind::GeneralError);
        assert!(!corrupt.kind.is_retryable());
    }

    #[test]
    fn downcast_survives_context() {
        let err = RenderError::not_found("job x").into_anyhow().context("while polling");
        let found = RenderError::from_anyhow(&err).unwrap();
        assert_eq!(found.kind, ErrorKind::NotFound);
    }

    #[test]
    fn client_copy_drops_source() {
        let err: RenderError = QueueError::unavailable("connection refused").into();
        assert!(std::error::Error::source(&err).is_some());

        let client = err.sanitize_for_client();
        assert!(std::error::Error::source(&client).is_none());
        assert_eq!(client.to_json(), err.to_json());
    }

    #[test]
    fn bail_macro_returns_structured_error() {
        fn check(files: &[String]) -> RenderResult<()> {
            if files.is_empty() {
                bail_render!(validation, "files must contain at least {} entry", 1);
            }
            Ok(())
        }

        let err = check(&[]).unwrap_err();
        assert_eq!(RenderError::from_anyhow(&err).unwrap().code(), 400);
        assert!(check(&["a".to_string()]).is_ok());
    }
}
