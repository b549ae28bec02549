use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use render_core::RenderError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct RenderAxumError(pub anyhow::Error);

impl From<anyhow::Error> for RenderAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<RenderError> for RenderAxumError {
    fn from(e: RenderError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for RenderAxumError {
    fn into_response(self) -> Response {
        // Structured errors keep their kind even when wrapped in anyhow context
        let render = match RenderError::from_anyhow(&self.0) {
            Some(render) => render.sanitize_for_client(),
            None => RenderError::general_error(self.0.to_string()),
        };

        if render.code() >= 500 {
            error!(error = %format!("{:#}", self.0), code = render.code(), "request failed");
        }

        let status = StatusCode::from_u16(render.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(render.to_json())).into_response()
    }
}

pub(crate) fn map_json_rejection(rejection: JsonRejection) -> RenderAxumError {
    RenderError::validation("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.body_text()]}))
        .into()
}
