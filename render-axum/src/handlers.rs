use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{StatusCode, Uri},
    Json,
};
use render_core::{HealthView, JobRequest, RenderError, StatusView, SubmissionResult};

use crate::error::map_json_rejection;
use crate::{RenderAxumError, RenderState};

pub async fn health(State(state): State<RenderState>) -> (StatusCode, Json<HealthView>) {
    let view = state.health.check().await;
    let status = if view.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(view))
}

pub async fn render(
    State(state): State<RenderState>,
    body: Result<Json<JobRequest>, JsonRejection>,
) -> Result<Json<SubmissionResult>, RenderAxumError> {
    let Json(request) = body.map_err(map_json_rejection)?;
    let res = state.submission.submit_request(request, &state.modes).await?;
    Ok(Json(res))
}

pub async fn job_status(
    State(state): State<RenderState>,
    Path(job_id): Path<String>,
) -> Result<Json<StatusView>, RenderAxumError> {
    let view = state.status.get_status(&job_id).await?;
    Ok(Json(view))
}

pub async fn fallback(uri: Uri) -> RenderAxumError {
    RenderError::not_found(format!("no route for {}", uri.path())).into()
}
