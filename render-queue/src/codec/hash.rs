use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{EnqueuePolicy, JobId, JobMessage, JobRecord, JobStatus, QueueError, QueueResult};

/// Flat field/value pairs as written to a store hash
pub type HashFields = Vec<(&'static str, String)>;

pub const FIELD_HANDLER: &str = "handler";
pub const FIELD_ORIGIN: &str = "origin";
pub const FIELD_SCHEMA_VERSION: &str = "schema_version";
pub const FIELD_KWARGS: &str = "kwargs";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_ENQUEUED_AT: &str = "enqueued_at";
pub const FIELD_STARTED_AT: &str = "started_at";
pub const FIELD_ENDED_AT: &str = "ended_at";
pub const FIELD_TIMEOUT: &str = "timeout";
pub const FIELD_RESULT_TTL: &str = "result_ttl";
pub const FIELD_FAILURE_TTL: &str = "failure_ttl";
pub const FIELD_RESULT: &str = "result";
pub const FIELD_EXC_INFO: &str = "exc_info";
pub const FIELD_META: &str = "meta";

/// Encode a record into hash fields. Absent optionals are omitted.
pub fn encode_record(record: &JobRecord) -> QueueResult<HashFields> {
    let message = &record.message;
    let policy = &message.policy;

    let mut fields: HashFields = vec![
        (FIELD_HANDLER, message.handler.clone()),
        (FIELD_ORIGIN, message.queue.clone()),
        (FIELD_SCHEMA_VERSION, message.schema_version.to_string()),
        (FIELD_KWARGS, serde_json::to_string(&message.kwargs)?),
        (FIELD_STATUS, record.status.as_str().to_string()),
        (FIELD_ENQUEUED_AT, record.enqueued_at.to_rfc3339()),
        (FIELD_TIMEOUT, policy.job_timeout.as_secs().to_string()),
        (FIELD_RESULT_TTL, policy.result_ttl.as_secs().to_string()),
        (FIELD_FAILURE_TTL, policy.failure_ttl.as_secs().to_string()),
    ];

    if let Some(at) = record.started_at {
        fields.push((FIELD_STARTED_AT, at.to_rfc3339()));
    }
    if let Some(at) = record.ended_at {
        fields.push((FIELD_ENDED_AT, at.to_rfc3339()));
    }
    if let Some(result) = &record.result {
        fields.push((FIELD_RESULT, serde_json::to_string(result)?));
    }
    if let Some(exc_info) = &record.exc_info {
        fields.push((FIELD_EXC_INFO, exc_info.clone()));
    }
    if !record.meta.is_empty() {
        fields.push((FIELD_META, serde_json::to_string(&record.meta)?));
    }

    Ok(fields)
}

/// Decode a record from the raw hash. Unknown fields are ignored so the
/// worker may add bookkeeping of its own.
pub fn decode_record(id: &JobId, raw: &HashMap<String, String>) -> QueueResult<JobRecord> {
    let corrupt = |reason: String| QueueError::corrupt(id.as_str(), reason);

    let handler = raw
        .get(FIELD_HANDLER)
        .ok_or_else(|| corrupt("missing handler".into()))?
        .clone();
    let kwargs_raw = raw
        .get(FIELD_KWARGS)
        .ok_or_else(|| corrupt("missing kwargs".into()))?;
    let kwargs: Value = serde_json::from_str(kwargs_raw)
        .map_err(|e| corrupt(format!("kwargs is not JSON: {e}")))?;

    let queue = raw.get(FIELD_ORIGIN).cloned().unwrap_or_default();
    let schema_version = match raw.get(FIELD_SCHEMA_VERSION) {
        Some(v) => v
            .parse::<u32>()
            .map_err(|_| corrupt(format!("bad schema_version {v:?}")))?,
        None => 1,
    };

    let defaults = EnqueuePolicy::default();
    let policy = EnqueuePolicy {
        job_timeout: parse_secs(raw, FIELD_TIMEOUT, defaults.job_timeout).map_err(corrupt)?,
        result_ttl: parse_secs(raw, FIELD_RESULT_TTL, defaults.result_ttl).map_err(corrupt)?,
        failure_ttl: parse_secs(raw, FIELD_FAILURE_TTL, defaults.failure_ttl).map_err(corrupt)?,
    };

    let message = JobMessage {
        handler,
        queue,
        schema_version,
        kwargs,
        policy,
    };

    let status = raw
        .get(FIELD_STATUS)
        .map(|s| JobStatus::parse(s))
        .unwrap_or(JobStatus::Queued);

    let enqueued_at = parse_time(raw, FIELD_ENQUEUED_AT)
        .map_err(corrupt)?
        .ok_or_else(|| corrupt("missing enqueued_at".into()))?;

    let result = match raw.get(FIELD_RESULT) {
        Some(v) => Some(decode_json_lenient(v)),
        None => None,
    };

    let meta = match raw.get(FIELD_META) {
        Some(v) => serde_json::from_str::<Map<String, Value>>(v)
            .map_err(|e| corrupt(format!("meta is not a JSON object: {e}")))?,
        None => Map::new(),
    };

    Ok(JobRecord {
        id: id.clone(),
        message,
        status,
        enqueued_at,
        started_at: parse_time(raw, FIELD_STARTED_AT).map_err(corrupt)?,
        ended_at: parse_time(raw, FIELD_ENDED_AT).map_err(corrupt)?,
        result,
        exc_info: raw.get(FIELD_EXC_INFO).cloned(),
        meta,
    })
}

fn parse_secs(
    raw: &HashMap<String, String>,
    field: &str,
    default: Duration,
) -> Result<Duration, String> {
    match raw.get(field) {
        Some(v) => v
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| format!("bad {field} {v:?}")),
        None => Ok(default),
    }
}

fn parse_time(raw: &HashMap<String, String>, field: &str) -> Result<Option<DateTime<Utc>>, String> {
    match raw.get(field).map(String::as_str) {
        None | Some("") => Ok(None),
        Some(v) => DateTime::parse_from_rfc3339(v)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| format!("bad {field} {v:?}: {e}")),
    }
}

/// Results are written by the worker; a non-JSON result is surfaced as a string
fn decode_json_lenient(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
