use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Job lifecycle as recorded by the store.
///
/// The worker advances a job `queued -> started -> finished | failed`.
/// Stores may also report transitional states of their own; those are kept
/// verbatim so callers always see the raw status string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Started,
    Finished,
    Failed,
    Deferred,
    Scheduled,
    Stopped,
    Canceled,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Deferred => "deferred",
            Self::Scheduled => "scheduled",
            Self::Stopped => "stopped",
            Self::Canceled => "canceled",
            Self::Other(raw) => raw,
        }
    }

    /// Parse a raw store string. Never fails: unknown values become `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => Self::Queued,
            "started" => Self::Started,
            "finished" => Self::Finished,
            "failed" => Self::Failed,
            "deferred" => Self::Deferred,
            "scheduled" => Self::Scheduled,
            "stopped" => Self::Stopped,
            "canceled" => Self::Canceled,
            other => Self::Other(other.to_string()),
        }
    }

    /// Check if the job will not change state again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished | Self::Failed | Self::Stopped | Self::Canceled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_keep_their_store_spelling() {
        for raw in ["queued", "started", "finished", "failed", "deferred", "scheduled", "stopped", "canceled"] {
            assert_eq!(JobStatus::parse(raw).as_str(), raw);
        }
    }

    #[test]
    fn unknown_status_is_preserved_verbatim() {
        let status = JobStatus::parse("paused-by-operator");
        assert_eq!(status, JobStatus::Other("paused-by-operator".to_string()));
        assert_eq!(status.to_string(), "paused-by-operator");
        assert!(!status.is_terminal());
    }

    #[test]
    fn serde_uses_the_raw_string() {
        let json = serde_json::to_string(&JobStatus::Started).unwrap();
        assert_eq!(json, "\"started\"");
        let back: JobStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(back, JobStatus::Failed);
    }
}
