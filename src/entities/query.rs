use serde::Serialize;

use crate::entities::FailureReason;

/// A user submission after whitespace trimming. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub raw: String,
    pub normalized: String,
}

impl Query {
    pub fn as_str(&self) -> &str {
        &self.normalized
    }
}

pub fn normalize(raw: &str) -> Result<Query, FailureReason> {
    let normalized = raw.trim();
    if normalized.is_empty() {
        return Err(FailureReason::EmptyQuery);
    }
    Ok(Query {
        raw: raw.to_string(),
        normalized: normalized.to_string(),
    })
}
