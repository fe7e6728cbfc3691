use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::FailureReason;
use crate::error::MedSafeError;
use crate::sources::openfda::OpenFdaClient;
use crate::transform;

/// Fewer reports than this are too small a sample to rank.
pub const MIN_RELIABLE_REPORTS: usize = 10;
/// Terms this short or shorter are treated as malformed codes.
pub const MAX_NOISE_TERM_CHARS: usize = 3;
pub const TOP_REACTIONS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdverseEventReport {
    pub reactions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedReaction {
    pub term: String,
    pub count: usize,
}

/// At most [`TOP_REACTIONS`] entries, highest count first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedReactions(Vec<RankedReaction>);

impl RankedReactions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedReaction> {
        self.0.iter()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|r| r.term.as_str())
    }
}

impl From<Vec<RankedReaction>> for RankedReactions {
    fn from(mut value: Vec<RankedReaction>) -> Self {
        value.truncate(TOP_REACTIONS);
        Self(value)
    }
}

/// Reaction counts for one aggregation, in first-occurrence order.
#[derive(Debug, Default)]
pub struct ReactionFrequencyTable {
    entries: Vec<RankedReaction>,
    index: HashMap<String, usize>,
}

impl ReactionFrequencyTable {
    pub fn from_reports(reports: &[AdverseEventReport]) -> Self {
        let mut table = Self::default();
        for report in reports {
            for term in &report.reactions {
                if is_noise_term(term) {
                    continue;
                }
                table.increment(term);
            }
        }
        table
    }

    fn increment(&mut self, term: &str) {
        match self.index.get(term) {
            Some(&slot) => self.entries[slot].count += 1,
            None => {
                self.index.insert(term.to_string(), self.entries.len());
                self.entries.push(RankedReaction {
                    term: term.to_string(),
                    count: 1,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, term: &str) -> Option<usize> {
        self.index.get(term).map(|&slot| self.entries[slot].count)
    }

    pub fn rank(self) -> RankedReactions {
        let mut entries = self.entries;
        // `sort_by` is stable, so equal counts keep first-occurrence order.
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        RankedReactions::from(entries)
    }
}

fn is_noise_term(term: &str) -> bool {
    term.chars().count() <= MAX_NOISE_TERM_CHARS
}

pub fn ensure_reliable(reports: &[AdverseEventReport]) -> Result<(), FailureReason> {
    if reports.len() < MIN_RELIABLE_REPORTS {
        return Err(FailureReason::InsufficientData);
    }
    Ok(())
}

/// Adverse-event collaborator: reports that mention a canonical drug name.
#[async_trait]
pub trait AdverseEventSource: Send + Sync {
    async fn reports(&self, drug_name: &str) -> Result<Vec<AdverseEventReport>, MedSafeError>;
}

pub struct OpenFdaReportSource {
    client: OpenFdaClient,
    limit: usize,
}

impl OpenFdaReportSource {
    pub fn new(client: OpenFdaClient, limit: usize) -> Self {
        Self { client, limit }
    }
}

#[async_trait]
impl AdverseEventSource for OpenFdaReportSource {
    async fn reports(&self, drug_name: &str) -> Result<Vec<AdverseEventReport>, MedSafeError> {
        let resp = self
            .client
            .faers_reports_for_product(drug_name, self.limit)
            .await?;
        Ok(resp
            .results
            .iter()
            .map(transform::adverse_event::from_openfda_faers_result)
            .collect())
    }
}
