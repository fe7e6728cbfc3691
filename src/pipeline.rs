//! One chat turn: normalize, resolve, aggregate, rank, format.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::entities::adverse_event::{self, OpenFdaReportSource};
use crate::entities::drug::{self, MatchResult};
use crate::entities::query;
use crate::error::MedSafeError;
use crate::render;
use crate::sources::openfda::OpenFdaClient;
use crate::sources::rxnorm::RxNormClient;

pub use crate::entities::adverse_event::{
    AdverseEventReport, AdverseEventSource, RankedReaction, RankedReactions,
    ReactionFrequencyTable,
};
pub use crate::entities::drug::{
    CandidateConcept, ConceptGroup, FirstSubstringMatch, MatchPolicy, MatchPolicyKind,
    PreferExactMatch, VocabularyLookup,
};
pub use crate::entities::{FailureReason, PipelineOutcome};

/// Per-turn stages. `Idle` is both where a turn starts and where it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Idle,
    Normalizing,
    Resolving,
    Aggregating,
    Ranking,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Normalizing => "normalizing",
            Self::Resolving => "resolving",
            Self::Aggregating => "aggregating",
            Self::Ranking => "ranking",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    pub query: String,
    pub concept: Option<CandidateConcept>,
    pub outcome: PipelineOutcome,
}

impl TurnResult {
    pub fn reply(&self) -> String {
        render::reply::format_outcome(&self.outcome)
    }

    pub fn to_json(&self) -> Result<String, MedSafeError> {
        render::json::to_pretty(self)
    }
}

impl Serialize for TurnResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TurnResult", 4)?;
        state.serialize_field("query", &self.query)?;
        match &self.concept {
            Some(concept) => state.serialize_field("concept", concept)?,
            None => state.skip_field("concept")?,
        }
        state.serialize_field("outcome", &self.outcome)?;
        state.serialize_field("reply", &self.reply())?;
        state.end()
    }
}

/// Folds a collaborator error into the turn's failure reason.
///
/// Only transport and HTTP status failures are network errors. A request the collaborator
/// refused to send leaves the stage with nothing to work with.
fn classify(stage: TurnStage, err: &MedSafeError) -> FailureReason {
    match err {
        MedSafeError::HttpClientInit(_)
        | MedSafeError::Http(_)
        | MedSafeError::HttpMiddleware(_)
        | MedSafeError::Api { .. }
        | MedSafeError::Io(_) => FailureReason::NetworkError,
        MedSafeError::ApiJson { .. } | MedSafeError::Schema { .. } | MedSafeError::Json(_) => {
            FailureReason::SchemaError
        }
        MedSafeError::InvalidArgument(_) => match stage {
            TurnStage::Aggregating | TurnStage::Ranking => FailureReason::InsufficientData,
            TurnStage::Idle | TurnStage::Normalizing | TurnStage::Resolving => {
                FailureReason::NoMatch
            }
        },
    }
}

fn enter(stage: TurnStage) {
    debug!(%stage, "turn stage");
}

/// Sequences the collaborators for one turn. Cheap to clone; holds no per-turn state.
#[derive(Clone)]
pub struct Pipeline {
    vocabulary: Arc<dyn VocabularyLookup>,
    events: Arc<dyn AdverseEventSource>,
    policy: Arc<dyn MatchPolicy>,
}

impl Pipeline {
    pub fn new(
        vocabulary: Arc<dyn VocabularyLookup>,
        events: Arc<dyn AdverseEventSource>,
        policy: Arc<dyn MatchPolicy>,
    ) -> Self {
        Self {
            vocabulary,
            events,
            policy,
        }
    }

    /// Wires the RxNorm and openFDA clients from `settings`.
    pub fn from_settings(
        settings: &Settings,
        policy: MatchPolicyKind,
    ) -> Result<Self, MedSafeError> {
        let vocabulary = RxNormClient::new(settings)?;
        let events = OpenFdaReportSource::new(OpenFdaClient::new(settings)?, settings.report_limit);
        Ok(Self::new(
            Arc::new(vocabulary),
            Arc::new(events),
            Arc::from(policy.policy()),
        ))
    }

    /// Runs one turn to completion. Every failure is folded into the outcome.
    pub async fn run_turn(&self, raw: &str) -> TurnResult {
        let mut turn = TurnResult {
            query: raw.to_string(),
            concept: None,
            outcome: PipelineOutcome::Failure(FailureReason::EmptyQuery),
        };
        turn.outcome = match self.advance(raw, &mut turn.concept).await {
            Ok(ranked) => PipelineOutcome::Success(ranked),
            Err(reason) => PipelineOutcome::Failure(reason),
        };
        enter(TurnStage::Idle);
        turn
    }

    async fn advance(
        &self,
        raw: &str,
        concept: &mut Option<CandidateConcept>,
    ) -> Result<RankedReactions, FailureReason> {
        enter(TurnStage::Normalizing);
        let query = query::normalize(raw)?;

        enter(TurnStage::Resolving);
        let groups = self
            .vocabulary
            .concept_groups(query.as_str())
            .await
            .map_err(|err| {
                let reason = classify(TurnStage::Resolving, &err);
                warn!(stage = %TurnStage::Resolving, ?reason, error = %err, "vocabulary lookup failed");
                reason
            })?;
        let matched = match drug::resolve(query.as_str(), groups, self.policy.as_ref()) {
            MatchResult::Matched(matched) => matched,
            MatchResult::NoMatch => {
                debug!(query = query.as_str(), "no vocabulary candidate contains the query");
                return Err(FailureReason::NoMatch);
            }
        };
        debug!(name = %matched.name, rxcui = ?matched.rxcui, "resolved drug concept");
        let name = matched.name.clone();
        *concept = Some(matched);

        enter(TurnStage::Aggregating);
        let reports = self.events.reports(&name).await.map_err(|err| {
            let reason = classify(TurnStage::Aggregating, &err);
            warn!(stage = %TurnStage::Aggregating, ?reason, error = %err, "adverse-event fetch failed");
            reason
        })?;
        adverse_event::ensure_reliable(&reports)?;

        enter(TurnStage::Ranking);
        Ok(ReactionFrequencyTable::from_reports(&reports).rank())
    }
}
