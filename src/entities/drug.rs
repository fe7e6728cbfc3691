use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MedSafeError;
use crate::sources::rxnorm::RxNormClient;
use crate::transform;

/// One vocabulary concept a query may resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateConcept {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rxcui: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptGroup {
    pub tty: Option<String>,
    pub concepts: Vec<CandidateConcept>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Matched(CandidateConcept),
    NoMatch,
}

/// Picks the concept a normalized query refers to.
///
/// Candidates arrive flattened, in the vocabulary's response order.
pub trait MatchPolicy: Send + Sync {
    fn select<'a>(
        &self,
        query: &str,
        candidates: &'a [CandidateConcept],
    ) -> Option<&'a CandidateConcept>;
}

fn fold(value: &str) -> String {
    value.to_lowercase()
}

/// First candidate whose name contains the query, ignoring case.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSubstringMatch;

impl MatchPolicy for FirstSubstringMatch {
    fn select<'a>(
        &self,
        query: &str,
        candidates: &'a [CandidateConcept],
    ) -> Option<&'a CandidateConcept> {
        let query = fold(query);
        candidates.iter().find(|c| fold(&c.name).contains(&query))
    }
}

/// First candidate whose name equals the query, ignoring case; otherwise the first substring hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferExactMatch;

impl MatchPolicy for PreferExactMatch {
    fn select<'a>(
        &self,
        query: &str,
        candidates: &'a [CandidateConcept],
    ) -> Option<&'a CandidateConcept> {
        let folded = fold(query);
        candidates
            .iter()
            .find(|c| fold(&c.name) == folded)
            .or_else(|| FirstSubstringMatch.select(query, candidates))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicyKind {
    #[default]
    FirstSubstring,
    PreferExact,
}

pub const MATCH_POLICY_NAMES: &[&str] = &["first-substring", "prefer-exact"];

impl MatchPolicyKind {
    pub fn from_flag(value: &str) -> Result<Self, MedSafeError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "first" | "first-substring" => Ok(Self::FirstSubstring),
            "exact" | "prefer-exact" => Ok(Self::PreferExact),
            _ => Err(MedSafeError::InvalidArgument(format!(
                "--match-policy must be one of: {}",
                MATCH_POLICY_NAMES.join(", ")
            ))),
        }
    }

    pub fn policy(self) -> Box<dyn MatchPolicy> {
        match self {
            Self::FirstSubstring => Box::new(FirstSubstringMatch),
            Self::PreferExact => Box::new(PreferExactMatch),
        }
    }
}

pub fn flatten(groups: Vec<ConceptGroup>) -> Vec<CandidateConcept> {
    groups.into_iter().flat_map(|g| g.concepts).collect()
}

pub fn resolve(query: &str, groups: Vec<ConceptGroup>, policy: &dyn MatchPolicy) -> MatchResult {
    let candidates = flatten(groups);
    match policy.select(query, &candidates) {
        Some(concept) => MatchResult::Matched(concept.clone()),
        None => MatchResult::NoMatch,
    }
}

/// Vocabulary collaborator: maps a free-text name to concept groups.
#[async_trait]
pub trait VocabularyLookup: Send + Sync {
    async fn concept_groups(&self, name: &str) -> Result<Vec<ConceptGroup>, MedSafeError>;
}

#[async_trait]
impl VocabularyLookup for RxNormClient {
    async fn concept_groups(&self, name: &str) -> Result<Vec<ConceptGroup>, MedSafeError> {
        let resp = self.drugs(name).await?;
        Ok(transform::drug::from_rxnorm_drugs(resp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(name: &str, rxcui: &str) -> CandidateConcept {
        CandidateConcept {
            name: name.into(),
            rxcui: Some(rxcui.into()),
            tty: None,
        }
    }

    fn groups() -> Vec<ConceptGroup> {
        vec![
            ConceptGroup {
                tty: Some("BN".into()),
                concepts: Vec::new(),
            },
            ConceptGroup {
                tty: Some("SCD".into()),
                concepts: vec![
                    concept("acetaminophen 325 MG Oral Tablet", "313782"),
                    concept("Aspirin 81 MG Oral Tablet", "243670"),
                ],
            },
            ConceptGroup {
                tty: Some("IN".into()),
                concepts: vec![concept("aspirin", "1191")],
            },
        ]
    }

    #[test]
    fn first_substring_returns_first_qualifying_candidate() {
        let result = resolve("ASPIRIN", groups(), &FirstSubstringMatch);
        assert_eq!(
            result,
            MatchResult::Matched(concept("Aspirin 81 MG Oral Tablet", "243670"))
        );
    }

    #[test]
    fn first_substring_ignores_later_exact_match() {
        let candidates = flatten(groups());
        let picked = FirstSubstringMatch.select("aspirin", &candidates).unwrap();
        assert_eq!(picked.rxcui.as_deref(), Some("243670"));
    }

    #[test]
    fn prefer_exact_promotes_exact_name() {
        let result = resolve("Aspirin", groups(), &PreferExactMatch);
        assert_eq!(result, MatchResult::Matched(concept("aspirin", "1191")));

        let result = resolve("325 mg", groups(), &PreferExactMatch);
        assert_eq!(
            result,
            MatchResult::Matched(concept("acetaminophen 325 MG Oral Tablet", "313782"))
        );
    }

    #[test]
    fn resolve_reports_no_match() {
        assert_eq!(
            resolve("xyzzy", groups(), &FirstSubstringMatch),
            MatchResult::NoMatch
        );
        assert_eq!(
            resolve("aspirin", Vec::new(), &FirstSubstringMatch),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn query_must_be_contained_in_candidate_not_the_reverse() {
        let groups = vec![ConceptGroup {
            tty: None,
            concepts: vec![concept("aspirin", "1191")],
        }];
        assert_eq!(
            resolve("aspirin 81 mg", groups, &FirstSubstringMatch),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn match_policy_flag_parsing() {
        assert_eq!(
            MatchPolicyKind::from_flag("").unwrap(),
            MatchPolicyKind::FirstSubstring
        );
        assert_eq!(
            MatchPolicyKind::from_flag(" Prefer-Exact ").unwrap(),
            MatchPolicyKind::PreferExact
        );
        let err = MatchPolicyKind::from_flag("closest").unwrap_err();
        assert!(matches!(err, MedSafeError::InvalidArgument(_)));
        assert!(err.to_string().contains("first-substring, prefer-exact"));
    }
}
