use crate::entities::drug::{CandidateConcept, ConceptGroup};
use crate::sources::rxnorm::{RxNormConceptProperties, RxNormDrugsResponse};

fn candidate_from_properties(props: RxNormConceptProperties) -> Option<CandidateConcept> {
    let name = props
        .name
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())?
        .to_string();
    Some(CandidateConcept {
        name,
        rxcui: props.rxcui.filter(|v| !v.trim().is_empty()),
        tty: props.tty,
    })
}

/// Concept groups in response order; unnamed concepts are dropped.
pub fn from_rxnorm_drugs(resp: RxNormDrugsResponse) -> Vec<ConceptGroup> {
    let Some(group) = resp.drug_group else {
        return Vec::new();
    };

    group
        .concept_group
        .into_iter()
        .map(|g| ConceptGroup {
            tty: g.tty,
            concepts: g
                .concept_properties
                .into_iter()
                .filter_map(candidate_from_properties)
                .collect(),
        })
        .collect()
}
