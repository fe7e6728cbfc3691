use crate::entities::adverse_event::AdverseEventReport;
use crate::sources::openfda::{FaersEventResult, FaersPatient};

fn reactions_from_patient(patient: Option<&FaersPatient>) -> Vec<String> {
    let Some(patient) = patient else {
        return Vec::new();
    };

    patient
        .reaction
        .iter()
        .filter_map(|rx| {
            rx.reactionmeddrapt
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
        .collect()
}

pub fn from_openfda_faers_result(r: &FaersEventResult) -> AdverseEventReport {
    AdverseEventReport {
        reactions: reactions_from_patient(r.patient.as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faers(value: serde_json::Value) -> FaersEventResult {
        serde_json::from_value(value).expect("faers result")
    }

    #[test]
    fn keeps_every_reaction_in_report_order() {
        let report = from_openfda_faers_result(&faers(serde_json::json!({
            "safetyreportid": "10003301",
            "patient": {"reaction": [
                {"reactionmeddrapt": "HEADACHE"},
                {"reactionmeddrapt": " NAUSEA "},
                {"reactionmeddrapt": "HEADACHE"}
            ]}
        })));
        assert_eq!(report.reactions, vec!["HEADACHE", "NAUSEA", "HEADACHE"]);
    }

    #[test]
    fn missing_fields_mean_no_reactions() {
        for value in [
            serde_json::json!({}),
            serde_json::json!({"patient": null}),
            serde_json::json!({"patient": {"reaction": null}}),
            serde_json::json!({"patient": {"reaction": [{}, {"reactionmeddrapt": "  "}]}}),
        ] {
            let report = from_openfda_faers_result(&faers(value));
            assert!(report.reactions.is_empty());
        }
    }
}
