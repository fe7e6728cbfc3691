use crate::entities::{FailureReason, PipelineOutcome};
use crate::transcript::{Sender, TranscriptEntry};

pub const TOP_EFFECTS_PREFIX: &str = "Top reported side effects: ";
pub const NO_SIGNIFICANT_EFFECTS: &str = "No significant side effects found.";
pub const EMPTY_QUERY: &str = "Please enter a medication name.";
pub const NO_MATCH: &str = "I couldn't identify this medication. Try a more accurate name.";
pub const INSUFFICIENT_DATA: &str = "No reliable data found for this drug.";
pub const FETCH_FAILED: &str = "Failed to fetch info. Please try again.";

pub fn failure_message(reason: FailureReason) -> &'static str {
    match reason {
        FailureReason::EmptyQuery => EMPTY_QUERY,
        FailureReason::NoMatch => NO_MATCH,
        FailureReason::InsufficientData => INSUFFICIENT_DATA,
        FailureReason::NetworkError | FailureReason::SchemaError => FETCH_FAILED,
    }
}

pub fn format_outcome(outcome: &PipelineOutcome) -> String {
    match outcome {
        PipelineOutcome::Success(ranked) if ranked.is_empty() => {
            NO_SIGNIFICANT_EFFECTS.to_string()
        }
        PipelineOutcome::Success(ranked) => {
            let terms = ranked.terms().collect::<Vec<_>>();
            format!("{TOP_EFFECTS_PREFIX}{}", terms.join(", "))
        }
        PipelineOutcome::Failure(reason) => failure_message(*reason).to_string(),
    }
}

pub fn transcript_line(entry: &TranscriptEntry) -> String {
    let who = match entry.sender {
        Sender::User => "You",
        Sender::Bot => "Bot",
    };
    format!("{who}: {}", entry.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::adverse_event::{RankedReaction, RankedReactions};
    use crate::transcript::TurnToken;

    fn ranked(terms: &[(&str, usize)]) -> RankedReactions {
        RankedReactions::from(
            terms
                .iter()
                .map(|(term, count)| RankedReaction {
                    term: term.to_string(),
                    count: *count,
                })
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn success_lists_terms_in_rank_order() {
        let outcome =
            PipelineOutcome::Success(ranked(&[("HEADACHE", 6), ("NAUSEA", 4), ("RASH", 2)]));
        assert_eq!(
            format_outcome(&outcome),
            "Top reported side effects: HEADACHE, NAUSEA, RASH"
        );
    }

    #[test]
    fn empty_success_has_its_own_message() {
        let outcome = PipelineOutcome::Success(RankedReactions::default());
        assert_eq!(format_outcome(&outcome), "No significant side effects found.");
    }

    #[test]
    fn failures_map_to_fixed_messages() {
        let cases = [
            (FailureReason::EmptyQuery, "Please enter a medication name."),
            (
                FailureReason::NoMatch,
                "I couldn't identify this medication. Try a more accurate name.",
            ),
            (
                FailureReason::InsufficientData,
                "No reliable data found for this drug.",
            ),
            (
                FailureReason::NetworkError,
                "Failed to fetch info. Please try again.",
            ),
            (
                FailureReason::SchemaError,
                "Failed to fetch info. Please try again.",
            ),
        ];
        for (reason, expected) in cases {
            assert_eq!(format_outcome(&PipelineOutcome::Failure(reason)), expected);
        }
    }

    #[test]
    fn transcript_line_names_sender() {
        let entry = TranscriptEntry {
            turn: TurnToken::FIRST,
            sender: Sender::Bot,
            text: EMPTY_QUERY.to_string(),
        };
        assert_eq!(transcript_line(&entry), "Bot: Please enter a medication name.");
    }
}
