//! `medsafe health`: one real lookup per upstream, through the clients a chat turn uses.
//!
//! The lookups go through the same throttled clients and payload decoding as a turn, so a
//! schema change upstream shows up here too.

use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::entities::adverse_event::{AdverseEventSource, OpenFdaReportSource};
use crate::entities::drug::VocabularyLookup;
use crate::error::MedSafeError;
use crate::sources::openfda::OpenFdaClient;
use crate::sources::rxnorm::RxNormClient;

/// Name looked up in both sources. Common enough to always have concepts and reports.
const CHECK_DRUG: &str = "aspirin";
/// Health checks always time out, even when turns are configured not to.
const CHECK_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Answered(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SourceCheck {
    pub source: &'static str,
    pub elapsed: Duration,
    pub status: CheckStatus,
}

impl SourceCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, CheckStatus::Answered(_))
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub checks: Vec<SourceCheck>,
}

impl HealthReport {
    pub fn all_healthy(&self) -> bool {
        self.checks.iter().all(SourceCheck::is_ok)
    }

    /// One line per source, then a summary line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for check in &self.checks {
            let (label, detail) = match &check.status {
                CheckStatus::Answered(detail) => ("ok", detail.as_str()),
                CheckStatus::Failed(reason) => ("FAILED", reason.as_str()),
            };
            out.push_str(&format!(
                "{:<12} {:<6} {:>6}ms  {detail}\n",
                check.source,
                label,
                check.elapsed.as_millis()
            ));
        }
        let answered = self.checks.iter().filter(|c| c.is_ok()).count();
        out.push_str(&format!(
            "{answered}/{} sources answered",
            self.checks.len()
        ));
        out
    }
}

async fn timed<F>(source: &'static str, lookup: F) -> SourceCheck
where
    F: Future<Output = Result<String, MedSafeError>>,
{
    let start = Instant::now();
    let status = match tokio::time::timeout(CHECK_TIMEOUT, lookup).await {
        Ok(Ok(detail)) => CheckStatus::Answered(detail),
        Ok(Err(err)) => CheckStatus::Failed(err.to_string()),
        Err(_) => CheckStatus::Failed(format!(
            "no answer within {}s",
            CHECK_TIMEOUT.as_secs()
        )),
    };
    SourceCheck {
        source,
        elapsed: start.elapsed(),
        status,
    }
}

async fn check_vocabulary(vocabulary: &dyn VocabularyLookup) -> Result<String, MedSafeError> {
    let groups = vocabulary.concept_groups(CHECK_DRUG).await?;
    let concepts = groups.iter().map(|g| g.concepts.len()).sum::<usize>();
    Ok(format!("{concepts} concepts for \"{CHECK_DRUG}\""))
}

async fn check_events(events: &dyn AdverseEventSource) -> Result<String, MedSafeError> {
    let reports = events.reports(CHECK_DRUG).await?;
    Ok(format!("{} reports for \"{CHECK_DRUG}\"", reports.len()))
}

/// Looks up a well-known drug in RxNav and openFDA at the same time.
///
/// # Errors
///
/// Returns an error only when a client cannot be built. Upstream failures are reported
/// per source in the returned [`HealthReport`].
pub async fn check(settings: &Settings) -> Result<HealthReport, MedSafeError> {
    let vocabulary = RxNormClient::new(settings)?;
    let events = OpenFdaReportSource::new(OpenFdaClient::new(settings)?, 1);

    let (rxnorm, openfda) = tokio::join!(
        timed("RxNav", check_vocabulary(&vocabulary)),
        timed("openFDA", check_events(&events)),
    );

    Ok(HealthReport {
        checks: vec![rxnorm, openfda],
    })
}
