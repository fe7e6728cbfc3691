//! Environment-driven settings shared by the CLI commands.

use std::borrow::Cow;
use std::time::Duration;

use crate::error::MedSafeError;

pub(crate) const RXNORM_BASE: &str = "https://rxnav.nlm.nih.gov";
pub(crate) const RXNORM_BASE_ENV: &str = "MEDSAFE_RXNORM_BASE";
pub(crate) const OPENFDA_BASE: &str = "https://api.fda.gov";
pub(crate) const OPENFDA_BASE_ENV: &str = "MEDSAFE_OPENFDA_BASE";

const OPENFDA_API_KEY_ENV: &str = "OPENFDA_API_KEY";
const REPORT_LIMIT_ENV: &str = "MEDSAFE_REPORT_LIMIT";
const HTTP_TIMEOUT_ENV: &str = "MEDSAFE_HTTP_TIMEOUT_SECS";

pub const DEFAULT_REPORT_LIMIT: usize = 100;
/// openFDA rejects `limit` values above this for search requests.
pub const MAX_REPORT_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub rxnorm_base: Cow<'static, str>,
    pub openfda_base: Cow<'static, str>,
    pub openfda_api_key: Option<String>,
    pub report_limit: usize,
    pub http_timeout: Option<Duration>,
}

impl Settings {
    pub fn from_env() -> Result<Self, MedSafeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, MedSafeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let report_limit = match value(REPORT_LIMIT_ENV) {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                MedSafeError::InvalidArgument(format!(
                    "{REPORT_LIMIT_ENV} must be a whole number, got \"{raw}\""
                ))
            })?,
            None => DEFAULT_REPORT_LIMIT,
        };

        let http_timeout = match value(HTTP_TIMEOUT_ENV) {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    MedSafeError::InvalidArgument(format!(
                        "{HTTP_TIMEOUT_ENV} must be a whole number of seconds, got \"{raw}\""
                    ))
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let settings = Self {
            rxnorm_base: value(RXNORM_BASE_ENV)
                .map(Cow::Owned)
                .unwrap_or(Cow::Borrowed(RXNORM_BASE)),
            openfda_base: value(OPENFDA_BASE_ENV)
                .map(Cow::Owned)
                .unwrap_or(Cow::Borrowed(OPENFDA_BASE)),
            openfda_api_key: value(OPENFDA_API_KEY_ENV),
            report_limit,
            http_timeout,
        };
        settings.with_report_limit(None)
    }

    /// Applies a command-line override and re-validates the report limit.
    pub fn with_report_limit(mut self, limit: Option<usize>) -> Result<Self, MedSafeError> {
        if let Some(limit) = limit {
            self.report_limit = limit;
        }
        if self.report_limit == 0 || self.report_limit > MAX_REPORT_LIMIT {
            return Err(MedSafeError::InvalidArgument(format!(
                "--limit must be between 1 and {MAX_REPORT_LIMIT}"
            )));
        }
        Ok(self)
    }
}
