use std::borrow::Cow;

use serde::Deserialize;

use crate::config::Settings;
use crate::error::MedSafeError;
use crate::sources::rate_limit::RXNORM_MIN_INTERVAL;
use crate::utils::serde::null_as_default;

const RXNORM_API: &str = "rxnorm";

pub struct RxNormClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl RxNormClient {
    pub fn new(settings: &Settings) -> Result<Self, MedSafeError> {
        Ok(Self {
            client: crate::sources::api_client(
                RXNORM_API,
                settings.http_timeout,
                RXNORM_MIN_INTERVAL,
            )?,
            base: settings.rxnorm_base.clone(),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String) -> Result<Self, MedSafeError> {
        Ok(Self {
            client: crate::sources::api_client(RXNORM_API, None, std::time::Duration::ZERO)?,
            base: Cow::Owned(base),
        })
    }

    /// Looks up concepts whose names relate to `name` via `/REST/drugs.json`.
    ///
    /// A 404 is reported as an empty response rather than an error.
    pub async fn drugs(&self, name: &str) -> Result<RxNormDrugsResponse, MedSafeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MedSafeError::InvalidArgument(
                "Drug name is required for an RxNorm lookup".into(),
            ));
        }

        let url = crate::sources::endpoint(&self.base, "REST/drugs.json");
        let req = self.client.get(&url).query(&[("name", name)]);
        Ok(crate::sources::get_json_object(RXNORM_API, req)
            .await?
            .unwrap_or_default())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RxNormDrugsResponse {
    #[serde(rename = "drugGroup", default)]
    pub drug_group: Option<RxNormDrugGroup>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RxNormDrugGroup {
    #[serde(
        rename = "conceptGroup",
        default,
        deserialize_with = "null_as_default"
    )]
    pub concept_group: Vec<RxNormConceptGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RxNormConceptGroup {
    #[serde(default)]
    pub tty: Option<String>,
    #[serde(
        rename = "conceptProperties",
        default,
        deserialize_with = "null_as_default"
    )]
    pub concept_properties: Vec<RxNormConceptProperties>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RxNormConceptProperties {
    #[serde(default)]
    pub rxcui: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tty: Option<String>,
}
