use std::borrow::Cow;

use serde::Deserialize;

use crate::config::{MAX_REPORT_LIMIT, Settings};
use crate::error::MedSafeError;
use crate::sources::rate_limit::OPENFDA_MIN_INTERVAL;
use crate::utils::serde::null_as_default;

const OPENFDA_API: &str = "openfda";

pub struct OpenFdaClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
    api_key: Option<String>,
}

impl OpenFdaClient {
    pub fn new(settings: &Settings) -> Result<Self, MedSafeError> {
        Ok(Self {
            client: crate::sources::api_client(
                OPENFDA_API,
                settings.http_timeout,
                OPENFDA_MIN_INTERVAL,
            )?,
            base: settings.openfda_base.clone(),
            api_key: settings.openfda_api_key.clone(),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String, api_key: Option<String>) -> Result<Self, MedSafeError> {
        Ok(Self {
            client: crate::sources::api_client(OPENFDA_API, None, std::time::Duration::ZERO)?,
            base: Cow::Owned(base),
            api_key: api_key
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    pub(crate) fn escape_query_value(value: &str) -> String {
        crate::utils::query::escape_lucene_value(value)
    }

    pub(crate) fn product_query(drug_name: &str) -> String {
        format!(
            "patient.drug.medicinalproduct:\"{}\"",
            Self::escape_query_value(drug_name)
        )
    }

    /// Fetches up to `limit` FAERS reports that list `drug_name` as a medicinal product.
    ///
    /// openFDA answers 404 when nothing matches; that comes back as an empty result list.
    pub async fn faers_reports_for_product(
        &self,
        drug_name: &str,
        limit: usize,
    ) -> Result<OpenFdaResponse<FaersEventResult>, MedSafeError> {
        let drug_name = drug_name.trim();
        if drug_name.is_empty() {
            return Err(MedSafeError::InvalidArgument(
                "Drug name is required for an adverse-event search".into(),
            ));
        }
        if limit == 0 || limit > MAX_REPORT_LIMIT {
            return Err(MedSafeError::InvalidArgument(format!(
                "--limit must be between 1 and {MAX_REPORT_LIMIT}"
            )));
        }

        let url = crate::sources::endpoint(&self.base, "drug/event.json");
        let search = Self::product_query(drug_name);
        let mut req = self
            .client
            .get(&url)
            .query(&[("search", search.as_str()), ("limit", &limit.to_string())]);
        if let Some(key) = self.api_key.as_deref() {
            req = req.query(&[("api_key", key)]);
        }
        Ok(crate::sources::get_json_object(OPENFDA_API, req)
            .await?
            .unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct OpenFdaResponse<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<T>,
}

impl<T> Default for OpenFdaResponse<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaersEventResult {
    #[serde(default)]
    pub patient: Option<FaersPatient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaersPatient {
    #[serde(default, deserialize_with = "null_as_default")]
    pub reaction: Vec<FaersReaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaersReaction {
    #[serde(default)]
    pub reactionmeddrapt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn product_query_quotes_and_escapes_name() {
        assert_eq!(
            OpenFdaClient::product_query("ASPIRIN 325 MG"),
            r#"patient.drug.medicinalproduct:"ASPIRIN 325 MG""#
        );
        assert_eq!(
            OpenFdaClient::product_query("ACETAMINOPHEN/CODEINE"),
            r#"patient.drug.medicinalproduct:"ACETAMINOPHEN\/CODEINE""#
        );
    }

    #[tokio::test]
    async fn faers_reports_validates_limit_bounds() {
        let client = OpenFdaClient::new_for_test("http://127.0.0.1".into(), None).unwrap();
        let err = client
            .faers_reports_for_product("aspirin", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, MedSafeError::InvalidArgument(_)));

        let err = client
            .faers_reports_for_product("aspirin", MAX_REPORT_LIMIT + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, MedSafeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn faers_reports_includes_api_key_when_configured() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param("search", r#"patient.drug.medicinalproduct:"ASPIRIN""#))
            .and(query_param("limit", "100"))
            .and(query_param("api_key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "meta": {"results": {"skip": 0, "limit": 100, "total": 1}},
                "results": [{
                    "safetyreportid": "10003301",
                    "patient": {"reaction": [{"reactionmeddrapt": "HEADACHE"}]}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), Some("test-key".into())).unwrap();
        let resp = client
            .faers_reports_for_product("ASPIRIN", 100)
            .await
            .unwrap();
        assert_eq!(resp.results.len(), 1);
        let reaction = resp.results[0]
            .patient
            .as_ref()
            .and_then(|p| p.reaction.first())
            .and_then(|r| r.reactionmeddrapt.as_deref());
        assert_eq!(reaction, Some("HEADACHE"));
    }

    #[tokio::test]
    async fn faers_reports_sends_long_product_names_unchanged() {
        let server = MockServer::start().await;
        let name = format!("ASPIRIN {}", "X".repeat(600));
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param(
                "search",
                format!("patient.drug.medicinalproduct:\"{name}\"").as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None).unwrap();
        let resp = client.faers_reports_for_product(&name, 10).await.unwrap();
        assert!(resp.results.is_empty());
    }

    #[tokio::test]
    async fn faers_reports_treats_not_found_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": "NOT_FOUND", "message": "No matches found!"}
            })))
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None).unwrap();
        let resp = client
            .faers_reports_for_product("XYZZY", 10)
            .await
            .unwrap();
        assert!(resp.results.is_empty());
    }

    #[tokio::test]
    async fn faers_reports_tolerates_missing_nested_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {},
                    {"patient": null},
                    {"patient": {}},
                    {"patient": {"reaction": null}},
                    {"patient": {"reaction": [{}]}}
                ]
            })))
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None).unwrap();
        let resp = client
            .faers_reports_for_product("ASPIRIN", 10)
            .await
            .unwrap();
        assert_eq!(resp.results.len(), 5);
    }

    #[tokio::test]
    async fn faers_reports_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None).unwrap();
        let err = client
            .faers_reports_for_product("ASPIRIN", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, MedSafeError::Api { .. }));
        assert!(!err.is_schema());
    }
}
