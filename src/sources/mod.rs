//! Source clients and shared HTTP utilities for the vocabulary and adverse-event APIs.

use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::MedSafeError;

pub(crate) mod openfda;
pub(crate) mod rate_limit;
pub(crate) mod rxnorm;

const ERROR_BODY_MAX_BYTES: usize = 2048;
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Builds the HTTP client for one upstream, throttled to `min_interval` between sends.
///
/// There is no retry or cache layer: every turn hits the upstream once.
pub(crate) fn api_client(
    api: &'static str,
    timeout: Option<Duration>,
    min_interval: Duration,
) -> Result<ClientWithMiddleware, MedSafeError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("medsafe-cli/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let base_client = builder.build().map_err(MedSafeError::HttpClientInit)?;

    Ok(ClientBuilder::new(base_client)
        .with(rate_limit::ThrottleMiddleware::new(api, min_interval))
        .build())
}

pub(crate) fn body_excerpt(bytes: &[u8]) -> String {
    let full = String::from_utf8_lossy(bytes);

    let truncated: &str = if full.len() > ERROR_BODY_MAX_BYTES {
        let mut end = ERROR_BODY_MAX_BYTES;
        while end > 0 && !full.is_char_boundary(end) {
            end -= 1;
        }
        &full[..end]
    } else {
        full.as_ref()
    };

    let mut s = truncated.trim().replace(['\n', '\r', '\t'], " ");
    if full.len() > ERROR_BODY_MAX_BYTES {
        s.push_str(" …");
    }
    s
}

pub(crate) fn ensure_json_content_type(
    api: &str,
    content_type: Option<&HeaderValue>,
    body: &[u8],
) -> Result<(), MedSafeError> {
    let Some(content_type) = content_type else {
        return Ok(());
    };

    let raw = match content_type.to_str() {
        Ok(v) => v.trim(),
        Err(_) => {
            warn!(
                source = api,
                "Response content-type header was not valid UTF-8; attempting JSON parse"
            );
            return Ok(());
        }
    };
    if raw.is_empty() {
        return Ok(());
    }

    let media_type = raw
        .split(';')
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_ascii_lowercase();
    if matches!(media_type.as_str(), "text/html" | "application/xhtml+xml") {
        return Err(MedSafeError::Schema {
            api: api.to_string(),
            message: format!(
                "Unexpected HTML response (content-type: {raw}): {}",
                body_excerpt(body)
            ),
        });
    }

    let is_json = media_type == "application/json"
        || media_type == "text/json"
        || media_type.ends_with("+json");
    if !is_json {
        warn!(
            source = api,
            content_type = raw,
            "Unexpected non-JSON content type; attempting JSON parse for compatibility"
        );
    }

    Ok(())
}

pub(crate) async fn read_limited_body(
    mut resp: reqwest::Response,
    api: &str,
) -> Result<Vec<u8>, MedSafeError> {
    let mut body: Vec<u8> = Vec::new();

    while let Some(chunk) = resp.chunk().await? {
        let next_len = body.len().saturating_add(chunk.len());
        if next_len > DEFAULT_MAX_BODY_BYTES {
            return Err(MedSafeError::Api {
                api: api.to_string(),
                message: format!("Response body exceeded {DEFAULT_MAX_BODY_BYTES} bytes"),
            });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// Sends `req` and decodes a JSON object body.
///
/// `Ok(None)` means the upstream answered 404. A body that is not a JSON object is a
/// schema error; missing fields inside the object are left to `T`'s serde defaults.
pub(crate) async fn get_json_object<T: DeserializeOwned>(
    api: &str,
    req: reqwest_middleware::RequestBuilder,
) -> Result<Option<T>, MedSafeError> {
    let resp = req.send().await?;
    let status = resp.status();
    let content_type = resp.headers().get(reqwest::header::CONTENT_TYPE).cloned();
    let bytes = read_limited_body(resp, api).await?;

    if status.as_u16() == 404 {
        return Ok(None);
    }

    if !status.is_success() {
        let excerpt = body_excerpt(&bytes);
        return Err(MedSafeError::Api {
            api: api.to_string(),
            message: format!("HTTP {status}: {excerpt}"),
        });
    }

    ensure_json_content_type(api, content_type.as_ref(), &bytes)?;

    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|source| MedSafeError::ApiJson {
            api: api.to_string(),
            source,
        })?;
    if !value.is_object() {
        return Err(MedSafeError::Schema {
            api: api.to_string(),
            message: format!("expected a JSON object, got: {}", body_excerpt(&bytes)),
        });
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| MedSafeError::ApiJson {
            api: api.to_string(),
            source,
        })
}
