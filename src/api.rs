use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::logger::Logger;

const GRAPHQL_PATH: &str = "/graphql";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to serialize graphql request")]
    Serialize(#[source] serde_json::Error),
    #[error("graphql request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("graphql response from {url} (status {status}) is not valid JSON")]
    Decode {
        url: String,
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
}

/// Body of a single GraphQL call. `variables` is left out entirely when absent.
#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<&'a Value>,
}

impl<'a> GraphqlRequest<'a> {
    pub fn new(query: &'a str, variables: Option<&'a Value>) -> Self {
        Self { query, variables }
    }

    pub fn to_body(&self) -> Result<Vec<u8>, ApiError> {
        serde_json::to_vec(self).map_err(ApiError::Serialize)
    }
}

/// Synchronous client for `<domain>/graphql`, authenticated with a bearer token.
#[derive(Clone)]
pub struct ApiClient {
    endpoint: String,
    token: String,
    http: Client,
    logger: Logger,
}

impl ApiClient {
    /// `base` is the scheme-qualified domain without a trailing slash.
    pub fn new(base: &str, token: impl Into<String>, logger: Logger) -> Self {
        Self {
            endpoint: format!("{base}{GRAPHQL_PATH}"),
            token: token.into(),
            http: Client::new(),
            logger,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run one query or mutation and return the parsed body as-is.
    ///
    /// A body carrying `errors` is logged once and still returned. The HTTP
    /// status is not checked: a 401 or 400 whose body is JSON (typically
    /// `{"errors": ...}`) comes back as `Ok`. Only transport failures and
    /// non-JSON bodies are [`ApiError`]s; nothing is retried.
    pub fn query(&self, query: &str, variables: Option<Value>) -> Result<Value, ApiError> {
        let body = GraphqlRequest::new(query, variables.as_ref()).to_body()?;

        debug!(endpoint = %self.endpoint, bytes = body.len(), "sending graphql request");
        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.token)
            .body(body)
            .send()
            .map_err(|source| self.transport(source))?;

        let status = response.status();
        let bytes = response.bytes().map_err(|source| self.transport(source))?;
        let parsed: Value = serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
            url: self.endpoint.clone(),
            status,
            source,
        })?;
        debug!(%status, "graphql response received");

        if let Some(errors) = parsed.get("errors") {
            self.logger.error(format!("Error: {errors}"));
        }
        Ok(parsed)
    }

    fn transport(&self, source: reqwest::Error) -> ApiError {
        ApiError::Transport {
            url: self.endpoint.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_with_variables() {
        let vars = json!({"a": 1});
        let body = GraphqlRequest::new("query{x}", Some(&vars)).to_body().unwrap();
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed, json!({"query": "query{x}", "variables": {"a": 1}}));
    }

    #[test]
    fn body_without_variables_omits_the_key() {
        let body = GraphqlRequest::new("query{x}", None).to_body().unwrap();
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed, json!({"query": "query{x}"}));
        assert!(parsed.get("variables").is_none());
    }

    #[test]
    fn endpoint_appends_graphql_path() {
        let logger = Logger::new("t", &Default::default());
        let client = ApiClient::new("https://acme.app.spacelift.io", "tok", logger);
        assert_eq!(client.endpoint(), "https://acme.app.spacelift.io/graphql");
    }
}
