//! Authenticated HTTP gateway for the build server's REST API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use buildgate_core::{canonical_field_name, PagedResult};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Health check endpoint.
pub const SERVER_PATH: &str = "/app/rest/server";

/// Single authenticated transport used by every service.
///
/// Requests are never retried here: re-sending a trigger could queue a
/// duplicate build.
#[derive(Clone)]
pub struct Gateway {
    inner: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Gateway {
    /// Create a new gateway bound to the configured server.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut auth = HeaderValue::from_str(&config.credentials.authorization_header())
            .map_err(|e| {
                ClientError::AuthConfiguration(format!("credentials are not a valid header: {e}"))
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let base_url = config.base_url().to_string();
        info!(
            server = %base_url,
            auth = config.credentials.kind(),
            username = config.credentials.username().unwrap_or("-"),
            timeout_secs = config.timeout.as_secs(),
            "Build server client created"
        );

        Ok(Self {
            inner,
            base_url,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check that the server answers the health check.
    ///
    /// Any failure is logged and reported as `false`.
    pub async fn test_connection(&self) -> bool {
        debug!(server = %self.base_url, "Testing build server connection");
        match self.get::<Value>(SERVER_PATH).await {
            Ok(Some(_)) => {
                info!(server = %self.base_url, "Connected to build server");
                true
            }
            Ok(None) => {
                warn!(server = %self.base_url, "Build server returned an empty health response");
                false
            }
            Err(e) => {
                error!(server = %self.base_url, error = %e, "Build server connection failed");
                false
            }
        }
    }

    /// GET JSON from an endpoint. An empty body yields `None`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        self.get_with_query(path, &[]).await
    }

    /// GET JSON with URL-encoded query parameters.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ClientError> {
        let request = self.request(Method::GET, path).query(query);
        let body = self.execute(Method::GET, path, request).await?;
        decode(path, &body)
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        let body = self.execute(Method::POST, path, request).await?;
        decode(path, &body)
    }

    /// POST a JSON body, ignoring the response body.
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path).json(body);
        self.execute(Method::POST, path, request).await?;
        Ok(())
    }

    /// DELETE a resource.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, path);
        self.execute(Method::DELETE, path, request).await?;
        Ok(())
    }

    /// GET a list endpoint and turn it into a page of items.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<PagedResult<T>, ClientError> {
        let response: Option<ListResponse<T>> = self.get_with_query(path, query).await?;
        Ok(response.map(ListResponse::into_paged).unwrap_or_default())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner.request(method, format!("{}{}", self.base_url, path))
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<String, ClientError> {
        debug!(method = %method, path = %path, "Sending request");

        let response = request
            .send()
            .await
            .map_err(|e| classify(&method, path, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify(&method, path, e))?;

        if !status.is_success() {
            warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or("unknown"),
                "Request failed"
            );
            return Err(ClientError::RemoteApi {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        debug!(method = %method, path = %path, status = status.as_u16(), "Request succeeded");
        Ok(body)
    }
}

fn classify(method: &Method, path: &str, e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        error!(method = %method, path = %path, "Request timed out");
        ClientError::Timeout {
            path: path.to_string(),
        }
    } else {
        error!(method = %method, path = %path, error = %e, "Request could not be completed");
        ClientError::Transport(e)
    }
}

/// Decode a response body. Known keys are matched case-insensitively.
fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<Option<T>, ClientError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let serialization = |source| ClientError::Serialization {
        path: path.to_string(),
        source,
    };

    let mut value: Value = serde_json::from_str(body).map_err(serialization)?;
    canonicalize_keys(&mut value);
    serde_json::from_value(value).map(Some).map_err(serialization)
}

/// Rewrite object keys to the records' camelCase spelling, recursively.
fn canonicalize_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, mut child) in std::mem::take(map) {
                canonicalize_keys(&mut child);
                let key = match canonical_field_name(&key) {
                    Some(canonical) => canonical.to_string(),
                    None => key,
                };
                map.insert(key, child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(canonicalize_keys),
        _ => {}
    }
}

/// List envelope: `{"count": n, "<kind>": [...]}`. A missing list is empty.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default)]
    count: Option<usize>,

    #[serde(
        default = "Vec::new",
        alias = "build",
        alias = "buildType",
        alias = "project",
        alias = "agent"
    )]
    items: Vec<T>,
}

impl<T> ListResponse<T> {
    fn into_paged(self) -> PagedResult<T> {
        let total = self.count.unwrap_or(self.items.len());
        PagedResult::new(self.items, total)
    }
}
