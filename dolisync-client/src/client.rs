//! Blocking HTTP transport for the Dolibarr REST API.
//!
//! Every request carries the `DOLAPIKEY` header. Bodies are JSON. Reads
//! return `Ok(None)` on 404; writes surface it as [`ClientError::Status`].

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use ureq::{Agent, AgentBuilder};

use dolisync_core::ApiConfig;

use crate::error::ClientError;

/// Header Dolibarr reads the API key from.
pub const API_KEY_HEADER: &str = "DOLAPIKEY";

/// Client for one Dolibarr instance.
#[derive(Clone)]
pub struct DolibarrClient {
    agent: Agent,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for DolibarrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DolibarrClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DolibarrClient {
    pub fn new(config: &ApiConfig) -> Self {
        let agent = AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base}/{path}`; `Ok(None)` on 404.
    pub(crate) fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<Value>, ClientError> {
        let url = self.url(path);
        let mut request = self.request("GET", &url);
        for (name, value) in query {
            request = request.query(name, value);
        }
        match execute(request, &url, None::<&Value>) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => {
                tracing::debug!(url = %url, "not found");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// `POST` / `PUT` with an optional JSON body.
    pub(crate) fn send<B: Serialize>(
        &self,
        method: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ClientError> {
        let url = self.url(path);
        execute(self.request(method, &url), &url, body)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        tracing::debug!(method = %method, url = %url, "dolibarr request");
        self.agent
            .request(method, url)
            .set(API_KEY_HEADER, &self.api_key)
            .set("Accept", "application/json")
    }
}

fn execute<B: Serialize>(
    request: ureq::Request,
    url: &str,
    body: Option<&B>,
) -> Result<Value, ClientError> {
    let result = match body {
        Some(body) => request.send_json(body),
        None => request.call(),
    };

    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(code, response)) => {
            return Err(ClientError::Status {
                url: url.to_owned(),
                code,
                body: response.into_string().unwrap_or_default(),
            });
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(ClientError::Transport {
                url: url.to_owned(),
                message: transport.to_string(),
            });
        }
    };

    let text = response.into_string().map_err(|source| ClientError::Io {
        url: url.to_owned(),
        source,
    })?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ClientError::Decode {
        url: url.to_owned(),
        message: e.to_string(),
    })
}

/// Read an identifier Dolibarr sent as an integer or a quoted string.
pub(crate) fn decode_id(url: &str, value: &Value) -> Result<String, ClientError> {
    match value {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_owned()),
        other => Err(ClientError::Decode {
            url: url.to_owned(),
            message: format!("expected an id, got {other}"),
        }),
    }
}
