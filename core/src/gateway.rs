//! The HTTP gateway: every outbound call in the crate goes through
//! [`Gateway::send`].

use reqwest::Method;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Body of an outbound request.
#[derive(Debug, Clone)]
enum OutboundBody {
    Empty,
    Json(Value),
    Bytes { data: Vec<u8>, content_type: &'static str },
}

/// An outbound request description.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    url: String,
    body: OutboundBody,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: OutboundBody::Empty,
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            url: url.into(),
            body: OutboundBody::Empty,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body: OutboundBody::Json(body),
        }
    }

    pub fn patch_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::PATCH,
            url: url.into(),
            body: OutboundBody::Json(body),
        }
    }

    pub fn post_bytes(
        url: impl Into<String>,
        data: Vec<u8>,
        content_type: &'static str,
    ) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body: OutboundBody::Bytes { data, content_type },
        }
    }
}

/// A settled response: status plus the full body as text.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub body: String,
}

impl GatewayResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Thin wrapper over one shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct Gateway {
    client: reqwest::Client,
}

impl Gateway {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Issues the request and settles it into status + body text.
    ///
    /// Non-2xx statuses are not errors here; callers decide what a
    /// status means for their workflow.
    pub async fn send(&self, request: OutboundRequest) -> Result<GatewayResponse, GatewayError> {
        let mut builder = self.client.request(request.method, &request.url);

        builder = match request.body {
            OutboundBody::Empty => builder,
            OutboundBody::Json(value) => builder.json(&value),
            OutboundBody::Bytes { data, content_type } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(data),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(GatewayResponse { status, body })
    }
}
