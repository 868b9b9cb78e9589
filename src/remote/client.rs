// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Authenticated JSON requests against the finance API.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::RemoteError;

const UA: &str = concat!(
    "moneysync/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/moneysync)"
);
const MAX_LOG_BODY_CHARS: usize = 256;

#[derive(Debug, Clone)]
pub struct NetworkClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl NetworkClient {
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(UA)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            timeout,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, RemoteError> {
        Self::new(&cfg.base_url, cfg.token.clone(), cfg.request_timeout)
    }

    fn headers(&self) -> Result<HeaderMap, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| RemoteError::Unauthorized)?;
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }

    fn url(&self, endpoint: &str) -> Result<Url, RemoteError> {
        let raw = format!("{}{}", self.base_url, endpoint);
        Url::parse(&raw).map_err(|_| RemoteError::InvalidUrl(raw))
    }

    /// Sends `method endpoint` with an optional JSON body and decodes the
    /// reply into `T`.
    ///
    /// 200/201 decode the body. 204 only decodes into types that accept JSON
    /// `null` (such as `()`); anything else is `EmptyResponse`. Other
    /// statuses map through [`RemoteError::from_status`].
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(endpoint)?;
        tracing::debug!(method = %method, url = %url, "sending request");

        let mut req = self
            .client
            .request(method.clone(), url.clone())
            .headers(self.headers()?);
        if let Some(body) = body {
            let bytes =
                serde_json::to_vec(body).map_err(|e| RemoteError::Serialization(e.to_string()))?;
            req = req.body(bytes);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout(self.timeout)
            } else {
                RemoteError::Transport(e.to_string())
            }
        })?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|_| RemoteError::InvalidResponse)?;
        log_response(&method, &url, status, &text);

        match status {
            StatusCode::OK | StatusCode::CREATED if !text.trim().is_empty() => {
                serde_json::from_str(&text).map_err(|e| RemoteError::Serialization(e.to_string()))
            }
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => {
                serde_json::from_str("null").map_err(|_| RemoteError::EmptyResponse)
            }
            other => {
                let message = if text.trim().is_empty() {
                    None
                } else {
                    Some(text)
                };
                Err(RemoteError::from_status(other.as_u16(), message))
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RemoteError> {
        self.request::<T, ()>(Method::GET, endpoint, None).await
    }
}

fn log_response(method: &Method, url: &Url, status: StatusCode, body: &str) {
    if status.is_success() {
        tracing::debug!(method = %method, url = %url, status = status.as_u16(), "response");
        return;
    }
    let mut preview: String = body.chars().take(MAX_LOG_BODY_CHARS).collect();
    if body.chars().count() > MAX_LOG_BODY_CHARS {
        preview.push_str("...");
    }
    tracing::debug!(
        method = %method,
        url = %url,
        status = status.as_u16(),
        body = %preview,
        "error response"
    );
}
