use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use insights_core::EventBatch;
use insights_settings::InsightsSettings;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use super::{Transport, TransportError, TransportResponse};
use crate::device::DeviceInfo;

const JSON_UTF8: &str = "application/json; charset=UTF-8";

/// `User-Agent` value: `Insights/<os>/<sdk>; App: <app>; <os>: <os_version>`.
pub fn user_agent(os: &str, sdk_version: &str, app: &str, os_version: &str) -> String {
    format!("Insights/{os}/{sdk_version}; App: {app}; {os}: {os_version}")
}

fn executable_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn header(name: &'static str, value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value).map_err(|_| TransportError::InvalidHeader { name })
}

/// [`Transport`] POSTing JSON batches with `reqwest`.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
    invalidated: AtomicBool,
}

impl HttpTransport {
    /// Build a client for `settings.api_url` with the collector headers.
    ///
    /// `Accept-Language` and `User-Agent` come from settings when set,
    /// otherwise from `device`.
    pub fn new(settings: &InsightsSettings, device: &DeviceInfo) -> Result<Self, TransportError> {
        let os = &settings.event_defaults.operating_system;
        let agent = settings.transport.user_agent.clone().unwrap_or_else(|| {
            user_agent(os, &settings.sdk_version, &executable_name(), &device.os_version)
        });
        let language = settings
            .transport
            .accept_language
            .clone()
            .unwrap_or_else(|| device.language.clone());

        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let _ = headers.insert(ACCEPT_LANGUAGE, header("accept-language", &language)?);
        let _ = headers.insert(USER_AGENT, header("user-agent", &agent)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.transport.timeout())
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build client: {e}"),
            })?;

        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
            invalidated: AtomicBool::new(false),
        })
    }

    /// Whether [`Transport::invalidate`] has been called.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &EventBatch) -> Result<TransportResponse, TransportError> {
        if self.is_invalidated() {
            return Err(TransportError::Invalidated);
        }
        let body = serde_json::to_vec(batch)?;

        let response = self
            .client
            .post(&self.api_url)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Http {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                warn!(status, %error, "failed to read collector response body");
                None
            }
        };
        let reply = TransportResponse { status, body };

        if reply.is_success() {
            if let Some(bytes) = reply.body.as_ref().filter(|b| !b.is_empty()) {
                match serde_json::from_slice::<serde_json::Value>(bytes) {
                    Ok(parsed) => debug!(status, response = %parsed, "collector accepted batch"),
                    Err(error) => debug!(status, %error, "collector response is not JSON"),
                }
            }
        }
        Ok(reply)
    }

    fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }
}
