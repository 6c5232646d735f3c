//! REST client for the chat server's directory endpoints.
//!
//! Consumes, never implements: `GET /rooms`, `POST /rooms`,
//! `GET /rooms/{id}/messages`, `GET /personas`.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::ChatError;
use crate::models::{Message, PersonaDirectory, Room};

/// Default server address when none is configured.
pub const DEFAULT_SERVER: &str = "http://localhost:8000";

/// Configuration for the REST client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the chat server API (e.g. `http://localhost:8000`).
    pub base_url: String,
    /// TCP connection timeout.
    pub connect_timeout: Duration,
    /// Per-request read timeout.
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Create a config with sensible defaults.
    ///
    /// - connect_timeout: 3 s
    /// - request_timeout: 10 s
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Typed client over the room/persona directory.
pub struct ApiClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(ApiConfig::new(base_url))
    }

    pub fn with_config(config: ApiConfig) -> Self {
        // reqwest::Client::builder() can fail in extreme environments, but
        // unwrap_or_default() falls back to a default client instead of panicking.
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetch the room catalog.
    pub async fn fetch_rooms(&self) -> Result<Vec<Room>, ChatError> {
        self.get_json("/rooms").await
    }

    /// Create a room and return it. The mystery-mode flag is fixed at creation.
    pub async fn create_room(&self, name: &str, mystery_mode: bool) -> Result<Room, ChatError> {
        let url = format!("{}/rooms", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .query(&[
                ("name", name),
                ("mystery_mode", if mystery_mode { "true" } else { "false" }),
            ])
            .send()
            .await
            .map_err(|e| ChatError::Connect {
                url: url.clone(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(ChatError::Http {
                status: resp.status().as_u16(),
                url,
            });
        }

        resp.json::<Room>().await.map_err(|e| ChatError::Decode {
            url,
            detail: e.to_string(),
        })
    }

    /// Fetch the ordered message history of one room.
    pub async fn fetch_messages(&self, room_id: i64) -> Result<Vec<Message>, ChatError> {
        self.get_json(&format!("/rooms/{}/messages", room_id)).await
    }

    /// Fetch the persona directory (persona id → Persona).
    pub async fn fetch_personas(&self) -> Result<PersonaDirectory, ChatError> {
        self.get_json("/personas").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChatError> {
        let url = format!("{}{}", self.config.base_url, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::Connect {
                url: url.clone(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(ChatError::Http {
                status: resp.status().as_u16(),
                url,
            });
        }

        resp.json::<T>().await.map_err(|e| ChatError::Decode {
            url,
            detail: e.to_string(),
        })
    }
}
