// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP client for the remote `/predict` endpoint

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::prediction::{PredictResponse, SelectedFile};
use crate::{PredictorError, Result};

/// Multipart field the server reads the image from
pub const FILE_FIELD: &str = "file";

/// Something that can classify an uploaded image
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, file: &SelectedFile) -> Result<PredictResponse>;
}

/// Client for a prediction server
pub struct PredictClient {
    client: Client,
    base_url: String,
    endpoint: String,
}

impl PredictClient {
    /// Create a new client from server settings
    pub fn new(server: &ServerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(server.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: server.url.trim_end_matches('/').to_string(),
            endpoint: server.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check that the server answers at all
    pub async fn health_check(&self) -> Result<()> {
        self.client
            .get(&self.base_url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Classifier for PredictClient {
    async fn classify(&self, file: &SelectedFile) -> Result<PredictResponse> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type())?;
        let form = Form::new().part(FILE_FIELD, part);

        debug!("POST {} ({}, {} bytes)", self.endpoint, file.name, file.bytes.len());

        let response = self.client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Prediction server returned status {}", status);
            return Err(PredictorError::ServerRejected {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        PredictResponse::from_slice(&body)
    }
}
