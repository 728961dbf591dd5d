use axum::async_trait;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::debug;

use super::image::ImageFile;
use crate::{analysis::AnalysisResponse, config::ClientConfig, error::ErrorBody};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Non-2xx reply; `message` is the server's `error` field when it sent one.
    #[error("server responded {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
    #[error("{0}")]
    Network(String),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("no original image in session")]
    NoOriginalImage,
}

/// The one network call the session store makes.
#[async_trait]
pub trait AnalyzeApi: Send + Sync {
    async fn analyze(&self, file: &ImageFile) -> Result<AnalysisResponse, ClientError>;
}

pub struct HttpAnalyzeApi {
    client: reqwest::Client,
    url: String,
}

impl HttpAnalyzeApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            url: config.analyze_url(),
        }
    }
}

#[async_trait]
impl AnalyzeApi for HttpAnalyzeApi {
    async fn analyze(&self, file: &ImageFile) -> Result<AnalysisResponse, ClientError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(file.mime.as_str())
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let form = Form::new().part("image", part);

        let res = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = res.status();
        debug!(%status, url = %self.url, "analyze response");
        if !status.is_success() {
            let message = res.json::<ErrorBody>().await.ok().map(|b| b.error);
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        res.json::<AnalysisResponse>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}
