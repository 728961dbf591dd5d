use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, instrument, warn};

use super::{
    api::{AnalyzeApi, ClientError},
    durable::DurableStorage,
    image::{ImageFile, ImageRef},
};
use crate::analysis::AnalysisResponse;

/// Durable key holding the original image reference.
pub const ORIGINAL_IMAGE_KEY: &str = "originalImage";

const ANALYZE_FALLBACK: &str = "Failed to analyze image";
const REANALYZE_FALLBACK: &str = "Failed to reanalyze image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Analysis,
    Editor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSession {
    pub original_image: Option<ImageRef>,
    pub edited_image: Option<ImageRef>,
    pub analysis: Option<AnalysisResponse>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl ClientSession {
    /// The screen actually shown for `requested`: anything whose inputs are missing falls back to `Home`.
    pub fn resolve(&self, requested: Screen) -> Screen {
        let allowed = match requested {
            Screen::Home => true,
            Screen::Editor => self.original_image.is_some(),
            Screen::Analysis => self.original_image.is_some() && self.analysis.is_some(),
        };
        if allowed {
            requested
        } else {
            Screen::Home
        }
    }
}

/// Owns the session state and the only operations allowed to change it.
pub struct SessionStore {
    api: Arc<dyn AnalyzeApi>,
    durable: Arc<dyn DurableStorage>,
    session: RwLock<ClientSession>,
}

impl SessionStore {
    /// Rehydrates `original_image` from durable storage; every other field starts empty.
    pub fn open(api: Arc<dyn AnalyzeApi>, durable: Arc<dyn DurableStorage>) -> Self {
        let original_image = match durable.get(ORIGINAL_IMAGE_KEY) {
            Ok(v) => v.map(ImageRef),
            Err(e) => {
                warn!(error = %e, "could not read durable session; starting empty");
                None
            }
        };
        Self {
            api,
            durable,
            session: RwLock::new(ClientSession {
                original_image,
                ..ClientSession::default()
            }),
        }
    }

    pub async fn snapshot(&self) -> ClientSession {
        self.session.read().await.clone()
    }

    pub async fn resolve(&self, requested: Screen) -> Screen {
        self.session.read().await.resolve(requested)
    }

    /// Submits a new image. On success `analysis` and `original_image` change together.
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub async fn analyze(&self, file: ImageFile) -> Result<AnalysisResponse, ClientError> {
        self.begin().await;
        let outcome = self.api.analyze(&file).await;

        let mut session = self.session.write().await;
        session.is_loading = false;
        match &outcome {
            Ok(analysis) => {
                let image = file.to_ref();
                self.mirror(Some(&image));
                session.original_image = Some(image);
                session.analysis = Some(analysis.clone());
            }
            Err(e) => {
                error!(error = %e, "analysis error");
                session.error = Some(user_message(e, ANALYZE_FALLBACK));
            }
        }
        outcome
    }

    /// Scores an edited image. Only `analysis` changes; the original stays put.
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub async fn reanalyze(&self, file: ImageFile) -> Result<AnalysisResponse, ClientError> {
        self.begin().await;
        if self.session.read().await.original_image.is_none() {
            let e = ClientError::NoOriginalImage;
            let mut session = self.session.write().await;
            session.is_loading = false;
            session.error = Some(e.to_string());
            return Err(e);
        }

        let outcome = self.api.analyze(&file).await;

        let mut session = self.session.write().await;
        session.is_loading = false;
        match &outcome {
            Ok(analysis) => session.analysis = Some(analysis.clone()),
            Err(e) => {
                error!(error = %e, "reanalysis error");
                session.error = Some(user_message(e, REANALYZE_FALLBACK));
            }
        }
        outcome
    }

    pub async fn set_edited_image(&self, image: Option<ImageRef>) {
        self.session.write().await.edited_image = image;
    }

    pub async fn reset(&self) {
        let mut session = self.session.write().await;
        *session = ClientSession::default();
        self.mirror(None);
    }

    async fn begin(&self) {
        let mut session = self.session.write().await;
        session.is_loading = true;
        session.error = None;
    }

    fn mirror(&self, image: Option<&ImageRef>) {
        let result = match image {
            Some(image) => self.durable.set(ORIGINAL_IMAGE_KEY, image.as_str()),
            None => self.durable.remove(ORIGINAL_IMAGE_KEY),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to mirror original image to durable storage");
        }
    }
}

fn user_message(e: &ClientError, fallback: &str) -> String {
    match e {
        ClientError::Server { message, .. } => message.clone().unwrap_or_else(|| fallback.to_string()),
        ClientError::Decode(_) => fallback.to_string(),
        other => other.to_string(),
    }
}
