use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, instrument, warn};

use super::{
    params::EditParams,
    pipeline::{render, RenderError},
    SaveError,
};
use crate::{
    analysis::AnalysisResponse,
    client::{ClientSession, ImageFile, SessionStore},
    config::EditorConfig,
};

/// A rendered preview and the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub generation: u64,
    pub params: EditParams,
    pub image: ImageFile,
}

struct Inner {
    source: Arc<ImageFile>,
    config: EditorConfig,
    params: Mutex<EditParams>,
    issued: AtomicU64,
    pending: Mutex<Option<JoinHandle<()>>>,
    preview: watch::Sender<Preview>,
}

impl Inner {
    fn next_generation(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn cancel_pending(&self) {
        if let Some(timer) = self.pending.lock().unwrap_or_else(PoisonError::into_inner).take() {
            timer.abort();
        }
    }

    /// Installs `preview` unless something newer is already showing.
    fn publish(&self, preview: Preview) -> bool {
        self.preview.send_if_modified(|current| {
            if preview.generation > current.generation {
                *current = preview;
                true
            } else {
                false
            }
        })
    }

    async fn render_and_publish(
        self: Arc<Self>,
        generation: u64,
        params: EditParams,
    ) -> Result<Preview, RenderError> {
        let source = self.source.clone();
        let quality = self.config.jpeg_quality;
        let rendered = tokio::task::spawn_blocking(move || render(&source, params, quality))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))
            .and_then(|r| r);

        match rendered {
            Ok(image) => {
                let preview = Preview {
                    generation,
                    params,
                    image,
                };
                if !self.publish(preview.clone()) {
                    debug!(generation, "render superseded");
                }
                Ok(preview)
            }
            Err(e) => {
                warn!(error = %e, generation, "render failed; keeping previous preview");
                Err(e)
            }
        }
    }
}

/// Debounced renderer over one source image.
///
/// Every `adjust` restarts the quiet-period timer. Renders already running are
/// left alone; a finished render is shown only if nothing newer has been shown.
pub struct PreviewRenderer {
    inner: Arc<Inner>,
}

impl PreviewRenderer {
    pub fn new(source: ImageFile, config: EditorConfig) -> Self {
        let initial = Preview {
            generation: 0,
            params: EditParams::default(),
            image: source.clone(),
        };
        let (preview, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                source: Arc::new(source),
                config,
                params: Mutex::new(EditParams::default()),
                issued: AtomicU64::new(0),
                pending: Mutex::new(None),
                preview,
            }),
        }
    }

    /// Opens the editor on the session's original image.
    pub fn for_session(session: &ClientSession, config: EditorConfig) -> Result<Self, RenderError> {
        let original = session.original_image.as_ref().ok_or(RenderError::NoSource)?;
        let source = original
            .to_file()
            .map_err(|e| RenderError::Decode(format!("{e:#}")))?;
        Ok(Self::new(source, config))
    }

    pub fn source(&self) -> &ImageFile {
        &self.inner.source
    }

    pub fn params(&self) -> EditParams {
        *self.inner.params.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> Preview {
        self.inner.preview.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Preview> {
        self.inner.preview.subscribe()
    }

    /// Records new slider values and schedules a render after the quiet period.
    pub fn adjust(&self, params: EditParams) {
        let params = params.clamped();
        *self.inner.params.lock().unwrap_or_else(PoisonError::into_inner) = params;
        let generation = self.inner.next_generation();

        let inner = self.inner.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce).await;
            tokio::spawn(async move {
                let _ = inner.render_and_publish(generation, params).await;
            });
        });

        let previous = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Renders the latest params right now, skipping the quiet period.
    pub async fn flush(&self) -> Result<Preview, RenderError> {
        self.inner.cancel_pending();
        let params = self.params();
        let generation = self.inner.next_generation();
        self.inner.clone().render_and_publish(generation, params).await
    }

    /// Drops all adjustments and shows the original again.
    pub fn reset_edits(&self) {
        self.inner.cancel_pending();
        *self.inner.params.lock().unwrap_or_else(PoisonError::into_inner) = EditParams::default();
        let generation = self.inner.next_generation();
        self.inner.publish(Preview {
            generation,
            params: EditParams::default(),
            image: (*self.inner.source).clone(),
        });
    }

    /// The current preview packaged as a file.
    pub fn download(&self) -> ImageFile {
        let mut file = self.current().image;
        file.name = format!("edited-image.{}", file.mime.extension());
        file
    }

    /// Applies pending edits, records the result as the edited image and resubmits it.
    #[instrument(skip(self, store))]
    pub async fn save(&self, store: &SessionStore) -> Result<AnalysisResponse, SaveError> {
        self.flush().await?;
        let file = self.download();
        store.set_edited_image(Some(file.to_ref())).await;
        Ok(store.reanalyze(file).await?)
    }
}

impl Drop for PreviewRenderer {
    fn drop(&mut self) {
        self.inner.cancel_pending();
    }
}
