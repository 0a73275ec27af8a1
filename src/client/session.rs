//! Editor session state: upload → style → generate → result, observable by a UI

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::normalizer::ImageFile;
use crate::client::service::ImageGenerator;
use crate::error::Result;

/// A preset style from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub id: String,
    pub name: String,
    /// Prompt sent to the provider when this style is applied
    pub prompt: String,
    /// Thumbnail shown in the picker
    pub preview: String,
}

/// Snapshot of one editing session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub original_image: Option<ImageFile>,
    pub original_image_preview: Option<String>,
    pub selected_style: Option<Style>,
    pub generated_image_url: Option<String>,
    pub is_generating: bool,
    pub last_error: Option<String>,
}

struct Inner {
    generator: Arc<dyn ImageGenerator>,
    state: watch::Sender<SessionState>,
    /// Bumped on every reset; completions from an older epoch are dropped
    epoch: AtomicU64,
    /// Bumped on every upload; only the latest upload's preview is kept
    uploads: AtomicU64,
}

/// In-memory session shared between the UI and background work
#[derive(Clone)]
pub struct EditorSession {
    inner: Arc<Inner>,
}

impl EditorSession {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                generator,
                state,
                epoch: AtomicU64::new(0),
                uploads: AtomicU64::new(0),
            }),
        }
    }

    /// Current state
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Store the upload and derive its preview in the background.
    ///
    /// Returns immediately; await the handle to wait for the preview.
    pub fn set_original_image(&self, file: ImageFile) -> JoinHandle<()> {
        let mut upload = 0;
        self.inner.state.send_modify(|state| {
            upload = self.inner.uploads.fetch_add(1, Ordering::SeqCst) + 1;
            state.original_image = Some(file.clone());
            state.original_image_preview = None;
        });

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let preview = file.preview_data_url();
            inner.state.send_if_modified(|state| {
                if inner.uploads.load(Ordering::SeqCst) != upload {
                    debug!(upload, "Dropping preview of a replaced upload");
                    return false;
                }
                state.original_image_preview = Some(preview);
                true
            });
        })
    }

    pub fn set_selected_style(&self, style: Option<Style>) {
        self.inner.state.send_modify(|state| state.selected_style = style);
    }

    /// Run one generation with the stored image and style.
    ///
    /// Does nothing without an image and a style, or while a generation is in flight.
    pub async fn generate_image(&self) {
        let mut job = None;
        self.inner.state.send_if_modified(|state| {
            if state.is_generating {
                return false;
            }
            let (Some(image), Some(style)) = (&state.original_image, &state.selected_style) else {
                return false;
            };
            job = Some((
                image.clone(),
                style.prompt.clone(),
                self.inner.epoch.load(Ordering::SeqCst),
            ));
            state.is_generating = true;
            state.last_error = None;
            true
        });

        let Some((image, prompt, epoch)) = job else {
            return;
        };

        let in_flight = InFlight {
            inner: self.inner.clone(),
            epoch,
            armed: true,
        };
        let outcome = self.inner.generator.generate(&image, &prompt).await;
        in_flight.complete(outcome);
    }

    /// Return every field to its initial value
    pub fn reset(&self) {
        self.inner.state.send_modify(|state| {
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            self.inner.uploads.fetch_add(1, Ordering::SeqCst);
            *state = SessionState::default();
        });
    }
}

/// One running generation; dropping it before `complete` clears `is_generating`
struct InFlight {
    inner: Arc<Inner>,
    epoch: u64,
    armed: bool,
}

impl InFlight {
    fn complete(mut self, outcome: Result<String>) {
        self.armed = false;
        let epoch = self.epoch;
        self.inner.state.send_if_modified(|state| {
            if self.inner.epoch.load(Ordering::SeqCst) != epoch {
                debug!(epoch, "Discarding result of a superseded generation");
                return false;
            }
            match outcome {
                Ok(url) => state.generated_image_url = Some(url),
                Err(e) => {
                    warn!(error = %e, "Generation failed");
                    state.last_error = Some(e.to_string());
                }
            }
            state.is_generating = false;
            true
        });
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let epoch = self.epoch;
        self.inner.state.send_if_modified(|state| {
            if self.inner.epoch.load(Ordering::SeqCst) != epoch || !state.is_generating {
                return false;
            }
            debug!(epoch, "Generation abandoned before completion");
            state.is_generating = false;
            true
        });
    }
}
