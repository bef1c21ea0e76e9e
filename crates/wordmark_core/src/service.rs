use crate::coordinator::Debouncer;
use crate::expander::{self, ExpandError};
use crate::renderer::{self, RenderError};
use crate::theme::ThemeSignal;
use dom::{Document, NodeId};
use mark_store::{JsonFileStore, KeyValueStore, MarkStore, MemoryStore, Settings, StoreError};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc::UnboundedReceiver};
use tokio::time::Instant;
use wordmark_config::Config;

/// The page the service works on, never locked across an `.await`.
pub type SharedDocument = Arc<Mutex<Document>>;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// The user released the mouse, possibly ending a selection.
    MouseUp,
    /// Forget every mark and remove every marker from the page.
    ClearAll,
    /// Mark the stored words on the page.
    Restore,
}

/// Emitted after a word has been highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightEvent {
    pub word: String,
    pub count: u8,
    pub marker: NodeId,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no selection to highlight")]
    NoSelection,
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Whether the error only means there was nothing to highlight.
    fn is_benign(&self) -> bool {
        matches!(self, Self::NoSelection | Self::Expand(ExpandError::Empty))
    }
}

#[derive(Debug)]
pub struct HighlightService {
    document: SharedDocument,
    store: Arc<MarkStore>,
    settings: RwLock<Settings>,
    theme: ThemeSignal,
    debouncer: Debouncer,
    highlights: broadcast::Sender<HighlightEvent>,
}

impl HighlightService {
    pub fn new(
        document: SharedDocument,
        store: Arc<MarkStore>,
        settings: Settings,
        theme: ThemeSignal,
    ) -> Self {
        let (highlights, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            document,
            store,
            settings: RwLock::new(settings),
            theme,
            debouncer: Debouncer::default(),
            highlights,
        }
    }

    /// Builds the service with the storage and the debounce delay of `config`.
    ///
    /// Marks are kept in memory only when no data file is available.
    pub async fn from_config(
        config: &Config,
        document: SharedDocument,
        theme: ThemeSignal,
    ) -> Self {
        let backend: Arc<dyn KeyValueStore> = match config.storage.data_file_path() {
            Some(path) => Arc::new(JsonFileStore::new(path)),
            None => match JsonFileStore::in_data_dir() {
                Ok(store) => Arc::new(store),
                Err(err) => {
                    tracing::warn!(?err, "No data directory, word marks are not persisted");
                    Arc::new(MemoryStore::new())
                }
            },
        };

        let fallback = Settings {
            highlight_base_color: config.highlight.base_color.clone(),
        };
        let settings = Settings::load_or(backend.as_ref(), fallback).await;
        let store = MarkStore::load(backend).await;

        Self::new(document, Arc::new(store), settings, theme)
            .with_debounce_delay(config.highlight.debounce_delay())
    }

    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debouncer = Debouncer::new(delay);
        self
    }

    pub fn store(&self) -> &Arc<MarkStore> {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HighlightEvent> {
        self.highlights.subscribe()
    }

    pub fn base_color(&self) -> String {
        self.settings.read().highlight_base_color.clone()
    }

    /// Changes the palette of the future highlights and persists it.
    pub async fn set_base_color(&self, color: &str) -> Result<(), PipelineError> {
        let settings = {
            let mut settings = self.settings.write();
            settings.highlight_base_color = color.trim().to_string();
            settings.clone()
        };
        settings.save(self.store.backend().as_ref()).await?;
        Ok(())
    }

    /// Processes the page events until the channel is closed.
    pub async fn run(mut self, mut page_events: UnboundedReceiver<PageEvent>) {
        // If the debounce timer isn't active, it will be set to expire "never",
        // which is actually just 1 year in the future.
        const NEVER: Duration = Duration::from_secs(365 * 24 * 60 * 60);

        let debounce_timer = tokio::time::sleep(NEVER);
        tokio::pin!(debounce_timer);

        loop {
            tokio::select! {
                maybe_page_event = page_events.recv() => {
                    match maybe_page_event {
                        Some(PageEvent::MouseUp) => {
                            self.debouncer.on_mouse_up(Instant::now());
                            if let Some(deadline) = self.debouncer.deadline() {
                                debounce_timer.as_mut().reset(deadline);
                            }
                        }
                        Some(PageEvent::ClearAll) => {
                            if let Err(err) = self.clear_all().await {
                                tracing::error!(?err, "Failed to clear the word marks");
                            }
                        }
                        Some(PageEvent::Restore) => {
                            if let Err(err) = self.restore().await {
                                tracing::error!(?err, "Failed to restore the word marks");
                            }
                        }
                        None => break, // channel has closed.
                    }
                }
                _ = debounce_timer.as_mut(), if self.debouncer.is_pending() => {
                    debounce_timer.as_mut().reset(Instant::now() + NEVER);

                    if self.debouncer.poll(Instant::now()) {
                        self.on_selection_settled().await;
                    }
                }
            }
        }

        tracing::debug!("Page event channel closed, highlight service exited");
    }

    async fn on_selection_settled(&self) {
        match self.highlight_selection().await {
            Ok(HighlightEvent { word, count, .. }) => {
                tracing::debug!(%word, count, "Highlighted selection");
            }
            Err(err) if err.is_benign() => {
                tracing::debug!(?err, "Nothing to highlight");
            }
            Err(err) => {
                tracing::error!(?err, "Failed to highlight the selection");
            }
        }
    }

    /// Highlights the word under the live selection.
    ///
    /// The count is not rolled back if the marker can not be inserted.
    pub async fn highlight_selection(&self) -> Result<HighlightEvent, PipelineError> {
        let expansion = {
            let document = self.document.lock();
            let selection = document.selection();
            if selection.range_count() == 0 || selection.is_collapsed() {
                return Err(PipelineError::NoSelection);
            }
            let range = selection.range_at(0).ok_or(PipelineError::NoSelection)?;
            expander::expand(&document, &range)?
        };

        let count = self.store.record_occurrence(&expansion.word).await;

        let base_color = self.base_color();
        let marker = {
            let mut document = self.document.lock();
            let marker = renderer::render(
                &mut document,
                &expansion.range,
                &expansion.word,
                count,
                &base_color,
                self.theme.current(),
            )?;
            document.selection_mut().remove_all_ranges();
            marker
        };

        let event = HighlightEvent {
            word: expansion.word,
            count,
            marker,
        };
        // No subscriber is fine.
        let _ = self.highlights.send(event.clone());

        Ok(event)
    }

    /// Forgets every mark and unwraps every marker, returns the number of markers removed.
    pub async fn clear_all(&self) -> Result<usize, PipelineError> {
        self.store.clear().await;
        let removed = renderer::remove_markers(&mut self.document.lock(), None)?;
        tracing::debug!(removed, "Cleared all the word marks");
        Ok(removed)
    }

    /// Marks the stored words on the page, returns the number of markers created.
    pub async fn restore(&self) -> Result<usize, PipelineError> {
        let marks = self.store.marks();
        let base_color = self.base_color();
        let total = renderer::restore_marks(
            &mut self.document.lock(),
            &marks,
            &base_color,
            self.theme.current(),
        )?;
        Ok(total)
    }
}
