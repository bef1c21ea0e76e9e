use crate::logging::{self, LoggingError};
use crate::service::{HighlightEvent, HighlightService, PageEvent, SharedDocument};
use crate::theme::ThemeSignal;
use mark_store::MarkStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;

/// A running [`HighlightService`] attached to a page.
#[derive(Debug)]
pub struct Session {
    page_events: UnboundedSender<PageEvent>,
    store: Arc<MarkStore>,
    handle: JoinHandle<()>,
    pub highlights: broadcast::Receiver<HighlightEvent>,
    _log_guard: Option<WorkerGuard>,
}

impl Session {
    /// Returns `false` if the service has exited.
    pub fn send(&self, event: PageEvent) -> bool {
        self.page_events.send(event).is_ok()
    }

    pub fn store(&self) -> &Arc<MarkStore> {
        &self.store
    }

    /// Closes the event channel and waits for the pending work to finish.
    pub async fn shutdown(self) {
        let Self {
            page_events,
            handle,
            ..
        } = self;
        drop(page_events);
        if let Err(err) = handle.await {
            tracing::error!(?err, "Highlight service panicked");
        }
    }
}

/// Loads the config, sets up logging and starts serving `document`.
///
/// The stored marks are restored on the page right away.
pub async fn start(
    config_file: Option<PathBuf>,
    document: SharedDocument,
    theme: ThemeSignal,
) -> Result<Session, LoggingError> {
    let (config, maybe_config_err) = wordmark_config::load_config_on_startup(config_file);

    let log_guard = logging::init(&config.log)?;

    if let Some(err) = maybe_config_err {
        tracing::error!(?err, "Invalid config file, using the defaults");
    }

    let service = HighlightService::from_config(config, document, theme).await;
    let store = service.store().clone();
    let highlights = service.subscribe();

    let (page_events, rx) = unbounded_channel();
    page_events.send(PageEvent::Restore).ok();

    let handle = tokio::spawn(service.run(rx));

    tracing::debug!(marks = store.len(), "Highlight session started");

    Ok(Session {
        page_events,
        store,
        handle,
        highlights,
        _log_guard: log_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::Document;
    use parking_lot::Mutex;

    #[tokio::test(start_paused = true)]
    async fn test_session() {
        let dir = tempfile::tempdir().unwrap();
        let data_file = dir.path().join("marks.json");
        let config_file = dir.path().join("config.toml");
        std::fs::write(
            &data_file,
            r#"{"wordMarkings":{"gold":3},"settings":{"highlightBaseColor":"orange"}}"#,
        )
        .unwrap();
        std::fs::write(
            &config_file,
            format!(
                "[highlight]\ndebounce-ms = 20\n\n[storage]\ndata-file = {:?}\n",
                data_file.display().to_string()
            ),
        )
        .unwrap();

        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let text = doc.append_text(p, "silver and gold").unwrap();
        let document = Arc::new(Mutex::new(doc));

        let mut session = start(Some(config_file), document.clone(), ThemeSignal::default())
            .await
            .unwrap();
        assert_eq!(session.store().get_count("gold"), 3);

        document.lock().select(text, 1, text, 2).unwrap();
        assert!(session.send(PageEvent::MouseUp));

        let event = session.highlights.recv().await.unwrap();
        assert_eq!(event.word, "silver");
        assert_eq!(event.count, 1);

        assert_eq!(
            document.lock().outer_html(p),
            concat!(
                r#"<p><span class="wordmark-orange-500" data-word="silver" data-count="1">silver</span> and "#,
                r#"<span class="wordmark-orange-700" data-word="gold" data-count="3">gold</span></p>"#,
            )
        );

        session.shutdown().await;

        let persisted = std::fs::read_to_string(&data_file).unwrap();
        assert!(persisted.contains(r#""silver":1"#));
    }
}
