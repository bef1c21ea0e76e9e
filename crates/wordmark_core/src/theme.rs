use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }
}

/// The page color scheme, observable by whoever renders highlights.
///
/// Clones share the same value. Dropping a receiver returned by [`ThemeSignal::subscribe`]
/// unsubscribes it.
#[derive(Debug, Clone)]
pub struct ThemeSignal {
    sender: Arc<watch::Sender<Theme>>,
}

impl Default for ThemeSignal {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl ThemeSignal {
    pub fn new(theme: Theme) -> Self {
        let (sender, _) = watch::channel(theme);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn current(&self) -> Theme {
        *self.sender.borrow()
    }

    pub fn set(&self, theme: Theme) {
        let old = self.sender.send_replace(theme);
        if old != theme {
            tracing::debug!(?old, new = ?theme, "Theme changed");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_theme_signal() {
        let signal = ThemeSignal::default();
        assert_eq!(signal.current(), Theme::Light);

        let mut receiver = signal.subscribe();
        signal.clone().set(Theme::Dark);

        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow(), Theme::Dark);
        assert!(signal.current().is_dark());
    }
}
