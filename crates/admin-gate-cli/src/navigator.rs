//! Terminal stand-in for the browser location.

use parking_lot::Mutex;
use session_gate::{Navigator, PageLocation};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Keeps the "current page" for a CLI run and records every navigation.
pub struct ConsoleNavigator {
    location: Mutex<PageLocation>,
    history: Mutex<Vec<String>>,
    navigations: watch::Sender<usize>,
}

impl ConsoleNavigator {
    pub fn new(href: &str) -> anyhow::Result<Self> {
        let location = PageLocation::parse(href)
            .map_err(|e| anyhow::anyhow!("invalid page URL {href:?}: {e}"))?;
        let (navigations, _) = watch::channel(0);
        Ok(Self {
            location: Mutex::new(location),
            history: Mutex::new(Vec::new()),
            navigations,
        })
    }

    pub fn navigation_count(&self) -> usize {
        *self.navigations.borrow()
    }

    pub fn last_destination(&self) -> Option<String> {
        self.history.lock().last().cloned()
    }

    /// Wait until more than `seen` navigations happened and return the latest.
    pub async fn wait_for_navigation(&self, seen: usize, timeout: Duration) -> Option<String> {
        let mut rx = self.navigations.subscribe();
        let waited = tokio::time::timeout(timeout, rx.wait_for(|count| *count > seen)).await;
        match waited {
            Ok(Ok(_)) => self.last_destination(),
            _ => None,
        }
    }
}

impl Navigator for ConsoleNavigator {
    fn location(&self) -> PageLocation {
        self.location.lock().clone()
    }

    fn replace(&self, destination: &str) {
        {
            let mut location = self.location.lock();
            match location.join(destination) {
                Ok(url) => *location = PageLocation::from_url(url),
                Err(e) => warn!(destination = %destination, error = %e, "Unresolvable destination"),
            }
        }
        info!(destination = %destination, "Navigating");
        self.history.lock().push(destination.to_string());
        self.navigations.send_modify(|count| *count += 1);
    }
}
