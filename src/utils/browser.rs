use crate::error::{other_error, DaemonResult};
use tracing::debug;

/// Opens links for the user
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> DaemonResult<()>;
}

/// Opens links in the user's default browser
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl LinkOpener for SystemBrowser {
    fn open(&self, url: &str) -> DaemonResult<()> {
        debug!("Opening {} in browser", url);
        webbrowser::open(url)
            .map_err(|e| other_error(&format!("Failed to open {} in browser: {}", url, e)))
    }
}
