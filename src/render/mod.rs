pub mod headless;

pub use headless::{HeadlessRenderer, SurfaceCommand};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Opaque handle to one surface opened by a [`SurfaceRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RendererHandle(Uuid);

impl RendererHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RendererHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RendererHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The out-of-process browser surface, seen from the screen.
///
/// Every call is fire-and-forget. Opening can fail asynchronously, in which
/// case later scripts against the handle simply do nothing. Implementations
/// must tolerate scripts and closes against handles that are already closed.
pub trait SurfaceRenderer: Send + Sync {
    fn open(&self, url: &str) -> RendererHandle;

    fn close(&self, handle: RendererHandle);

    fn execute_script(&self, handle: RendererHandle, script: &str, origin_url: &str);

    fn current_url(&self, handle: RendererHandle) -> Option<String>;
}

/// The single surface a screen may hold at a time.
pub struct RendererSlot {
    renderer: Arc<dyn SurfaceRenderer>,
    handle: Option<RendererHandle>,
}

impl RendererSlot {
    pub fn new(renderer: Arc<dyn SurfaceRenderer>) -> Self {
        Self { renderer, handle: None }
    }

    /// Open a surface at `url`, closing the previous one first.
    pub fn open(&mut self, url: &str) -> RendererHandle {
        self.close();
        let handle = self.renderer.open(url);
        info!("Opened renderer surface {} at {}", handle, url);
        self.handle = Some(handle);
        handle
    }

    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.renderer.close(handle);
            debug!("Closed renderer surface {}", handle);
        }
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<RendererHandle> {
        self.handle
    }

    pub fn current_url(&self) -> Option<String> {
        self.handle.and_then(|handle| self.renderer.current_url(handle))
    }

    /// Run `script` against the open surface. Without one this is a no-op.
    pub fn execute(&self, script: &str) {
        let Some(handle) = self.handle else {
            debug!("No renderer surface open, dropping script");
            return;
        };

        let origin = self.renderer.current_url(handle).unwrap_or_default();
        self.renderer.execute_script(handle, script, &origin);
    }
}

impl Drop for RendererSlot {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for RendererSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererSlot").field("handle", &self.handle).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_closes_the_previous_surface() {
        let renderer = Arc::new(HeadlessRenderer::new());
        let mut slot = RendererSlot::new(renderer.clone());

        let first = slot.open("https://a.example");
        let second = slot.open("https://b.example");

        assert_ne!(first, second);
        assert!(!renderer.is_open(first));
        assert!(renderer.is_open(second));
        assert_eq!(renderer.open_count(), 1);
        assert_eq!(slot.current_url().as_deref(), Some("https://b.example"));
    }

    #[test]
    fn close_is_idempotent_and_scripts_without_surface_are_dropped() {
        let renderer = Arc::new(HeadlessRenderer::new());
        let mut slot = RendererSlot::new(renderer.clone());

        slot.close();
        slot.close();
        slot.execute("play()");

        assert!(renderer.commands().is_empty());
    }

    #[test]
    fn dropping_the_slot_releases_the_surface() {
        let renderer = Arc::new(HeadlessRenderer::new());
        let handle = {
            let mut slot = RendererSlot::new(renderer.clone());
            slot.open("https://a.example")
        };
        assert!(!renderer.is_open(handle));
    }
}
