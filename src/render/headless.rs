use std::sync::Mutex;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, trace};

use super::{RendererHandle, SurfaceRenderer};

/// Everything a [`HeadlessRenderer`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SurfaceCommand {
    Open {
        handle: RendererHandle,
        url: String,
    },
    Close {
        handle: RendererHandle,
    },
    Script {
        handle: RendererHandle,
        script: String,
        origin: String,
    },
}

/// In-process renderer that keeps no pixels, only a command log.
///
/// Scripts sent to a closed surface are ignored, the way a real browser drops
/// calls queued against a frame that has gone away.
#[derive(Default)]
pub struct HeadlessRenderer {
    surfaces: DashMap<RendererHandle, String>,
    log: Mutex<Vec<SurfaceCommand>>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<SurfaceCommand> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Scripts executed against live surfaces, in order.
    pub fn scripts(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                SurfaceCommand::Script { script, .. } => Some(script),
                _ => None,
            })
            .collect()
    }

    pub fn is_open(&self, handle: RendererHandle) -> bool {
        self.surfaces.contains_key(&handle)
    }

    pub fn open_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn clear_log(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }

    fn record(&self, command: SurfaceCommand) {
        if let Ok(mut log) = self.log.lock() {
            log.push(command);
        }
    }
}

impl SurfaceRenderer for HeadlessRenderer {
    fn open(&self, url: &str) -> RendererHandle {
        let handle = RendererHandle::new();
        self.surfaces.insert(handle, url.to_string());
        self.record(SurfaceCommand::Open {
            handle,
            url: url.to_string(),
        });
        handle
    }

    fn close(&self, handle: RendererHandle) {
        if self.surfaces.remove(&handle).is_some() {
            self.record(SurfaceCommand::Close { handle });
        }
    }

    fn execute_script(&self, handle: RendererHandle, script: &str, origin_url: &str) {
        if !self.surfaces.contains_key(&handle) {
            debug!("Surface {} is closed, ignoring script", handle);
            return;
        }

        trace!("Executing on {}: {}", handle, script);
        self.record(SurfaceCommand::Script {
            handle,
            script: script.to_string(),
            origin: origin_url.to_string(),
        });
    }

    fn current_url(&self, handle: RendererHandle) -> Option<String> {
        self.surfaces.get(&handle).map(|url| url.value().clone())
    }
}
