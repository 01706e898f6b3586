pub mod template;

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::error::TemplateError;
use crate::{Result, ScreenError};
use self::template::{ScriptTemplate, ScriptValues, TemplateRole};

/// Per-service URL pattern and script dialect.
///
/// Immutable once built; screens share it through an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoServiceDescriptor {
    id: String,
    url: ScriptTemplate,
    set_volume: ScriptTemplate,
    start: ScriptTemplate,
    seek: ScriptTemplate,
    live_state: ScriptTemplate,
}

impl VideoServiceDescriptor {
    pub fn new(
        id: impl Into<String>,
        url: &str,
        set_volume_js: &str,
        start_js: &str,
        seek_js: &str,
        live_state_js: &str,
    ) -> std::result::Result<Self, TemplateError> {
        Ok(Self {
            id: id.into(),
            url: ScriptTemplate::parse(TemplateRole::Url, url)?,
            set_volume: ScriptTemplate::parse(TemplateRole::SetVolume, set_volume_js)?,
            start: ScriptTemplate::parse(TemplateRole::Start, start_js)?,
            seek: ScriptTemplate::parse(TemplateRole::Seek, seek_js)?,
            live_state: ScriptTemplate::parse(TemplateRole::LiveState, live_state_js)?,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// URL the renderer should open for `content_id`. Templates without a
    /// content-id placeholder are returned verbatim.
    pub fn resolve_url(&self, content_id: &str) -> String {
        self.url
            .render(&ScriptValues::new().content_id(content_id))
            .unwrap_or_else(|_| self.url.source().to_string())
    }

    pub fn set_volume_script(&self) -> &ScriptTemplate {
        &self.set_volume
    }

    pub fn start_script(&self) -> &ScriptTemplate {
        &self.start
    }

    pub fn seek_script(&self) -> &ScriptTemplate {
        &self.seek
    }

    pub fn live_state_script(&self) -> &ScriptTemplate {
        &self.live_state
    }
}

/// Registry of video services, keyed by service id.
#[derive(Default)]
pub struct ServiceCatalog {
    services: DashMap<String, Arc<VideoServiceDescriptor>>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, descriptor: VideoServiceDescriptor) -> Result<Arc<VideoServiceDescriptor>> {
        let id = descriptor.id().to_string();
        match self.services.entry(id) {
            Entry::Occupied(entry) => Err(ScreenError::Config(format!(
                "video service {} is already registered",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                info!("Registered video service {}", entry.key());
                let descriptor = Arc::new(descriptor);
                entry.insert(Arc::clone(&descriptor));
                Ok(descriptor)
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<VideoServiceDescriptor>> {
        self.services.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn require(&self, id: &str) -> Result<Arc<VideoServiceDescriptor>> {
        self.get(id).ok_or_else(|| {
            debug!("Lookup of unknown video service {}", id);
            ScreenError::UnknownService(id.to_string())
        })
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.services.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed() -> VideoServiceDescriptor {
        VideoServiceDescriptor::new(
            "embed",
            "https://player.example/embed/%s?autoplay=0",
            "player.setVolume(%d);",
            "player.load('%s', %b);",
            "player.seekTo(%d);",
            "player.isLive('%s');",
        )
        .unwrap()
    }

    #[test]
    fn url_substitutes_content_id() {
        assert_eq!(embed().resolve_url("abc"), "https://player.example/embed/abc?autoplay=0");

        let fixed = VideoServiceDescriptor::new(
            "channel",
            "https://tv.example/live?start=auto",
            "v.volume = %f;",
            "v.play();",
            "v.currentTime = %d;",
            "true",
        )
        .unwrap();
        assert_eq!(fixed.resolve_url("ignored"), "https://tv.example/live?start=auto");
    }

    #[test]
    fn invalid_templates_fail_registration() {
        let err = VideoServiceDescriptor::new("bad", "u", "a(%d, %f)", "s", "k", "l").unwrap_err();
        assert_eq!(err, TemplateError::MixedVolumeEncodings);
    }

    #[test]
    fn catalog_rejects_duplicates() {
        let catalog = ServiceCatalog::new();
        catalog.register(embed()).unwrap();
        assert!(matches!(catalog.register(embed()), Err(ScreenError::Config(_))));
        assert_eq!(catalog.ids(), vec!["embed".to_string()]);
        assert!(catalog.get("embed").is_some());
        assert!(matches!(catalog.require("nope"), Err(ScreenError::UnknownService(_))));
    }

    #[test]
    fn concurrent_registration_admits_one_descriptor() {
        let catalog = Arc::new(ServiceCatalog::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                std::thread::spawn(move || catalog.register(embed()).is_ok())
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(catalog.len(), 1);
    }
}
