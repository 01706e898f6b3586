pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::render::{RendererSlot, SurfaceRenderer};
use crate::service::template::{ScriptTemplate, ScriptValues};
use crate::service::VideoServiceDescriptor;

/// What a service knows about one piece of content.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub service: Arc<VideoServiceDescriptor>,
    pub id: String,
    pub livestream: bool,
    pub duration_seconds: Option<u64>,
}

impl VideoInfo {
    pub fn new(service: Arc<VideoServiceDescriptor>, id: impl Into<String>) -> Self {
        Self {
            service,
            id: id.into(),
            livestream: false,
            duration_seconds: None,
        }
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn livestream(mut self) -> Self {
        self.livestream = true;
        self.duration_seconds = None;
        self
    }
}

/// A video as scheduled on the server: content plus the moment it began.
#[derive(Debug, Clone)]
pub struct Video {
    pub info: VideoInfo,
    pub started_at: DateTime<Utc>,
}

impl Video {
    pub fn new(info: VideoInfo, started_at: DateTime<Utc>) -> Self {
        Self { info, started_at }
    }

    pub fn url(&self) -> String {
        self.info.service.resolve_url(&self.info.id)
    }

    /// Whole seconds since the video started. `None` for livestreams and when
    /// `now` is before the start.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<u64> {
        if self.info.livestream {
            return None;
        }

        u64::try_from((now - self.started_at).num_seconds()).ok()
    }

    /// Where a joining screen should seek to, if anywhere.
    ///
    /// Only inside the known duration. Past the end, or with no duration at
    /// all, the video just starts.
    pub fn seek_offset(&self, now: DateTime<Utc>) -> Option<u64> {
        let elapsed = self.elapsed(now)?;
        let duration = self.info.duration_seconds?;
        (elapsed < duration).then_some(elapsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// No surface open.
    Empty,
    /// Surface opened at the service URL, start not yet signaled.
    Loaded,
    /// Start script issued.
    Playing,
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackPhase::Empty => "empty",
            PlaybackPhase::Loaded => "loaded",
            PlaybackPhase::Playing => "playing",
        };
        f.write_str(name)
    }
}

/// The video a screen holds and the surface playing it.
#[derive(Debug)]
pub struct PlaybackState {
    video: Option<Video>,
    phase: PlaybackPhase,
    surface: RendererSlot,
}

impl PlaybackState {
    pub fn new(renderer: Arc<dyn SurfaceRenderer>) -> Self {
        Self {
            video: None,
            phase: PlaybackPhase::Empty,
            surface: RendererSlot::new(renderer),
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn video(&self) -> Option<&Video> {
        self.video.as_ref()
    }

    pub fn surface(&self) -> &RendererSlot {
        &self.surface
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<u64> {
        self.video.as_ref().and_then(|video| video.elapsed(now))
    }

    pub fn seek_offset(&self, now: DateTime<Utc>) -> Option<u64> {
        self.video.as_ref().and_then(|video| video.seek_offset(now))
    }

    /// Replace the held video and open a fresh surface at its URL.
    pub fn load(&mut self, video: Video) {
        let url = video.url();
        debug!(
            "Loading {} video {} ({} -> loaded)",
            video.info.service.id(),
            video.info.id,
            self.phase
        );

        self.surface.open(&url);
        self.video = Some(video);
        self.phase = PlaybackPhase::Loaded;
    }

    /// Signal playback, seeking first when joining a video already underway.
    ///
    /// Returns whether the state moved to [`PlaybackPhase::Playing`].
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != PlaybackPhase::Loaded {
            debug!("Ignoring start while {}", self.phase);
            return false;
        }
        let Some(video) = self.video.as_ref() else {
            return false;
        };

        let service = &video.info.service;
        if let Some(offset) = video.seek_offset(now) {
            self.run(service.seek_script(), &ScriptValues::new().seconds(offset));
        }

        let values = ScriptValues::new()
            .content_id(&video.info.id)
            .livestream(video.info.livestream);
        self.run(service.start_script(), &values);

        self.phase = PlaybackPhase::Playing;
        true
    }

    pub fn set_volume(&self, fraction: f32) {
        let Some(video) = self.active_video() else {
            return;
        };

        self.run(
            video.info.service.set_volume_script(),
            &ScriptValues::new().volume(fraction),
        );
    }

    pub fn seek_to(&self, seconds: u64) {
        let Some(video) = self.active_video() else {
            return;
        };
        if video.info.livestream {
            debug!("Ignoring seek on livestream {}", video.info.id);
            return;
        }
        if video.info.duration_seconds.is_some_and(|duration| seconds >= duration) {
            debug!("Ignoring seek to {}s past the end of {}", seconds, video.info.id);
            return;
        }

        self.run(video.info.service.seek_script(), &ScriptValues::new().seconds(seconds));
    }

    pub fn probe_live_state(&self) {
        let Some(video) = self.active_video() else {
            return;
        };

        self.run(
            video.info.service.live_state_script(),
            &ScriptValues::new().content_id(&video.info.id),
        );
    }

    /// Reopen the held video, e.g. after the renderer crashed.
    pub fn reload(&mut self) {
        if let Some(video) = self.video.take() {
            self.load(video);
        }
    }

    /// Release the surface. The video is kept so [`reload`](Self::reload) can
    /// bring it back.
    pub fn close(&mut self) {
        self.surface.close();
        self.phase = PlaybackPhase::Empty;
    }

    pub fn clear(&mut self) {
        self.close();
        self.video = None;
    }

    fn active_video(&self) -> Option<&Video> {
        match self.phase {
            PlaybackPhase::Empty => None,
            PlaybackPhase::Loaded | PlaybackPhase::Playing => self.video.as_ref(),
        }
    }

    fn run(&self, template: &ScriptTemplate, values: &ScriptValues<'_>) {
        match template.render(values) {
            Ok(script) => self.surface.execute(&script),
            Err(e) => warn!("Dropping {} script: {}", template.role().name(), e),
        }
    }
}
