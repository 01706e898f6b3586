pub mod preview;

pub use preview::PreviewScreen;

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::media::{Clock, PlaybackPhase, PlaybackState, SystemClock, Video};
use crate::network::{PacketReader, PacketSerializable};
use crate::render::{RendererHandle, SurfaceRenderer};
use crate::world::{BindingState, World, WorldBinding};
use crate::{BlockPos, ChunkPos, DecodeError, Facing, Result, ScreenError};

/// Screen attributes as sent by the server, in wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenState {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub facing: Facing,
    pub width: f32,
    pub height: f32,
    pub visible: bool,
    pub muted: bool,
}

impl ScreenState {
    pub fn pos(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }

    pub fn decode(mut bytes: &[u8]) -> std::result::Result<Self, DecodeError> {
        Self::from_bytes(&mut bytes)
    }
}

impl PacketSerializable for ScreenState {
    fn from_bytes<B: Buf>(buf: &mut B) -> std::result::Result<Self, DecodeError> {
        let mut reader = PacketReader::new(buf);

        Ok(Self {
            x: reader.read_i32()?,
            y: reader.read_i32()?,
            z: reader.read_i32()?,
            facing: reader.read_string()?.parse()?,
            width: reader.read_f32()?,
            height: reader.read_f32()?,
            visible: reader.read_bool()?,
            muted: reader.read_bool()?,
        })
    }

    fn to_bytes(&self, _buf: &mut BytesMut) -> Result<()> {
        Err(ScreenError::UnsupportedOperation(
            "screen state is receive-only on the client".into(),
        ))
    }
}

/// A video screen placed in the world.
///
/// Owns its playback state (and through it, at most one renderer surface),
/// the binding that keeps its marker block in the world, and any preview
/// screens projecting the same video.
pub struct ScreenEntity {
    state: ScreenState,
    playback: PlaybackState,
    binding: WorldBinding,
    previews: Vec<PreviewScreen>,
    clock: Arc<dyn Clock>,
}

impl ScreenEntity {
    pub fn new(state: ScreenState, renderer: Arc<dyn SurfaceRenderer>) -> Self {
        Self {
            binding: WorldBinding::new(state.pos()),
            state,
            playback: PlaybackState::new(renderer),
            previews: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn from_bytes<B: Buf>(
        buf: &mut B,
        renderer: Arc<dyn SurfaceRenderer>,
    ) -> std::result::Result<Self, DecodeError> {
        Ok(Self::new(ScreenState::from_bytes(buf)?, renderer))
    }

    /// Never supported on the client.
    pub fn to_bytes(&self, buf: &mut BytesMut) -> Result<()> {
        self.state.to_bytes(buf)
    }

    pub fn x(&self) -> i32 {
        self.state.x
    }

    pub fn y(&self) -> i32 {
        self.state.y
    }

    pub fn z(&self) -> i32 {
        self.state.z
    }

    pub fn pos(&self) -> BlockPos {
        self.binding.pos()
    }

    pub fn chunk_pos(&self) -> ChunkPos {
        self.pos().chunk()
    }

    pub fn facing(&self) -> Facing {
        self.state.facing
    }

    pub fn width(&self) -> f32 {
        self.state.width
    }

    pub fn height(&self) -> f32 {
        self.state.height
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn is_muted(&self) -> bool {
        self.state.muted
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.playback.phase()
    }

    pub fn video(&self) -> Option<&Video> {
        self.playback.video()
    }

    pub fn has_renderer(&self) -> bool {
        self.playback.surface().is_open()
    }

    pub fn renderer_handle(&self) -> Option<RendererHandle> {
        self.playback.surface().handle()
    }

    pub fn current_url(&self) -> Option<String> {
        self.playback.surface().current_url()
    }

    pub fn binding_state(&self) -> BindingState {
        self.binding.state()
    }

    /// Apply a later state message. A detached screen follows a new position.
    /// A registered one keeps its coordinates, since its marker is bound
    /// there; moving it means unregistering and rebuilding the screen.
    pub fn apply_update(&mut self, mut update: ScreenState) {
        let pos = self.binding.pos();
        if update.pos() != pos {
            if self.binding.state() == BindingState::Detached {
                self.binding = WorldBinding::new(update.pos());
            } else {
                warn!(
                    "Screen at {} received an update for {}, keeping its position",
                    pos,
                    update.pos()
                );
                update.x = pos.x;
                update.y = pos.y;
                update.z = pos.z;
            }
        }
        self.state = update;
    }

    /// Decode and apply a state message. On error nothing is changed.
    pub fn apply_bytes<B: Buf>(&mut self, buf: &mut B) -> std::result::Result<(), DecodeError> {
        let update = ScreenState::from_bytes(buf)?;
        self.apply_update(update);
        Ok(())
    }

    pub fn preview_screens(&self) -> &[PreviewScreen] {
        &self.previews
    }

    pub fn add_preview_screen(&mut self, preview: PreviewScreen) {
        self.previews.push(preview);
    }

    pub fn remove_preview_screen(&mut self, pos: BlockPos) -> bool {
        let before = self.previews.len();
        self.previews.retain(|preview| preview.pos != pos);
        self.previews.len() != before
    }

    /// Open a renderer for `video`, replacing whatever was playing. The screen
    /// stays hidden until [`start_video`](Self::start_video).
    pub fn load_video(&mut self, video: Video) {
        if self.binding.state() == BindingState::Unregistered {
            warn!("Ignoring video {} for unregistered screen at {}", video.info.id, self.pos());
            return;
        }
        self.state.visible = false;
        self.playback.load(video);
    }

    pub fn start_video(&mut self) {
        if self.playback.start(self.clock.now()) {
            self.state.visible = true;
        }
    }

    /// Muted screens are driven to zero regardless of `volume`.
    pub fn set_video_volume(&self, volume: f32) {
        let volume = if self.state.muted { 0.0 } else { volume };
        self.playback.set_volume(volume);
    }

    pub fn seek_video(&self, seconds: u64) {
        self.playback.seek_to(seconds);
    }

    pub fn probe_live_state(&self) {
        self.playback.probe_live_state();
    }

    pub fn reload(&mut self) {
        if self.playback.video().is_some() {
            self.state.visible = false;
            self.playback.reload();
        }
    }

    pub fn close_browser(&mut self) {
        self.playback.close();
    }

    /// Stop and forget the current video, as for an empty video command.
    pub fn clear_video(&mut self) {
        debug!("Clearing video on screen at {}", self.pos());
        self.state.visible = false;
        self.playback.clear();
    }

    pub fn register(&mut self, world: &mut dyn World) {
        self.binding.register(world);
    }

    /// Final: closes the renderer, removes the marker, detaches from chunk
    /// events.
    pub fn unregister(&mut self, world: &mut dyn World) {
        self.playback.clear();
        self.state.visible = false;
        self.binding.unregister(world);
    }
}

impl std::fmt::Debug for ScreenEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenEntity")
            .field("state", &self.state)
            .field("phase", &self.playback.phase())
            .field("binding", &self.binding.state())
            .field("previews", &self.previews.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::VideoInfo;
    use crate::network::PacketWriter;
    use crate::render::HeadlessRenderer;
    use crate::service::VideoServiceDescriptor;
    use crate::world::MemoryWorld;

    fn payload(facing: &str) -> BytesMut {
        PacketWriter::new()
            .write_i32(16)
            .write_i32(64)
            .write_i32(16)
            .write_string(facing)
            .write_f32(4.0)
            .write_f32(2.0)
            .write_bool(true)
            .write_bool(false)
            .finish()
    }

    #[test]
    fn decodes_every_field_in_order() {
        let state = ScreenState::decode(&payload("north")).unwrap();
        assert_eq!(
            state,
            ScreenState {
                x: 16,
                y: 64,
                z: 16,
                facing: Facing::North,
                width: 4.0,
                height: 2.0,
                visible: true,
                muted: false,
            }
        );
    }

    #[test]
    fn encode_is_unsupported() {
        let state = ScreenState::decode(&payload("east")).unwrap();
        let mut out = BytesMut::new();
        assert!(matches!(
            state.to_bytes(&mut out),
            Err(ScreenError::UnsupportedOperation(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_facing_and_truncation_are_decode_errors() {
        assert_eq!(
            ScreenState::decode(&payload("diagonal")),
            Err(DecodeError::UnknownFacing("diagonal".into()))
        );

        let full = payload("north");
        let short = &full[..full.len() - 1];
        assert_eq!(
            ScreenState::decode(short),
            Err(DecodeError::Truncated { needed: 1, remaining: 0 })
        );
    }

    #[test]
    fn trailing_bytes_are_left_for_the_next_message() {
        let mut buf = payload("south");
        buf.extend_from_slice(&[0xaa, 0xbb]);

        let mut bytes = &buf[..];
        let state = ScreenState::from_bytes(&mut bytes).unwrap();
        assert_eq!(state.facing, Facing::South);
        assert_eq!(bytes, &[0xaa, 0xbb]);
    }

    #[test]
    fn failed_update_leaves_the_entity_untouched() {
        let renderer = Arc::new(HeadlessRenderer::new());
        let mut screen = ScreenEntity::from_bytes(&mut payload("north"), renderer).unwrap();

        let mut bad = payload("nowhere");
        assert!(screen.apply_bytes(&mut bad).is_err());
        assert_eq!(screen.facing(), Facing::North);
        assert!(screen.is_visible());
    }

    fn moved(mut state: ScreenState, x: i32) -> ScreenState {
        state.x = x;
        state.visible = false;
        state
    }

    #[test]
    fn detached_screen_follows_a_moved_position() {
        let renderer = Arc::new(HeadlessRenderer::new());
        let mut screen = ScreenEntity::from_bytes(&mut payload("north"), renderer).unwrap();

        screen.apply_update(moved(screen.state().clone(), 100));
        assert_eq!(screen.x(), 100);
        assert_eq!(screen.pos(), BlockPos::new(100, 64, 16));
        assert_eq!(screen.chunk_pos(), ChunkPos::new(6, 1));
        assert!(!screen.is_visible());
    }

    #[test]
    fn registered_screen_keeps_its_position_on_update() {
        let renderer = Arc::new(HeadlessRenderer::new());
        let mut screen = ScreenEntity::from_bytes(&mut payload("north"), renderer).unwrap();
        let mut world = MemoryWorld::new();
        world.load_chunk(screen.chunk_pos());
        screen.register(&mut world);

        let mut update = PacketWriter::new()
            .write_i32(100)
            .write_i32(64)
            .write_i32(16)
            .write_string("east")
            .write_f32(4.0)
            .write_f32(2.0)
            .write_bool(false)
            .write_bool(true)
            .finish();
        screen.apply_bytes(&mut update).unwrap();

        assert_eq!(screen.x(), screen.pos().x);
        assert_eq!(screen.state().pos(), BlockPos::new(16, 64, 16));
        assert_eq!(screen.facing(), Facing::East);
        assert!(screen.is_muted());
        assert!(world.has_marker(BlockPos::new(16, 64, 16)));
        assert!(!world.has_marker(BlockPos::new(100, 64, 16)));
    }

    #[test]
    fn unregistered_screen_ignores_new_videos() {
        let renderer = Arc::new(HeadlessRenderer::new());
        let mut screen = ScreenEntity::from_bytes(&mut payload("north"), renderer.clone()).unwrap();
        let mut world = MemoryWorld::new();
        screen.register(&mut world);
        screen.unregister(&mut world);

        let service = Arc::new(
            VideoServiceDescriptor::new("embed", "https://player.example/%s", "v(%d)", "s()", "k(%d)", "l()")
                .unwrap(),
        );
        screen.load_video(Video::new(VideoInfo::new(service, "abc"), chrono::Utc::now()));

        assert!(!screen.has_renderer());
        assert_eq!(screen.phase(), PlaybackPhase::Empty);
        assert!(renderer.commands().is_empty());
    }

    #[test]
    fn previews_keep_insertion_order() {
        let renderer = Arc::new(HeadlessRenderer::new());
        let mut screen = ScreenEntity::from_bytes(&mut payload("north"), renderer).unwrap();

        let a = PreviewScreen::new(BlockPos::new(0, 0, 0), Facing::South, 1.6, 0.9);
        let b = PreviewScreen::new(BlockPos::new(1, 0, 0), Facing::South, 1.6, 0.9);
        screen.add_preview_screen(a.clone());
        screen.add_preview_screen(b.clone());
        assert_eq!(screen.preview_screens(), &[a.clone(), b.clone()]);

        assert!(screen.remove_preview_screen(a.pos));
        assert!(!screen.remove_preview_screen(a.pos));
        assert_eq!(screen.preview_screens(), &[b]);
    }

    #[test]
    fn double_close_without_renderer_is_silent() {
        let renderer = Arc::new(HeadlessRenderer::new());
        let mut screen = ScreenEntity::from_bytes(&mut payload("north"), renderer.clone()).unwrap();

        screen.close_browser();
        screen.close_browser();
        assert!(!screen.has_renderer());
        assert!(renderer.commands().is_empty());
    }
}
