use std::collections::HashSet;

use tracing::{debug, trace};

use super::{ChunkEvent, ChunkListener, SubscriptionId, World};
use crate::{BlockPos, ChunkPos};

/// A world that lives entirely in memory, for tools and tests.
///
/// With [`with_deferred_unsubscribe`](Self::with_deferred_unsubscribe),
/// unsubscribed listeners keep receiving events until
/// [`flush_unsubscribes`](Self::flush_unsubscribes), the way an engine with
/// queued event delivery behaves.
pub struct MemoryWorld {
    loaded: bool,
    chunks: HashSet<ChunkPos>,
    markers: HashSet<BlockPos>,
    listeners: Vec<(SubscriptionId, ChunkListener)>,
    next_subscription: u64,
    deferred_unsubscribe: bool,
    pending_unsubscribes: Vec<SubscriptionId>,
    dispatching: bool,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self {
            loaded: true,
            chunks: HashSet::new(),
            markers: HashSet::new(),
            listeners: Vec::new(),
            next_subscription: 0,
            deferred_unsubscribe: false,
            pending_unsubscribes: Vec::new(),
            dispatching: false,
        }
    }

    /// A client that has not joined a world yet.
    pub fn unloaded() -> Self {
        Self {
            loaded: false,
            ..Self::new()
        }
    }

    pub fn with_deferred_unsubscribe(mut self) -> Self {
        self.deferred_unsubscribe = true;
        self
    }

    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
        if !loaded {
            self.chunks.clear();
            self.markers.clear();
        }
    }

    pub fn load_chunk(&mut self, chunk: ChunkPos) {
        self.chunks.insert(chunk);
        self.dispatch(ChunkEvent::Loaded(chunk));
    }

    pub fn unload_chunk(&mut self, chunk: ChunkPos) {
        if !self.chunks.remove(&chunk) {
            return;
        }
        self.markers.retain(|pos| pos.chunk() != chunk);
        self.dispatch(ChunkEvent::Unloaded(chunk));
    }

    pub fn has_marker(&self, pos: BlockPos) -> bool {
        self.markers.contains(&pos)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn flush_unsubscribes(&mut self) {
        if self.dispatching {
            return;
        }

        let removed = std::mem::take(&mut self.pending_unsubscribes);
        self.listeners.retain(|(id, _)| !removed.contains(id));
    }

    fn dispatch(&mut self, event: ChunkEvent) {
        trace!("Dispatching {:?} to {} listeners", event, self.listeners.len());

        let mut listeners = std::mem::take(&mut self.listeners);
        self.dispatching = true;
        for (_, listener) in listeners.iter_mut() {
            let world: &mut dyn World = &mut *self;
            listener(world, event);
        }
        self.dispatching = false;

        // Keep listeners that subscribed during dispatch.
        listeners.append(&mut self.listeners);
        self.listeners = listeners;

        if !self.deferred_unsubscribe {
            self.flush_unsubscribes();
        }
    }
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl World for MemoryWorld {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn is_chunk_loaded(&self, chunk: ChunkPos) -> bool {
        self.loaded && self.chunks.contains(&chunk)
    }

    fn set_marker(&mut self, pos: BlockPos) {
        if !self.is_chunk_loaded(pos.chunk()) {
            debug!("Chunk {} not loaded, not placing marker at {}", pos.chunk(), pos);
            return;
        }
        self.markers.insert(pos);
    }

    fn clear_marker(&mut self, pos: BlockPos) {
        self.markers.remove(&pos);
    }

    fn subscribe_chunk_events(&mut self, listener: ChunkListener) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.pending_unsubscribes.push(id);
        if !self.deferred_unsubscribe {
            self.flush_unsubscribes();
        }
    }
}
