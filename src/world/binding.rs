use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::{ChunkEvent, ChunkListener, SubscriptionId, World};
use crate::BlockPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Detached,
    PendingChunkLoad,
    Placed,
    /// Terminal.
    Unregistered,
}

impl fmt::Display for BindingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingState::Detached => "detached",
            BindingState::PendingChunkLoad => "pending-chunk-load",
            BindingState::Placed => "placed",
            BindingState::Unregistered => "unregistered",
        };
        f.write_str(name)
    }
}

/// Shared between the binding and its chunk listener.
#[derive(Debug)]
struct Shared {
    live: AtomicBool,
    state: Mutex<BindingState>,
}

impl Shared {
    fn state(&self) -> BindingState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: BindingState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != next {
            debug!("World binding {} -> {}", *state, next);
            *state = next;
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Keeps the marker block at a screen's position in step with chunk residency.
///
/// The chunk listener checks a liveness flag on every notification, so a
/// notification delivered after [`unregister`](Self::unregister) is ignored
/// even if the world has not yet dropped the listener.
#[derive(Debug)]
pub struct WorldBinding {
    pos: BlockPos,
    shared: Arc<Shared>,
    subscription: Option<SubscriptionId>,
}

impl WorldBinding {
    pub fn new(pos: BlockPos) -> Self {
        Self {
            pos,
            shared: Arc::new(Shared {
                live: AtomicBool::new(true),
                state: Mutex::new(BindingState::Detached),
            }),
            subscription: None,
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn state(&self) -> BindingState {
        self.shared.state()
    }

    pub fn register(&mut self, world: &mut dyn World) {
        match self.state() {
            BindingState::Detached => {}
            BindingState::Unregistered => {
                warn!("Screen at {} was unregistered and cannot be registered again", self.pos);
                return;
            }
            state => {
                debug!("Screen at {} already registered ({})", self.pos, state);
                return;
            }
        }

        self.shared.set_state(BindingState::PendingChunkLoad);
        let listener = chunk_listener(self.pos, Arc::clone(&self.shared));
        self.subscription = Some(world.subscribe_chunk_events(listener));
        try_place(world, self.pos, &self.shared);

        info!("Registered screen at {} ({})", self.pos, self.state());
    }

    /// Final: remove the marker and stop reacting to chunk events.
    pub fn unregister(&mut self, world: &mut dyn World) {
        let state = self.state();
        if state == BindingState::Unregistered {
            return;
        }

        self.shared.live.store(false, Ordering::Release);
        if state == BindingState::Placed {
            world.clear_marker(self.pos);
        }
        if let Some(id) = self.subscription.take() {
            world.unsubscribe(id);
        }
        self.shared.set_state(BindingState::Unregistered);

        info!("Unregistered screen at {}", self.pos);
    }
}

impl Drop for WorldBinding {
    fn drop(&mut self) {
        self.shared.live.store(false, Ordering::Release);
    }
}

fn chunk_listener(pos: BlockPos, shared: Arc<Shared>) -> ChunkListener {
    let chunk = pos.chunk();

    Box::new(move |world: &mut dyn World, event: ChunkEvent| {
        if !shared.is_live() {
            return;
        }

        match event {
            ChunkEvent::Loaded(loaded) if loaded == chunk => try_place(world, pos, &shared),
            ChunkEvent::Unloaded(unloaded) if unloaded == chunk => {
                // The marker left with the chunk.
                if shared.state() == BindingState::Placed {
                    shared.set_state(BindingState::PendingChunkLoad);
                }
            }
            _ => {}
        }
    })
}

fn try_place(world: &mut dyn World, pos: BlockPos, shared: &Shared) {
    if !world.is_loaded() || !world.is_chunk_loaded(pos.chunk()) {
        return;
    }

    world.set_marker(pos);
    shared.set_state(BindingState::Placed);
}
