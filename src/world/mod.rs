//! The slice of the host world a screen needs: chunk residency, a marker
//! block at the screen's position, and chunk load/unload notifications.

pub mod binding;
pub mod memory;

pub use binding::{BindingState, WorldBinding};
pub use memory::MemoryWorld;

use std::fmt;

use crate::{BlockPos, ChunkPos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkEvent {
    Loaded(ChunkPos),
    Unloaded(ChunkPos),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Called with the world itself, so the listener can place blocks.
pub type ChunkListener = Box<dyn FnMut(&mut dyn World, ChunkEvent) + Send>;

pub trait World {
    /// Whether any world is loaded at all (the client may be between worlds).
    fn is_loaded(&self) -> bool;

    fn is_chunk_loaded(&self, chunk: ChunkPos) -> bool;

    /// Place the screen marker block. Does nothing if the chunk is not loaded.
    fn set_marker(&mut self, pos: BlockPos);

    fn clear_marker(&mut self, pos: BlockPos);

    fn subscribe_chunk_events(&mut self, listener: ChunkListener) -> SubscriptionId;

    /// Listeners may still receive notifications already in flight.
    fn unsubscribe(&mut self, id: SubscriptionId);
}
