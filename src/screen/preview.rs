use serde::{Deserialize, Serialize};

use crate::{BlockPos, Facing};

/// A secondary surface mirroring a screen's video, e.g. a thumbnail in a
/// menu or a smaller in-world monitor. It has no renderer of its own and no
/// lifecycle apart from the screen that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewScreen {
    pub pos: BlockPos,
    pub facing: Facing,
    pub width: f32,
    pub height: f32,
}

impl PreviewScreen {
    pub fn new(pos: BlockPos, facing: Facing, width: f32, height: f32) -> Self {
        Self {
            pos,
            facing,
            width,
            height,
        }
    }

    /// Width over height; zero for a degenerate surface.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            0.0
        }
    }
}
