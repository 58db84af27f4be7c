//! Scene / passthrough view toggle.
//!
//! Passthrough hides the virtual scene: its objects are neither drawn nor
//! paintable.  Strokes stay visible in both modes.

use std::fmt;

use tracing::info;

use crate::scene::SphereScene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Scene,
    Passthrough,
}

impl ViewMode {
    pub fn toggled(self) -> ViewMode {
        match self {
            ViewMode::Scene => ViewMode::Passthrough,
            ViewMode::Passthrough => ViewMode::Scene,
        }
    }

    pub fn shows_scene(self) -> bool {
        self == ViewMode::Scene
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Scene => f.write_str("scene"),
            ViewMode::Passthrough => f.write_str("passthrough"),
        }
    }
}

/// Owns the current mode and keeps the scene's visibility in step with it.
#[derive(Debug, Clone, Default)]
pub struct Passthrough {
    mode: ViewMode,
}

impl Passthrough {
    pub fn new(mode: ViewMode, scene: &mut SphereScene) -> Self {
        let mut p = Passthrough { mode };
        p.set_mode(mode, scene);
        p
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode, scene: &mut SphereScene) {
        self.mode = mode;
        scene.set_visible(mode.shows_scene());
        info!(%mode, "view mode");
    }

    pub fn toggle(&mut self, scene: &mut SphereScene) -> ViewMode {
        self.set_mode(self.mode.toggled(), scene);
        self.mode
    }
}
