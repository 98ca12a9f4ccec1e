use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::state::Scene;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ScenePhase {
    #[default]
    Ready,
    Pending,
    Active,
}

/// What the controller must do in response to a scene request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneTransition {
    /// Start the delayed activation; `replaces` is the scene that was active.
    Activate { replaces: Option<Scene> },
    /// The scene was active; switch it off immediately.
    Deactivate,
    /// The scene was still loading; drop the pending activation.
    Cancel,
}

/// Tracks which scene, if any, is waiting for its activation delay to run
/// out. The active scene itself lives in the persisted record.
#[derive(Debug, Clone, Default)]
pub struct SceneMachine {
    pending: Option<Scene>,
}

impl SceneMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<Scene> {
        self.pending
    }

    /// Phase shown on the scene's card. While another scene is loading, the
    /// recorded active scene already shows as Ready; the record itself keeps
    /// it until the loading scene takes over.
    pub fn phase(&self, scene: Scene, active: Option<Scene>) -> ScenePhase {
        match self.pending {
            Some(pending) if pending == scene => ScenePhase::Pending,
            Some(_) => ScenePhase::Ready,
            None if active == Some(scene) => ScenePhase::Active,
            None => ScenePhase::Ready,
        }
    }

    /// Decides the transition for a toggle of `scene`. A second activation
    /// while another scene is loading is rejected.
    pub fn request(&mut self, scene: Scene, active: Option<Scene>) -> Result<SceneTransition> {
        match self.pending {
            Some(pending) if pending == scene => {
                self.pending = None;
                Ok(SceneTransition::Cancel)
            }
            Some(pending) => bail!(
                "scene '{}' is still loading; cannot start '{}'",
                pending,
                scene
            ),
            None if active == Some(scene) => Ok(SceneTransition::Deactivate),
            None => {
                self.pending = Some(scene);
                Ok(SceneTransition::Activate { replaces: active })
            }
        }
    }

    /// Called when the activation delay expires. Returns false if the
    /// activation was cancelled in the meantime.
    pub fn complete(&mut self, scene: Scene) -> bool {
        if self.pending == Some(scene) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}
