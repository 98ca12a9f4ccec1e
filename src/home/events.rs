use serde::Serialize;

use super::{HomeState, Scene, ScenePhase};
use crate::notify::Notification;

/// Broadcast to every front-end subscribed to the controller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HomeEvent {
    StateChanged { state: HomeState },
    ScenePhaseChanged { scene: Scene, phase: ScenePhase },
    NotificationShown { notification: Notification },
    NotificationCleared,
}
