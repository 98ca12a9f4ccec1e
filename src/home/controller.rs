use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time,
};
use tokio_util::sync::CancellationToken;

use crate::{
    db::Database,
    notify::Notifier,
    settings::DashboardSettings,
    view::{apply_global_settings, render_scenes, render_ui, DashboardView, Surface},
};

use super::{
    ColorSim, Device, HomeEvent, HomeState, Scene, SceneMachine, ScenePhase, SceneTransition,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

struct PendingScene {
    scene: Scene,
    id: u64,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

struct HomeInner {
    state: HomeState,
    scenes: SceneMachine,
    surface: Surface,
    pending: Option<PendingScene>,
}

impl HomeInner {
    fn sync_surface(&mut self) {
        self.surface
            .apply_presentation(&apply_global_settings(&self.state));
        self.surface.apply_view(&render_ui(&self.state));
        self.surface
            .apply_scenes(&render_scenes(&self.scenes, self.state.active_scene));
    }
}

/// Owns the home record. Every mutation goes through [`HomeController::update`],
/// which persists the new record before it becomes the in-memory one and then
/// re-syncs the surface.
#[derive(Clone)]
pub struct HomeController {
    inner: Arc<Mutex<HomeInner>>,
    db: Database,
    storage_key: Arc<str>,
    scene_delay: Duration,
    notifier: Notifier,
    events: broadcast::Sender<HomeEvent>,
    next_pending_id: Arc<AtomicU64>,
}

impl HomeController {
    /// Reads the stored record (or the default one) and renders it onto
    /// `surface`. Unreadable stored data is never an error here.
    pub async fn load(db: Database, settings: &DashboardSettings, surface: Surface) -> Result<Self> {
        let raw = match db.get_item(&settings.storage_key).await {
            Ok(raw) => raw,
            Err(err) => {
                log_warn!("failed to read stored home state: {err:#}");
                None
            }
        };

        let state = match raw.as_deref().map(HomeState::parse_stored) {
            None => {
                log_info!("no stored home state; starting from defaults");
                HomeState::default()
            }
            Some(Ok(state)) => state,
            Some(Err(err)) => {
                log_warn!("stored home state is unreadable, using defaults: {err:#}");
                HomeState::default()
            }
        };

        let mut inner = HomeInner {
            state,
            scenes: SceneMachine::new(),
            surface,
            pending: None,
        };
        inner.sync_surface();

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let notifier = Notifier::new(settings.notification_duration(), events.clone());

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            db,
            storage_key: Arc::from(settings.storage_key.as_str()),
            scene_delay: settings.scene_delay(),
            notifier,
            events,
            next_pending_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HomeEvent> {
        self.events.subscribe()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn snapshot(&self) -> HomeState {
        self.inner.lock().await.state.clone()
    }

    pub async fn view(&self) -> DashboardView {
        render_ui(&self.inner.lock().await.state)
    }

    pub async fn surface(&self) -> Surface {
        self.inner.lock().await.surface.clone()
    }

    pub async fn scene_phase(&self, scene: Scene) -> ScenePhase {
        let guard = self.inner.lock().await;
        guard.scenes.phase(scene, guard.state.active_scene)
    }

    /// The record as it currently sits in storage.
    pub async fn persisted(&self) -> Result<Option<HomeState>> {
        self.db
            .get_item(&self.storage_key)
            .await?
            .map(|raw| HomeState::parse_stored(&raw))
            .transpose()
    }

    pub async fn toggle_device(&self, device: Device) -> Result<bool> {
        let on = {
            let mut guard = self.inner.lock().await;
            self.update(&mut guard, |state| state.toggle_device(device))
                .await?
        };

        self.notifier
            .show(format!(
                "{}: {}",
                device.label(),
                device.notification_status(on)
            ))
            .await;
        Ok(on)
    }

    pub async fn toggle_high_contrast(&self) -> Result<bool> {
        let mut guard = self.inner.lock().await;
        self.update(&mut guard, |state| {
            state.high_contrast = !state.high_contrast;
            state.high_contrast
        })
        .await
    }

    pub async fn toggle_dyslexia_mode(&self) -> Result<bool> {
        let mut guard = self.inner.lock().await;
        self.update(&mut guard, |state| {
            state.dyslexia_mode = !state.dyslexia_mode;
            state.dyslexia_mode
        })
        .await
    }

    pub async fn toggle_reduce_motion(&self) -> Result<bool> {
        let mut guard = self.inner.lock().await;
        self.update(&mut guard, |state| {
            state.reduce_motion = !state.reduce_motion;
            state.reduce_motion
        })
        .await
    }

    pub async fn simulate_color_blindness(&self, mode: ColorSim) -> Result<()> {
        let mut guard = self.inner.lock().await;
        self.update(&mut guard, |state| state.color_sim = mode).await
    }

    pub async fn update_font_size(&self, percent: u32) -> Result<()> {
        let mut guard = self.inner.lock().await;
        self.update(&mut guard, |state| state.font_size = percent)
            .await
    }

    /// Activates, deactivates or cancels `scene` and returns its new phase.
    /// Activation is delayed by the configured scene delay; the record is only
    /// written once the scene's effects have been applied.
    pub async fn toggle_scene(&self, scene: Scene) -> Result<ScenePhase> {
        let mut guard = self.inner.lock().await;
        let active = guard.state.active_scene;
        let transition = guard.scenes.request(scene, active)?;

        match transition {
            SceneTransition::Deactivate => {
                self.update(&mut guard, |state| state.active_scene = None)
                    .await?;
                drop(guard);

                self.emit_phase(scene, ScenePhase::Ready);
                self.notifier
                    .show(format!("Scene {} Deactivated", scene.label()))
                    .await;
                Ok(ScenePhase::Ready)
            }
            SceneTransition::Cancel => {
                if let Some(pending) = guard.pending.take() {
                    pending.cancel.cancel();
                }
                guard.sync_surface();
                let restored = guard.state.active_scene;
                drop(guard);

                log_info!("scene {} activation cancelled", scene);
                self.emit_phase(scene, ScenePhase::Ready);
                if let Some(previous) = restored {
                    self.emit_phase(previous, ScenePhase::Active);
                }
                self.notifier
                    .show(format!("Scene {} Cancelled", scene.label()))
                    .await;
                Ok(ScenePhase::Ready)
            }
            SceneTransition::Activate { replaces } => {
                // The record keeps the previous scene until the delay runs out;
                // only its card drops back to Ready now.
                if let Some(previous) = replaces {
                    self.emit_phase(previous, ScenePhase::Ready);
                }

                let id = self.next_pending_id.fetch_add(1, Ordering::Relaxed);
                let cancel = CancellationToken::new();
                let handle = self.spawn_activation(scene, id, cancel.clone());
                guard.pending = Some(PendingScene {
                    scene,
                    id,
                    cancel,
                    handle: Some(handle),
                });
                guard.sync_surface();
                drop(guard);

                log_info!("scene {} loading for {:?}", scene, self.scene_delay);
                self.emit_phase(scene, ScenePhase::Pending);
                Ok(ScenePhase::Pending)
            }
        }
    }

    /// Drops the stored record and goes back to the default one. A loading
    /// scene is cancelled first so it cannot land on the fresh record.
    pub async fn reset(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let cancelled = guard.pending.take().map(|pending| {
            pending.cancel.cancel();
            pending.scene
        });
        if let Some(scene) = cancelled {
            guard.scenes.complete(scene);
        }

        if let Err(err) = self.db.remove_item(&self.storage_key).await {
            guard.sync_surface();
            return Err(err.context("failed to remove stored home state"));
        }

        guard.state = HomeState::default();
        guard.sync_surface();
        let _ = self.events.send(HomeEvent::StateChanged {
            state: guard.state.clone(),
        });
        drop(guard);

        log_info!("home state reset to defaults");
        if let Some(scene) = cancelled {
            self.emit_phase(scene, ScenePhase::Ready);
        }
        self.notifier.show("Dashboard Reset".to_string()).await;
        Ok(())
    }

    /// Waits for a loading scene, if any, to finish or be cancelled.
    pub async fn settle(&self) -> Result<()> {
        let handle = {
            let mut guard = self.inner.lock().await;
            guard
                .pending
                .as_mut()
                .and_then(|pending| pending.handle.take())
        };

        if let Some(handle) = handle {
            handle.await.context("scene activation task failed")?;
        }
        Ok(())
    }

    fn spawn_activation(&self, scene: Scene, id: u64, cancel: CancellationToken) -> JoinHandle<()> {
        let controller = self.clone();
        let delay = self.scene_delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = time::sleep(delay) => {
                    if let Err(err) = controller.finish_activation(scene, id).await {
                        log_error!("scene {} activation failed: {err:#}", scene);
                    }
                }
            }
        })
    }

    async fn finish_activation(&self, scene: Scene, id: u64) -> Result<()> {
        let mut guard = self.inner.lock().await;
        match &guard.pending {
            Some(pending) if pending.id == id && pending.scene == scene => {}
            _ => return Ok(()),
        }
        guard.pending = None;
        guard.scenes.complete(scene);

        let applied = self
            .update(&mut guard, |state| {
                state.active_scene = Some(scene);
                state.apply_scene(scene);
            })
            .await;
        if let Err(err) = applied {
            guard.sync_surface();
            drop(guard);
            self.emit_phase(scene, ScenePhase::Ready);
            return Err(err);
        }
        drop(guard);

        log_info!("scene {} active", scene);
        self.emit_phase(scene, ScenePhase::Active);
        self.notifier
            .show(format!("Scene {} Activated", scene.label()))
            .await;
        Ok(())
    }

    /// The single mutation path: apply `mutate` to a copy of the record,
    /// persist the copy, adopt it, then re-sync the surface.
    async fn update<R>(
        &self,
        inner: &mut HomeInner,
        mutate: impl FnOnce(&mut HomeState) -> R,
    ) -> Result<R> {
        let mut next = inner.state.clone();
        let result = mutate(&mut next);

        let serialized =
            serde_json::to_string(&next).context("failed to serialize home state")?;
        self.db
            .set_item(&self.storage_key, serialized)
            .await
            .context("failed to persist home state")?;

        inner.state = next;
        inner.sync_surface();

        let _ = self.events.send(HomeEvent::StateChanged {
            state: inner.state.clone(),
        });
        Ok(result)
    }

    fn emit_phase(&self, scene: Scene, phase: ScenePhase) {
        let _ = self.events.send(HomeEvent::ScenePhaseChanged { scene, phase });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings(scene_delay_ms: u64) -> DashboardSettings {
        DashboardSettings {
            scene_delay_ms,
            notification_ms: 3000,
            ..DashboardSettings::default()
        }
    }

    async fn controller_with(db: Database, scene_delay_ms: u64) -> HomeController {
        HomeController::load(db, &test_settings(scene_delay_ms), Surface::dashboard())
            .await
            .unwrap()
    }

    async fn controller(scene_delay_ms: u64) -> HomeController {
        controller_with(Database::in_memory().unwrap(), scene_delay_ms).await
    }

    #[tokio::test]
    async fn toggling_living_light_notifies_and_persists() {
        let home = controller(10).await;
        assert!(!home.snapshot().await.living_light);

        assert!(home.toggle_device(Device::LivingLight).await.unwrap());

        let message = home.notifier().current().await.unwrap().message;
        assert!(message.contains("Living Light: ON"));
        assert_eq!(home.persisted().await.unwrap(), Some(home.snapshot().await));
    }

    #[tokio::test]
    async fn toggling_twice_restores_and_stays_in_sync() {
        let home = controller(10).await;
        for device in Device::ALL {
            let before = home.snapshot().await.device(device);
            home.toggle_device(device).await.unwrap();
            home.toggle_device(device).await.unwrap();
            assert_eq!(home.snapshot().await.device(device), before);
            assert_eq!(home.persisted().await.unwrap(), Some(home.snapshot().await));
        }
    }

    #[tokio::test]
    async fn door_and_alarm_use_their_own_wording() {
        let home = controller(10).await;
        home.toggle_device(Device::FrontDoor).await.unwrap();
        assert_eq!(
            home.notifier().current().await.unwrap().message,
            "Front Door: UNLOCKED"
        );
        home.toggle_device(Device::AlarmSystem).await.unwrap();
        assert_eq!(
            home.notifier().current().await.unwrap().message,
            "Alarm System: DISARMED"
        );
    }

    #[tokio::test]
    async fn night_scene_applies_effects_after_delay() {
        let home = controller(20).await;
        home.toggle_device(Device::LivingLight).await.unwrap();
        home.toggle_device(Device::FrontDoor).await.unwrap();

        assert_eq!(
            home.toggle_scene(Scene::Night).await.unwrap(),
            ScenePhase::Pending
        );
        assert_eq!(home.scene_phase(Scene::Night).await, ScenePhase::Pending);
        assert_eq!(home.snapshot().await.active_scene, None);
        let card = home.surface().await.get("scene-night").cloned().unwrap();
        assert_eq!(card.text.as_deref(), Some("LOADING..."));

        home.settle().await.unwrap();

        let state = home.snapshot().await;
        assert_eq!(state.active_scene, Some(Scene::Night));
        assert!(!state.living_light);
        assert!(!state.living_tv);
        assert!(state.front_door);
        assert!(state.alarm_system);
        assert_eq!(home.persisted().await.unwrap(), Some(state));
        assert_eq!(home.scene_phase(Scene::Night).await, ScenePhase::Active);
        assert_eq!(
            home.notifier().current().await.unwrap().message,
            "Scene Night Activated"
        );
    }

    #[tokio::test]
    async fn reinvoking_active_scene_deactivates_immediately() {
        let home = controller(20).await;
        home.toggle_scene(Scene::Reading).await.unwrap();
        home.settle().await.unwrap();

        // change a device the scene forces, to prove effects are not re-applied
        home.toggle_device(Device::LivingLight).await.unwrap();

        assert_eq!(
            home.toggle_scene(Scene::Reading).await.unwrap(),
            ScenePhase::Ready
        );
        let state = home.snapshot().await;
        assert_eq!(state.active_scene, None);
        assert!(!state.living_light);
        assert_eq!(home.persisted().await.unwrap(), Some(state));
        assert_eq!(
            home.notifier().current().await.unwrap().message,
            "Scene Reading Deactivated"
        );
    }

    #[tokio::test]
    async fn activating_another_scene_replaces_the_active_one() {
        let home = controller(20).await;
        home.toggle_scene(Scene::Night).await.unwrap();
        home.settle().await.unwrap();
        // undo what night forced so away's effects are visible
        home.toggle_device(Device::AlarmSystem).await.unwrap();
        home.toggle_device(Device::LivingLight).await.unwrap();
        home.toggle_device(Device::BedroomFan).await.unwrap();

        home.toggle_scene(Scene::Away).await.unwrap();
        assert_eq!(home.scene_phase(Scene::Night).await, ScenePhase::Ready);
        assert_eq!(home.scene_phase(Scene::Away).await, ScenePhase::Pending);
        assert_eq!(home.snapshot().await.active_scene, Some(Scene::Night));

        home.settle().await.unwrap();
        let state = home.snapshot().await;
        assert_eq!(state.active_scene, Some(Scene::Away));
        assert!(!state.living_light);
        assert!(state.alarm_system);
        assert!(!state.bedroom_fan);
        assert_eq!(home.persisted().await.unwrap(), Some(state));
        assert_eq!(home.scene_phase(Scene::Night).await, ScenePhase::Ready);
        assert_eq!(home.scene_phase(Scene::Away).await, ScenePhase::Active);
    }

    #[tokio::test]
    async fn stored_scene_is_kept_while_the_next_one_loads() {
        let db = Database::in_memory().unwrap();
        let mut stored = HomeState::default();
        stored.active_scene = Some(Scene::Night);
        db.set_item("sh_state", serde_json::to_string(&stored).unwrap())
            .await
            .unwrap();
        let home = controller_with(db, 5_000).await;

        home.toggle_scene(Scene::Away).await.unwrap();
        assert_eq!(
            home.persisted().await.unwrap().unwrap().active_scene,
            Some(Scene::Night)
        );
        assert_eq!(home.snapshot().await.active_scene, Some(Scene::Night));
        let card = home.surface().await.get("scene-night").cloned().unwrap();
        assert!(!card.has_class("active-scene"));
        assert_eq!(card.text.as_deref(), Some("READY"));
    }

    #[tokio::test]
    async fn cancelling_a_replacement_keeps_the_previous_scene() {
        let db = Database::in_memory().unwrap();
        let mut stored = HomeState::default();
        stored.active_scene = Some(Scene::Night);
        db.set_item("sh_state", serde_json::to_string(&stored).unwrap())
            .await
            .unwrap();
        let home = controller_with(db, 5_000).await;

        home.toggle_scene(Scene::Away).await.unwrap();
        assert_eq!(
            home.toggle_scene(Scene::Away).await.unwrap(),
            ScenePhase::Ready
        );
        home.settle().await.unwrap();

        assert_eq!(home.snapshot().await.active_scene, Some(Scene::Night));
        assert_eq!(home.persisted().await.unwrap(), Some(stored));
        assert_eq!(home.scene_phase(Scene::Night).await, ScenePhase::Active);
        assert_eq!(home.scene_phase(Scene::Away).await, ScenePhase::Ready);
        let card = home.surface().await.get("scene-night").cloned().unwrap();
        assert!(card.has_class("active-scene"));
    }

    #[tokio::test]
    async fn reading_scene_forces_light_tv_and_blinds() {
        let home = controller(10).await;
        home.toggle_device(Device::LivingTv).await.unwrap();
        home.toggle_device(Device::LivingBlinds).await.unwrap();
        assert!(!home.snapshot().await.living_blinds);

        home.toggle_scene(Scene::Reading).await.unwrap();
        home.settle().await.unwrap();

        let state = home.snapshot().await;
        assert_eq!(state.active_scene, Some(Scene::Reading));
        assert!(state.living_light);
        assert!(!state.living_tv);
        assert!(state.living_blinds);
        assert_eq!(home.persisted().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn reset_restores_defaults_and_drops_storage() {
        let home = controller(5_000).await;
        home.toggle_device(Device::KitchenCoffee).await.unwrap();
        home.update_font_size(140).await.unwrap();
        home.toggle_scene(Scene::Night).await.unwrap();

        home.reset().await.unwrap();
        home.settle().await.unwrap();

        assert_eq!(home.snapshot().await, HomeState::default());
        assert_eq!(home.persisted().await.unwrap(), None);
        assert_eq!(home.scene_phase(Scene::Night).await, ScenePhase::Ready);
        let surface = home.surface().await;
        assert_eq!(surface.get("root").unwrap().attribute("font-size"), Some("16px"));
        assert_eq!(
            home.notifier().current().await.unwrap().message,
            "Dashboard Reset"
        );

        // a fresh activation works after the reset
        assert_eq!(
            home.toggle_scene(Scene::Away).await.unwrap(),
            ScenePhase::Pending
        );
    }

    #[tokio::test]
    async fn second_activation_while_loading_is_rejected() {
        let home = controller(5_000).await;
        home.toggle_scene(Scene::Night).await.unwrap();

        assert!(home.toggle_scene(Scene::Away).await.is_err());
        assert_eq!(home.scene_phase(Scene::Away).await, ScenePhase::Ready);
        assert_eq!(home.scene_phase(Scene::Night).await, ScenePhase::Pending);
    }

    #[tokio::test]
    async fn toggling_a_loading_scene_cancels_it() {
        let home = controller(5_000).await;
        home.toggle_scene(Scene::Night).await.unwrap();

        assert_eq!(
            home.toggle_scene(Scene::Night).await.unwrap(),
            ScenePhase::Ready
        );
        home.settle().await.unwrap();
        assert_eq!(home.snapshot().await.active_scene, None);
        assert_eq!(home.scene_phase(Scene::Night).await, ScenePhase::Ready);
    }

    #[tokio::test]
    async fn device_toggle_during_loading_is_kept_in_sync() {
        let home = controller(30).await;
        home.toggle_scene(Scene::Away).await.unwrap();
        home.toggle_device(Device::KitchenCoffee).await.unwrap();
        home.settle().await.unwrap();

        let state = home.snapshot().await;
        assert!(state.kitchen_coffee);
        assert_eq!(state.active_scene, Some(Scene::Away));
        assert_eq!(home.persisted().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn accessibility_setters_update_presentation() {
        let home = controller(10).await;
        assert!(home.toggle_high_contrast().await.unwrap());
        assert!(home.toggle_dyslexia_mode().await.unwrap());
        assert!(home.toggle_reduce_motion().await.unwrap());
        home.simulate_color_blindness(ColorSim::Achromatopsia)
            .await
            .unwrap();
        home.update_font_size(150).await.unwrap();

        let surface = home.surface().await;
        let body = surface.get("body").unwrap();
        for class in ["high-contrast", "dyslexia-font", "reduce-motion", "sim-achromatopsia"] {
            assert!(body.has_class(class), "missing {class}");
        }
        assert_eq!(surface.get("root").unwrap().attribute("font-size"), Some("24px"));
        assert_eq!(
            surface.get("font-slider").unwrap().attribute("value"),
            Some("150")
        );
        assert_eq!(
            apply_global_settings(&home.snapshot().await).scale,
            1.5
        );
        assert_eq!(home.persisted().await.unwrap(), Some(home.snapshot().await));
    }

    #[tokio::test]
    async fn malformed_stored_state_loads_defaults() {
        let db = Database::in_memory().unwrap();
        db.set_item("sh_state", "<<not json>>".into()).await.unwrap();

        let home = controller_with(db, 10).await;
        assert_eq!(home.snapshot().await, HomeState::default());
    }

    #[tokio::test]
    async fn stored_active_scene_is_restored_on_load() {
        let db = Database::in_memory().unwrap();
        let mut stored = HomeState::default();
        stored.active_scene = Some(Scene::Reading);
        stored.living_tv = true;
        db.set_item("sh_state", serde_json::to_string(&stored).unwrap())
            .await
            .unwrap();

        let home = controller_with(db, 10).await;
        assert_eq!(home.snapshot().await, stored);
        let surface = home.surface().await;
        let card = surface.get("scene-reading").unwrap();
        assert!(card.has_class("active-scene"));
        assert_eq!(card.text.as_deref(), Some("ACTIVE • RUNNING"));
        assert_eq!(home.view().await.active_device_count, 3);
    }

    #[tokio::test]
    async fn events_are_broadcast_for_mutations() {
        let home = controller(10).await;
        let mut rx = home.subscribe();
        home.toggle_device(Device::BedroomFan).await.unwrap();

        match rx.recv().await.unwrap() {
            HomeEvent::StateChanged { state } => assert!(state.bedroom_fan),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            HomeEvent::NotificationShown { .. }
        ));
    }
}
