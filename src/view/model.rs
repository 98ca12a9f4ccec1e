//! Pure derivation of everything the dashboard shows from the home record.
//! Nothing here touches a surface; see [`super::surface`] for that.

use serde::Serialize;

use crate::home::{ColorSim, Device, HomeState, Scene, SceneMachine, ScenePhase};

/// Root font size at 100%.
pub const BASE_FONT_PX: f64 = 16.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIndicator {
    pub device: Device,
    pub button_id: &'static str,
    pub active: bool,
    pub status_text: &'static str,
}

impl DeviceIndicator {
    pub fn status_id(&self) -> String {
        format!("{}-status", self.button_id)
    }

    pub fn badge_class(&self) -> &'static str {
        if self.active {
            "status-badge status-active"
        } else {
            "status-badge status-inactive"
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityControls {
    pub high_contrast: bool,
    pub dyslexia_mode: bool,
    pub reduce_motion: bool,
    pub font_size: u32,
    pub color_sim: ColorSim,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub devices: Vec<DeviceIndicator>,
    pub active_device_count: usize,
    pub status_message: String,
    pub accessibility: AccessibilityControls,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPresentation {
    pub body_classes: Vec<&'static str>,
    pub scale: f64,
    pub root_font_px: f64,
}

impl GlobalPresentation {
    pub fn root_font_size(&self) -> String {
        format!("{}px", self.root_font_px)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneIndicator {
    pub scene: Scene,
    pub phase: ScenePhase,
}

impl SceneIndicator {
    pub fn status_text(&self) -> &'static str {
        match self.phase {
            ScenePhase::Ready => "READY",
            ScenePhase::Pending => "LOADING...",
            ScenePhase::Active => "ACTIVE • RUNNING",
        }
    }
}

pub fn render_ui(state: &HomeState) -> DashboardView {
    let devices = Device::ALL
        .into_iter()
        .map(|device| {
            let active = state.device(device);
            DeviceIndicator {
                device,
                button_id: device.button_id(),
                active,
                status_text: device.badge_status(active),
            }
        })
        .collect();

    let active_device_count = state.active_device_count();

    DashboardView {
        devices,
        active_device_count,
        status_message: format!(
            "System is running normally. {active_device_count} Devices Active."
        ),
        accessibility: AccessibilityControls {
            high_contrast: state.high_contrast,
            dyslexia_mode: state.dyslexia_mode,
            reduce_motion: state.reduce_motion,
            font_size: state.font_size,
            color_sim: state.color_sim,
        },
    }
}

pub fn apply_global_settings(state: &HomeState) -> GlobalPresentation {
    let mut body_classes = Vec::new();
    if state.high_contrast {
        body_classes.push("high-contrast");
    }
    if state.dyslexia_mode {
        body_classes.push("dyslexia-font");
    }
    if state.reduce_motion {
        body_classes.push("reduce-motion");
    }
    if let Some(class) = color_filter_class(state.color_sim) {
        body_classes.push(class);
    }

    let scale = f64::from(state.font_size) / 100.0;
    GlobalPresentation {
        body_classes,
        scale,
        root_font_px: scale * BASE_FONT_PX,
    }
}

pub fn color_filter_class(mode: ColorSim) -> Option<&'static str> {
    match mode {
        ColorSim::Normal => None,
        ColorSim::Achromatopsia => Some("sim-achromatopsia"),
        ColorSim::Protanopia => Some("sim-protanopia"),
        ColorSim::Deuteranopia => Some("sim-deuteranopia"),
    }
}

pub fn render_scenes(machine: &SceneMachine, active: Option<Scene>) -> Vec<SceneIndicator> {
    Scene::ALL
        .into_iter()
        .map(|scene| SceneIndicator {
            scene,
            phase: machine.phase(scene, active),
        })
        .collect()
}
