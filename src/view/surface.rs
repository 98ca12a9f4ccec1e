use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::home::{Device, Scene, ScenePhase};

use super::model::{DashboardView, GlobalPresentation, SceneIndicator};

pub const BODY_ID: &str = "body";
pub const ROOT_ID: &str = "root";
pub const STATUS_MESSAGE_ID: &str = "system-status-msg";
pub const HIGH_CONTRAST_ID: &str = "hc-toggle-btn";
pub const DYSLEXIA_ID: &str = "dyslexia-btn";
pub const MOTION_ID: &str = "motion-btn";
pub const FONT_SLIDER_ID: &str = "font-slider";
pub const COLOR_FILTER_ID: &str = "color-filter-select";

const PRESENTATION_CLASSES: [&str; 6] = [
    "high-contrast",
    "dyslexia-font",
    "reduce-motion",
    "sim-achromatopsia",
    "sim-protanopia",
    "sim-deuteranopia",
];

/// Presentation state of one mounted element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
}

impl Element {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn set_class(&mut self, class: &str, on: bool) {
        if on {
            self.classes.insert(class.to_string());
        } else {
            self.classes.remove(class);
        }
    }

    fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    fn replace_classes(&mut self, class_name: &str) {
        self.classes = class_name.split_whitespace().map(str::to_string).collect();
    }
}

/// The set of elements the synchronizer may write to. Elements are mounted
/// up front; applying a view never creates one, and ids that are not mounted
/// are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surface {
    elements: BTreeMap<String, Element>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every element the dashboard page defines.
    pub fn dashboard() -> Self {
        let mut surface = Self::new();
        for id in [
            BODY_ID,
            ROOT_ID,
            STATUS_MESSAGE_ID,
            HIGH_CONTRAST_ID,
            DYSLEXIA_ID,
            MOTION_ID,
            FONT_SLIDER_ID,
            COLOR_FILTER_ID,
        ] {
            surface.mount(id);
        }
        for device in Device::ALL {
            surface.mount(device.button_id());
            surface.mount(format!("{}-status", device.button_id()));
        }
        for scene in Scene::ALL {
            surface.mount(scene.card_id());
            surface.mount(scene.icon_id());
        }
        surface
    }

    pub fn mount(&mut self, id: impl Into<String>) {
        self.elements.entry(id.into()).or_default();
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    fn with(&mut self, id: &str, update: impl FnOnce(&mut Element)) {
        match self.elements.get_mut(id) {
            Some(element) => update(element),
            None => debug!("render target '{id}' not mounted; skipped"),
        }
    }

    pub fn apply_view(&mut self, view: &DashboardView) {
        for indicator in &view.devices {
            self.with(indicator.button_id, |el| {
                el.set_class("active", indicator.active);
                el.set_attribute("aria-pressed", indicator.active.to_string());
            });
            self.with(&indicator.status_id(), |el| {
                el.text = Some(indicator.status_text.to_string());
                el.replace_classes(indicator.badge_class());
            });
        }

        self.with(STATUS_MESSAGE_ID, |el| {
            el.text = Some(view.status_message.clone());
        });

        let controls = &view.accessibility;
        self.with(HIGH_CONTRAST_ID, |el| el.set_class("active", controls.high_contrast));
        self.with(DYSLEXIA_ID, |el| el.set_class("active", controls.dyslexia_mode));
        self.with(MOTION_ID, |el| el.set_class("active", controls.reduce_motion));
        self.with(FONT_SLIDER_ID, |el| {
            el.set_attribute("value", controls.font_size.to_string());
        });
        self.with(COLOR_FILTER_ID, |el| {
            el.set_attribute("value", controls.color_sim.key());
        });
    }

    pub fn apply_presentation(&mut self, presentation: &GlobalPresentation) {
        self.with(BODY_ID, |el| {
            for class in PRESENTATION_CLASSES {
                el.set_class(class, presentation.body_classes.contains(&class));
            }
        });
        self.with(ROOT_ID, |el| {
            el.set_attribute("font-size", presentation.root_font_size());
        });
    }

    pub fn apply_scenes(&mut self, scenes: &[SceneIndicator]) {
        for indicator in scenes {
            let active = indicator.phase == ScenePhase::Active;
            self.with(&indicator.scene.icon_id(), |el| {
                el.set_class("pulse-animation", active);
            });
            self.with(&indicator.scene.card_id(), |el| {
                el.set_class("active-scene", active);
                el.set_attribute(
                    "loader",
                    if indicator.phase == ScenePhase::Pending {
                        "block"
                    } else {
                        "none"
                    },
                );
                el.text = Some(indicator.status_text().to_string());
            });
        }
    }
}
