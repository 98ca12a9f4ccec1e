use std::{fmt, str::FromStr};

use anyhow::{anyhow, Context, Error, Result};
use serde::{Deserialize, Serialize};

/// Every toggleable device on the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Device {
    LivingLight,
    #[serde(rename = "livingTV")]
    LivingTv,
    LivingBlinds,
    KitchenLight,
    KitchenCoffee,
    BedroomLight,
    BedroomFan,
    FrontDoor,
    AlarmSystem,
}

/// How a device's boolean is worded to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Switch,
    Lock,
    Alarm,
    Blinds,
}

impl Device {
    pub const ALL: [Device; 9] = [
        Device::LivingLight,
        Device::LivingTv,
        Device::LivingBlinds,
        Device::KitchenLight,
        Device::KitchenCoffee,
        Device::BedroomLight,
        Device::BedroomFan,
        Device::FrontDoor,
        Device::AlarmSystem,
    ];

    /// Devices that count toward the "N Devices Active" summary. Blinds and
    /// the front door are left out, the alarm is counted.
    pub const COUNTED: [Device; 7] = [
        Device::LivingLight,
        Device::LivingTv,
        Device::KitchenLight,
        Device::KitchenCoffee,
        Device::BedroomLight,
        Device::BedroomFan,
        Device::AlarmSystem,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Device::LivingLight => "livingLight",
            Device::LivingTv => "livingTV",
            Device::LivingBlinds => "livingBlinds",
            Device::KitchenLight => "kitchenLight",
            Device::KitchenCoffee => "kitchenCoffee",
            Device::BedroomLight => "bedroomLight",
            Device::BedroomFan => "bedroomFan",
            Device::FrontDoor => "frontDoor",
            Device::AlarmSystem => "alarmSystem",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Device::LivingLight => "Living Light",
            // not derived from the key: splitting "livingTV" gives "Living T V"
            Device::LivingTv => "Living TV",
            Device::LivingBlinds => "Living Blinds",
            Device::KitchenLight => "Kitchen Light",
            Device::KitchenCoffee => "Kitchen Coffee",
            Device::BedroomLight => "Bedroom Light",
            Device::BedroomFan => "Bedroom Fan",
            Device::FrontDoor => "Front Door",
            Device::AlarmSystem => "Alarm System",
        }
    }

    /// Id of the dashboard button bound to this device.
    pub fn button_id(self) -> &'static str {
        match self {
            Device::LivingLight => "btn-living",
            Device::LivingTv => "btn-tv",
            Device::LivingBlinds => "btn-blinds",
            Device::KitchenLight => "btn-kitchen",
            Device::KitchenCoffee => "btn-coffee",
            Device::BedroomLight => "btn-bed-light",
            Device::BedroomFan => "btn-fan",
            Device::FrontDoor => "btn-door",
            Device::AlarmSystem => "btn-alarm",
        }
    }

    pub fn kind(self) -> DeviceKind {
        match self {
            Device::FrontDoor => DeviceKind::Lock,
            Device::AlarmSystem => DeviceKind::Alarm,
            Device::LivingBlinds => DeviceKind::Blinds,
            _ => DeviceKind::Switch,
        }
    }

    /// Wording used in the transient notification after a toggle.
    pub fn notification_status(self, on: bool) -> &'static str {
        match (self.kind(), on) {
            (DeviceKind::Lock, true) => "LOCKED",
            (DeviceKind::Lock, false) => "UNLOCKED",
            (DeviceKind::Alarm, true) => "ARMED",
            (DeviceKind::Alarm, false) => "DISARMED",
            (DeviceKind::Blinds, true) => "OPENED",
            (DeviceKind::Blinds, false) => "CLOSED",
            (DeviceKind::Switch, true) => "ON",
            (DeviceKind::Switch, false) => "OFF",
        }
    }

    /// Wording used on the status badge. Blinds read OPEN here, not OPENED.
    pub fn badge_status(self, on: bool) -> &'static str {
        match (self.kind(), on) {
            (DeviceKind::Blinds, true) => "OPEN",
            _ => self.notification_status(on),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Device::ALL
            .into_iter()
            .find(|device| device.key().eq_ignore_ascii_case(value))
            .ok_or_else(|| anyhow!("unknown device '{value}'"))
    }
}

/// Mutually exclusive presets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Scene {
    Night,
    Away,
    Reading,
}

impl Scene {
    pub const ALL: [Scene; 3] = [Scene::Night, Scene::Away, Scene::Reading];

    pub fn key(self) -> &'static str {
        match self {
            Scene::Night => "night",
            Scene::Away => "away",
            Scene::Reading => "reading",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scene::Night => "Night",
            Scene::Away => "Away",
            Scene::Reading => "Reading",
        }
    }

    pub fn card_id(self) -> String {
        format!("scene-{}", self.key())
    }

    /// The icon inside the card; it pulses while the scene is active.
    pub fn icon_id(self) -> String {
        format!("scene-{}-icon", self.key())
    }

    /// Fixed device values forced by the scene.
    pub fn effects(self) -> &'static [(Device, bool)] {
        match self {
            Scene::Night => &[
                (Device::LivingLight, false),
                (Device::LivingTv, false),
                (Device::FrontDoor, true),
                (Device::AlarmSystem, true),
            ],
            Scene::Away => &[
                (Device::LivingLight, false),
                (Device::AlarmSystem, true),
                (Device::BedroomFan, false),
            ],
            Scene::Reading => &[
                (Device::LivingLight, true),
                (Device::LivingTv, false),
                (Device::LivingBlinds, true),
            ],
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Scene {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Scene::ALL
            .into_iter()
            .find(|scene| scene.key().eq_ignore_ascii_case(value))
            .ok_or_else(|| anyhow!("unknown scene '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ColorSim {
    #[default]
    Normal,
    Achromatopsia,
    Protanopia,
    Deuteranopia,
}

impl ColorSim {
    pub const ALL: [ColorSim; 4] = [
        ColorSim::Normal,
        ColorSim::Achromatopsia,
        ColorSim::Protanopia,
        ColorSim::Deuteranopia,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ColorSim::Normal => "normal",
            ColorSim::Achromatopsia => "achromatopsia",
            ColorSim::Protanopia => "protanopia",
            ColorSim::Deuteranopia => "deuteranopia",
        }
    }
}

impl FromStr for ColorSim {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ColorSim::ALL
            .into_iter()
            .find(|mode| mode.key().eq_ignore_ascii_case(value))
            .ok_or_else(|| anyhow!("unknown color simulation '{value}'"))
    }
}

pub const DEFAULT_FONT_SIZE: u32 = 100;

/// The whole persisted dashboard record. Missing fields in stored JSON fall
/// back to the default record's values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HomeState {
    pub living_light: bool,
    #[serde(rename = "livingTV")]
    pub living_tv: bool,
    pub living_blinds: bool,
    pub kitchen_light: bool,
    pub kitchen_coffee: bool,
    pub bedroom_light: bool,
    pub bedroom_fan: bool,
    pub front_door: bool,
    pub alarm_system: bool,
    /// Target temperature. Stored, never acted on.
    pub thermostat: f64,
    pub active_scene: Option<Scene>,
    pub high_contrast: bool,
    pub dyslexia_mode: bool,
    pub reduce_motion: bool,
    pub color_sim: ColorSim,
    pub font_size: u32,
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            living_light: false,
            living_tv: false,
            living_blinds: true,
            kitchen_light: true,
            kitchen_coffee: false,
            bedroom_light: false,
            bedroom_fan: false,
            front_door: true,
            alarm_system: true,
            thermostat: 22.0,
            active_scene: None,
            high_contrast: false,
            dyslexia_mode: false,
            reduce_motion: false,
            color_sim: ColorSim::Normal,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl HomeState {
    pub fn device(&self, device: Device) -> bool {
        match device {
            Device::LivingLight => self.living_light,
            Device::LivingTv => self.living_tv,
            Device::LivingBlinds => self.living_blinds,
            Device::KitchenLight => self.kitchen_light,
            Device::KitchenCoffee => self.kitchen_coffee,
            Device::BedroomLight => self.bedroom_light,
            Device::BedroomFan => self.bedroom_fan,
            Device::FrontDoor => self.front_door,
            Device::AlarmSystem => self.alarm_system,
        }
    }

    fn device_mut(&mut self, device: Device) -> &mut bool {
        match device {
            Device::LivingLight => &mut self.living_light,
            Device::LivingTv => &mut self.living_tv,
            Device::LivingBlinds => &mut self.living_blinds,
            Device::KitchenLight => &mut self.kitchen_light,
            Device::KitchenCoffee => &mut self.kitchen_coffee,
            Device::BedroomLight => &mut self.bedroom_light,
            Device::BedroomFan => &mut self.bedroom_fan,
            Device::FrontDoor => &mut self.front_door,
            Device::AlarmSystem => &mut self.alarm_system,
        }
    }

    pub fn set_device(&mut self, device: Device, on: bool) {
        *self.device_mut(device) = on;
    }

    /// Flips the device and returns its new value.
    pub fn toggle_device(&mut self, device: Device) -> bool {
        let slot = self.device_mut(device);
        *slot = !*slot;
        *slot
    }

    pub fn apply_scene(&mut self, scene: Scene) {
        for &(device, on) in scene.effects() {
            self.set_device(device, on);
        }
    }

    pub fn active_device_count(&self) -> usize {
        Device::COUNTED
            .into_iter()
            .filter(|device| self.device(*device))
            .count()
    }

    /// Parses a record as written by the controller. Fields missing from an
    /// otherwise valid record take their default values.
    pub fn parse_stored(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("stored home state is not a valid record")
    }
}
