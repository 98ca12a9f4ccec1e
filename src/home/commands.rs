use std::str::FromStr;

use anyhow::{anyhow, bail, Error};

use crate::{
    home::{ColorSim, Device, Scene, ScenePhase},
    view::terminal::render_surface,
    AppState,
};

pub async fn toggle_device(state: &AppState, device: &str) -> Result<bool, String> {
    let device: Device = device.parse().map_err(|e: Error| e.to_string())?;
    state
        .home
        .toggle_device(device)
        .await
        .map_err(|e| e.to_string())
}

pub async fn toggle_scene(state: &AppState, scene: &str) -> Result<ScenePhase, String> {
    let scene: Scene = scene.parse().map_err(|e: Error| e.to_string())?;
    state
        .home
        .toggle_scene(scene)
        .await
        .map_err(|e| e.to_string())
}

pub async fn toggle_high_contrast(state: &AppState) -> Result<bool, String> {
    state
        .home
        .toggle_high_contrast()
        .await
        .map_err(|e| e.to_string())
}

pub async fn toggle_dyslexia_mode(state: &AppState) -> Result<bool, String> {
    state
        .home
        .toggle_dyslexia_mode()
        .await
        .map_err(|e| e.to_string())
}

pub async fn toggle_reduce_motion(state: &AppState) -> Result<bool, String> {
    state
        .home
        .toggle_reduce_motion()
        .await
        .map_err(|e| e.to_string())
}

pub async fn simulate_color_blindness(state: &AppState, mode: &str) -> Result<(), String> {
    let mode: ColorSim = mode.parse().map_err(|e: Error| e.to_string())?;
    state
        .home
        .simulate_color_blindness(mode)
        .await
        .map_err(|e| e.to_string())
}

pub async fn update_font_size(state: &AppState, percent: u32) -> Result<(), String> {
    state
        .home
        .update_font_size(percent)
        .await
        .map_err(|e| e.to_string())
}

pub async fn reset_home(state: &AppState) -> Result<(), String> {
    state.home.reset().await.map_err(|e| e.to_string())
}

pub async fn get_home_state(state: &AppState) -> Result<String, String> {
    let snapshot = state.home.snapshot().await;
    serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())
}

pub async fn get_dashboard_view(state: &AppState) -> Result<String, String> {
    let view = state.home.view().await;
    serde_json::to_string_pretty(&view).map_err(|e| e.to_string())
}

pub async fn get_dashboard_settings(state: &AppState) -> Result<String, String> {
    serde_json::to_string_pretty(&state.settings.dashboard()).map_err(|e| e.to_string())
}

pub const HELP: &str = "\
commands:
  toggle <device>     livingLight livingTV livingBlinds kitchenLight kitchenCoffee
                      bedroomLight bedroomFan frontDoor alarmSystem
  scene <name>        night away reading
  contrast | dyslexia | motion
  filter <mode>       normal achromatopsia protanopia deuteranopia
  font <percent>
  reset               forget the stored state and start from defaults
  show | state | view | settings | wait | help | quit";

/// One line typed at the dashboard prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle(String),
    Scene(String),
    HighContrast,
    Dyslexia,
    ReduceMotion,
    Filter(String),
    FontSize(u32),
    Reset,
    Show,
    State,
    View,
    Settings,
    Wait,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts
            .next()
            .ok_or_else(|| anyhow!("empty command"))?
            .to_ascii_lowercase();
        let mut argument = |name: &str| {
            parts
                .next()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("'{verb}' needs a {name}"))
        };

        let command = match verb.as_str() {
            "toggle" => Command::Toggle(argument("device")?),
            "scene" => Command::Scene(argument("scene name")?),
            "contrast" => Command::HighContrast,
            "dyslexia" => Command::Dyslexia,
            "motion" => Command::ReduceMotion,
            "filter" => Command::Filter(argument("mode")?),
            "font" => {
                let raw = argument("percentage")?;
                let percent = raw
                    .trim_end_matches('%')
                    .parse()
                    .map_err(|_| anyhow!("'{raw}' is not a font percentage"))?;
                Command::FontSize(percent)
            }
            "reset" => Command::Reset,
            "show" => Command::Show,
            "state" => Command::State,
            "view" => Command::View,
            "settings" => Command::Settings,
            "wait" => Command::Wait,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{other}'; try 'help'"),
        };
        Ok(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Quit,
}

pub async fn dispatch(state: &AppState, command: Command) -> Result<Reply, String> {
    let output = match command {
        Command::Toggle(device) => {
            let on = toggle_device(state, &device).await?;
            format!("{device} -> {on}")
        }
        Command::Scene(scene) => {
            let phase = toggle_scene(state, &scene).await?;
            format!("scene {scene} -> {phase:?}")
        }
        Command::HighContrast => format!("high contrast -> {}", toggle_high_contrast(state).await?),
        Command::Dyslexia => format!("dyslexia font -> {}", toggle_dyslexia_mode(state).await?),
        Command::ReduceMotion => format!("reduce motion -> {}", toggle_reduce_motion(state).await?),
        Command::Filter(mode) => {
            simulate_color_blindness(state, &mode).await?;
            format!("color filter -> {mode}")
        }
        Command::FontSize(percent) => {
            update_font_size(state, percent).await?;
            format!("font size -> {percent}%")
        }
        Command::Reset => {
            reset_home(state).await?;
            render_surface(&state.home.surface().await)
        }
        Command::Show => render_surface(&state.home.surface().await),
        Command::State => get_home_state(state).await?,
        Command::View => get_dashboard_view(state).await?,
        Command::Settings => get_dashboard_settings(state).await?,
        Command::Wait => {
            state.home.settle().await.map_err(|e| e.to_string())?;
            render_surface(&state.home.surface().await)
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Reply::Quit),
    };
    Ok(Reply::Output(output))
}
