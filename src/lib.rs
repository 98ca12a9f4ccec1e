pub mod db;
pub mod home;
pub mod notify;
pub mod settings;
pub mod utils;
pub mod view;

use anyhow::{Context, Result};
use db::Database;
use home::commands::{dispatch, Command, Reply};
use log::{error, warn};
use settings::{data_dir, debug_mode, SettingsStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use view::{terminal::render_surface, Surface};

pub use home::{HomeController, HomeEvent};

pub struct AppState {
    pub home: HomeController,
    pub settings: SettingsStore,
}

async fn setup() -> Result<AppState> {
    let app_data_dir = data_dir();
    std::fs::create_dir_all(&app_data_dir).with_context(|| {
        format!("failed to create data directory {}", app_data_dir.display())
    })?;

    let settings_path = app_data_dir.join("settings.json");
    let settings_store = SettingsStore::new(settings_path.clone())?;
    if !settings_path.exists() {
        // Write the defaults out so they can be edited.
        settings_store.update_dashboard(settings_store.dashboard())?;
    }
    let dashboard = settings_store.dashboard();

    let database = Database::new(app_data_dir.join("smarthome.sqlite3"))?;
    let home = HomeController::load(database, &dashboard, Surface::dashboard()).await?;

    Ok(AppState {
        home,
        settings: settings_store,
    })
}

/// Prints notifications and scene phase changes as they happen.
fn spawn_event_printer(home: &HomeController) {
    let mut events = home.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(HomeEvent::NotificationShown { notification }) => {
                    println!(">> {}", notification.message);
                }
                Ok(HomeEvent::ScenePhaseChanged { scene, phase }) => {
                    log::debug!("scene {scene} is now {phase:?}");
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("event printer skipped {skipped} events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn serve() -> Result<()> {
    let state = setup().await?;
    spawn_event_printer(&state.home);

    println!("{}", render_surface(&state.home.surface().await));
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match dispatch(&state, command).await {
            Ok(Reply::Output(output)) => println!("{output}"),
            Ok(Reply::Quit) => break,
            Err(err) => println!("error: {err}"),
        }
    }

    Ok(())
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(if debug_mode() {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    log::info!("Smart home dashboard starting up...");

    // Every handler runs to completion on one thread, like the page it stands in for.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    if let Err(err) = runtime.block_on(serve()) {
        error!("dashboard stopped: {err:#}");
        std::process::exit(1);
    }
}
