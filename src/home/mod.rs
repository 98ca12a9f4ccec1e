pub mod commands;
pub mod controller;
pub mod events;
pub mod scene;
pub mod state;

pub use controller::HomeController;
pub use events::HomeEvent;
pub use scene::{SceneMachine, ScenePhase, SceneTransition};
pub use state::{ColorSim, Device, HomeState, Scene};
