pub mod model;
pub mod surface;
pub mod terminal;

pub use model::{
    apply_global_settings, render_scenes, render_ui, DashboardView, GlobalPresentation,
    SceneIndicator,
};
pub use surface::Surface;
