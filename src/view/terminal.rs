use std::fmt::Write;

use crate::home::{Device, Scene};

use super::surface::{
    Element, Surface, BODY_ID, COLOR_FILTER_ID, DYSLEXIA_ID, FONT_SLIDER_ID, HIGH_CONTRAST_ID,
    MOTION_ID, ROOT_ID, STATUS_MESSAGE_ID,
};

fn text(element: Option<&Element>) -> &str {
    element.and_then(|el| el.text.as_deref()).unwrap_or("-")
}

fn flag(element: Option<&Element>) -> &'static str {
    match element {
        Some(el) if el.has_class("active") => "[x]",
        Some(_) => "[ ]",
        None => "[?]",
    }
}

/// Renders the mounted surface as a plain-text dashboard.
pub fn render_surface(surface: &Surface) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "== {} ==", text(surface.get(STATUS_MESSAGE_ID)));

    for device in Device::ALL {
        let button = surface.get(device.button_id());
        let status_id = format!("{}-status", device.button_id());
        let _ = writeln!(
            out,
            "  {} {:<15} {}",
            flag(button),
            device.label(),
            text(surface.get(&status_id))
        );
    }

    let _ = writeln!(out, "-- scenes --");
    for scene in Scene::ALL {
        let _ = writeln!(
            out,
            "  {:<8} {}",
            scene.label(),
            text(surface.get(&scene.card_id()))
        );
    }

    let _ = writeln!(out, "-- accessibility --");
    let _ = writeln!(
        out,
        "  {} high contrast  {} dyslexia font  {} reduce motion",
        flag(surface.get(HIGH_CONTRAST_ID)),
        flag(surface.get(DYSLEXIA_ID)),
        flag(surface.get(MOTION_ID)),
    );
    let attr = |id: &str, name: &str| {
        surface
            .get(id)
            .and_then(|el| el.attribute(name))
            .unwrap_or("-")
            .to_string()
    };
    let _ = writeln!(
        out,
        "  font {}% ({})  filter {}",
        attr(FONT_SLIDER_ID, "value"),
        attr(ROOT_ID, "font-size"),
        attr(COLOR_FILTER_ID, "value"),
    );
    if let Some(body) = surface.get(BODY_ID) {
        if !body.classes.is_empty() {
            let classes: Vec<&str> = body.classes.iter().map(String::as_str).collect();
            let _ = writeln!(out, "  body: {}", classes.join(" "));
        }
    }

    out
}
