use egui::{ComboBox, Context, Slider, Ui, Window};

use crate::app::AppState;
use crate::lights::MAX_LIGHTS;
use crate::params::{
    RenderParameters, HEIGHT_SCALE_RANGE, REPEAT_RANGE, SHININESS_RANGE, SPIN_SPEED_RANGE,
    WEIGHT_RANGE,
};
use crate::technique::Technique;

/// Draws the three control windows. Edits land in `state` and are picked up
/// by the next frame plan.
pub fn show_control_panels(ctx: &Context, state: &mut AppState, material_names: &[String]) {
    Window::new("Blinn-Phong parameters").show(ctx, |ui| material_panel(ui, &mut state.params));
    Window::new("Objects appearance")
        .show(ctx, |ui| appearance_panel(ui, &mut state.params, material_names));
    Window::new("Light panel").show(ctx, |ui| light_panel(ui, state));
}

fn material_panel(ui: &mut Ui, params: &mut RenderParameters) {
    ui.add(Slider::new(&mut params.kd, WEIGHT_RANGE).text("Kd"));
    ui.add(Slider::new(&mut params.ks, WEIGHT_RANGE).text("Ks"));
    ui.add(Slider::new(&mut params.ka, WEIGHT_RANGE).text("Ka"));
    ui.add(Slider::new(&mut params.shininess, SHININESS_RANGE).text("Shininess"));
    ui.horizontal(|ui| {
        ui.color_edit_button_rgb(&mut params.specular_color);
        ui.label("Specular color");
    });
    ui.horizontal(|ui| {
        ui.color_edit_button_rgb(&mut params.ambient_color);
        ui.label("Ambient color");
    });
}

fn appearance_panel(ui: &mut Ui, params: &mut RenderParameters, material_names: &[String]) {
    ui.add(Slider::new(&mut params.repeat, REPEAT_RANGE).text("Repeat"));

    ComboBox::from_label("Shader")
        .selected_text(params.technique.name())
        .show_ui(ui, |ui| {
            for technique in Technique::ALL {
                ui.selectable_value(&mut params.technique, technique, technique.name());
            }
        });
    if params.technique.uniforms().height_scale {
        ui.add(Slider::new(&mut params.height_scale, HEIGHT_SCALE_RANGE).text("Height scale"));
    }

    let current = material_names
        .get(params.texture_set)
        .map(String::as_str)
        .unwrap_or("none");
    ComboBox::from_label("Texture")
        .selected_text(current)
        .show_ui(ui, |ui| {
            for (index, name) in material_names.iter().enumerate() {
                ui.selectable_value(&mut params.texture_set, index, name.as_str());
            }
        });

    ui.add(Slider::new(&mut params.spin_speed, SPIN_SPEED_RANGE).text("Spin speed"));
}

fn light_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        if ui.button("addLight").clicked() {
            state.add_light();
        }
        if ui.button("removeLight").clicked() {
            state.remove_light();
        }
    });

    let Some(mut active) = state.lights.active() else {
        ui.label("No lights");
        return;
    };
    ui.horizontal(|ui| {
        for index in 0..state.lights.len().min(MAX_LIGHTS) {
            ui.radio_value(&mut active, index, format!("Light {}", index + 1));
        }
    });
    if state.lights.active() != Some(active) {
        state.lights.set_active(active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frames(state: &mut AppState, names: &[String]) {
        let ctx = Context::default();
        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                show_control_panels(ctx, state, names)
            });
        }
    }

    #[test]
    fn panels_render_without_input() {
        let names = vec!["cobble".to_string(), "sofa".to_string()];
        let mut state = AppState::new();
        let before = state.params.clone();
        run_frames(&mut state, &names);
        assert_eq!(state.params, before);
        assert_eq!(state.lights.len(), 1);
    }

    #[test]
    fn panels_handle_empty_light_set_and_materials() {
        let mut state = AppState::new();
        state.remove_light();
        state.params.technique = Technique::Displacement;
        run_frames(&mut state, &[]);
        assert!(state.lights.is_empty());
        assert_eq!(state.lights.active(), None);
    }
}
