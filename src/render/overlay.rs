use egui::{ClippedPrimitive, TextureId};
use egui_wgpu::renderer::ScreenDescriptor;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::EventLoopWindowTarget;
use winit::window::Window;

/// Tessellated UI for one frame plus the textures to release once it has
/// been drawn.
pub struct OverlayFrame {
    primitives: Vec<ClippedPrimitive>,
    freed: Vec<TextureId>,
}

/// egui context, its winit glue and its wgpu painter.
pub struct Overlay {
    state: egui_winit::State,
    context: egui::Context,
    renderer: egui_wgpu::Renderer,
    screen: ScreenDescriptor,
}

impl Overlay {
    pub fn new<T>(
        event_loop: &EventLoopWindowTarget<T>,
        window: &Window,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
    ) -> Self {
        let mut state = egui_winit::State::new(event_loop);
        let pixels_per_point = window.scale_factor() as f32;
        state.set_pixels_per_point(pixels_per_point);
        Self {
            state,
            context: egui::Context::default(),
            // no depth, single sample
            renderer: egui_wgpu::Renderer::new(device, format, None, 1),
            screen: ScreenDescriptor {
                size_in_pixels: [size.width, size.height],
                pixels_per_point,
            },
        }
    }

    /// Returns true when egui wants the event for itself.
    pub fn on_window_event(&mut self, event: &WindowEvent<'_>) -> bool {
        self.state.on_event(&self.context, event).consumed
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        self.screen.size_in_pixels = [size.width, size.height];
        self.screen.pixels_per_point = scale_factor as f32;
        self.state.set_pixels_per_point(scale_factor as f32);
    }

    /// Runs the UI closure and uploads what it produced. The returned command
    /// buffers must be submitted before the encoder that draws the overlay.
    pub fn prepare(
        &mut self,
        window: &Window,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        run_ui: impl FnOnce(&egui::Context),
    ) -> (OverlayFrame, Vec<wgpu::CommandBuffer>) {
        let input = self.state.take_egui_input(window);
        let output = self.context.run(input, run_ui);
        self.state
            .handle_platform_output(window, &self.context, output.platform_output);

        let primitives = self.context.tessellate(output.shapes);
        for (id, delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let commands =
            self.renderer
                .update_buffers(device, queue, encoder, &primitives, &self.screen);

        let frame = OverlayFrame {
            primitives,
            freed: output.textures_delta.free,
        };
        (frame, commands)
    }

    pub fn paint<'rp>(&'rp self, pass: &mut wgpu::RenderPass<'rp>, frame: &'rp OverlayFrame) {
        self.renderer.render(pass, &frame.primitives, &self.screen);
    }

    pub fn finish(&mut self, frame: OverlayFrame) {
        for id in &frame.freed {
            self.renderer.free_texture(id);
        }
    }
}
