use std::mem::size_of;

use bytemuck::bytes_of;
use log::{info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::EventLoopWindowTarget;
use winit::window::{Window, WindowId};

use crate::app::StartupError;
use crate::assets::DemoAssets;
use crate::lights::MAX_LIGHTS;
use crate::obj::{ObjMesh, VERTEX_STRIDE};
use crate::scene::MeshKind;
use crate::technique::Technique;
use crate::texture::{TextureImage, TextureMap};

use super::overlay::{Overlay, OverlayFrame};
use super::plan::{FramePlan, PolygonFill, LIGHT_MARKER_MESH};
use super::shaders::shader_module;
use super::uniforms::{aligned_stride, GlobalUniform, ObjectUniform};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.05,
    a: 1.0,
};

/// Plane, pot and sphere plus one marker per light.
const MAX_DRAWS: u64 = MeshKind::ALL.len() as u64 + MAX_LIGHTS as u64;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
    3 => Float32x3,
    4 => Float32x3,
];

/// wgpu renderer for the shading demo: one scene pass with depth followed by
/// the egui overlay.
pub struct Renderer {
    // Dropped before `window`.
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,
    programs: Vec<Program>,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    objects_buffer: wgpu::Buffer,
    objects_bind_group: wgpu::BindGroup,
    object_stride: u64,
    meshes: Vec<MeshBuffers>,
    materials: Vec<wgpu::BindGroup>,
    overlay: Overlay,
    window: Window,
}

impl Renderer {
    /// Creates the GPU context for `window` and uploads every mesh and
    /// texture set in `assets`.
    pub async fn new<T>(
        window: Window,
        event_loop: &EventLoopWindowTarget<T>,
        assets: &DemoAssets,
    ) -> Result<Self, StartupError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(StartupError::Window("window has zero area".to_string()));
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        // SAFETY: the surface is declared before the window in `Renderer`, so
        // it is dropped first.
        let surface = unsafe { instance.create_surface(&window) }
            .map_err(|err| StartupError::GraphicsContext(err.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| StartupError::GraphicsContext("no compatible GPU adapter".to_string()))?;
        let adapter_info = adapter.get_info();
        info!("using {} ({:?})", adapter_info.name, adapter_info.backend);

        let features = adapter.features() & wgpu::Features::POLYGON_MODE_LINE;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("shading-lab-device"),
                    features,
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|err| StartupError::GraphicsContext(err.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                StartupError::GraphicsContext("surface reports no formats".to_string())
            })?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .iter()
                .copied()
                .find(|mode| {
                    matches!(
                        mode,
                        wgpu::PresentMode::Immediate | wgpu::PresentMode::Mailbox
                    )
                })
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth = DepthBuffer::create(&device, config.width, config.height);

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals-layout"),
            entries: &[uniform_entry::<GlobalUniform>(false)],
        });
        let objects_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("objects-layout"),
            entries: &[uniform_entry::<ObjectUniform>(true)],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material-layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shading-pipeline-layout"),
            bind_group_layouts: &[&globals_layout, &objects_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals-uniform"),
            size: size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals-bind-group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let object_stride = aligned_stride(
            size_of::<ObjectUniform>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let objects_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("objects-uniform"),
            size: object_stride * MAX_DRAWS,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let objects_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("objects-bind-group"),
            layout: &objects_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &objects_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size_of::<ObjectUniform>() as u64),
                }),
            }],
        });

        let line_mode = features.contains(wgpu::Features::POLYGON_MODE_LINE);
        if !line_mode {
            warn!("adapter lacks line polygon mode; wireframe will draw filled");
        }
        let programs = Technique::ALL
            .into_iter()
            .map(|technique| {
                Program::new(&device, &pipeline_layout, technique, surface_format, line_mode)
            })
            .collect();

        let meshes = assets
            .meshes
            .iter()
            .map(|mesh| MeshBuffers {
                triangles: GpuMesh::upload(&device, &mesh.triangles, mesh.kind.name()),
                patches: GpuMesh::upload(&device, &mesh.patches, mesh.kind.name()),
            })
            .collect();

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let mut materials: Vec<wgpu::BindGroup> = (0..assets.texture_set_count())
            .map(|set| {
                let images = TextureMap::ALL.map(|map| assets.texture(set, map));
                material_bind_group(&device, &queue, &material_layout, &sampler, images)
            })
            .collect();
        if materials.is_empty() {
            warn!("no texture sets configured; drawing with placeholders");
            let placeholders = TextureMap::ALL.map(|map| TextureImage::placeholder(map, "default"));
            let images = [&placeholders[0], &placeholders[1], &placeholders[2]];
            materials.push(material_bind_group(
                &device,
                &queue,
                &material_layout,
                &sampler,
                images,
            ));
        }

        let overlay = Overlay::new(event_loop, &window, &device, surface_format, size);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            depth,
            programs,
            globals_buffer,
            globals_bind_group,
            objects_buffer,
            objects_bind_group,
            object_stride,
            meshes,
            materials,
            overlay,
            window,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.size.width as f32 / self.size.height.max(1) as f32
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    /// Gives the overlay first look at a window event. Returns true when the
    /// event was consumed by the UI.
    pub fn on_window_event(&mut self, event: &WindowEvent<'_>) -> bool {
        self.overlay.on_window_event(event)
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
        self.overlay.resize(new_size, self.window.scale_factor());
    }

    /// Reconfigures the surface at its current size after it was lost.
    pub fn reconfigure(&mut self) {
        self.resize(self.size);
    }

    /// Draws the scene described by `plan`, then the UI built by `run_ui`.
    pub fn render(
        &mut self,
        plan: &FramePlan,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        self.upload(plan);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let (ui_frame, mut commands) = self.overlay.prepare(
            &self.window,
            &self.device,
            &self.queue,
            &mut encoder,
            run_ui,
        );

        self.encode_scene(&mut encoder, &view, plan);
        self.encode_overlay(&mut encoder, &view, &ui_frame);

        commands.push(encoder.finish());
        self.queue.submit(commands);
        output.present();
        self.overlay.finish(ui_frame);
        Ok(())
    }

    fn upload(&self, plan: &FramePlan) {
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytes_of(&plan.globals));
        let uniforms = plan
            .objects
            .iter()
            .map(|draw| &draw.uniform)
            .chain(plan.light_markers.iter())
            .take(MAX_DRAWS as usize);
        for (slot, uniform) in uniforms.enumerate() {
            self.queue.write_buffer(
                &self.objects_buffer,
                slot as u64 * self.object_stride,
                bytes_of(uniform),
            );
        }
    }

    fn encode_scene(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        plan: &FramePlan,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: true,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: true,
                }),
                stencil_ops: None,
            }),
        });

        let material = self
            .materials
            .get(plan.texture_set)
            .unwrap_or(&self.materials[0]);
        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        pass.set_bind_group(2, material, &[]);

        pass.set_pipeline(self.programs[plan.technique.index()].pipeline(plan.polygon_fill));
        for (slot, draw) in plan.objects.iter().enumerate() {
            let buffers = &self.meshes[draw.mesh.index()];
            let mesh = if plan.tessellated {
                &buffers.patches
            } else {
                &buffers.triangles
            };
            self.draw(&mut pass, mesh, slot);
        }

        if plan.light_markers.is_empty() {
            return;
        }
        let marker = &self.meshes[LIGHT_MARKER_MESH.index()].triangles;
        pass.set_pipeline(
            self.programs[Technique::LightMarker.index()].pipeline(plan.polygon_fill),
        );
        for index in 0..plan.light_markers.len() {
            self.draw(&mut pass, marker, plan.objects.len() + index);
        }
    }

    fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, mesh: &'a GpuMesh, slot: usize) {
        if slot as u64 >= MAX_DRAWS {
            return;
        }
        let offset = (slot as u64 * self.object_stride) as wgpu::DynamicOffset;
        pass.set_bind_group(1, &self.objects_bind_group, &[offset]);
        pass.set_vertex_buffer(0, mesh.vertex.slice(..));
        pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn encode_overlay(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        frame: &OverlayFrame,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ui-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: true,
                },
            })],
            depth_stencil_attachment: None,
        });
        self.overlay.paint(&mut pass, frame);
    }
}

/// Fill and optional line pipelines of one technique.
struct Program {
    fill: wgpu::RenderPipeline,
    line: Option<wgpu::RenderPipeline>,
}

impl Program {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        technique: Technique,
        format: wgpu::TextureFormat,
        line_mode: bool,
    ) -> Self {
        let module = shader_module(device, technique);
        let build = |polygon_mode| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(technique.name()),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: "vs_main",
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: (VERTEX_STRIDE * size_of::<f32>()) as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    }],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthBuffer::FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
            })
        };
        Self {
            fill: build(wgpu::PolygonMode::Fill),
            line: line_mode.then(|| build(wgpu::PolygonMode::Line)),
        }
    }

    fn pipeline(&self, fill: PolygonFill) -> &wgpu::RenderPipeline {
        match (fill, &self.line) {
            (PolygonFill::Line, Some(line)) => line,
            _ => &self.fill,
        }
    }
}

struct MeshBuffers {
    triangles: GpuMesh,
    patches: GpuMesh,
}

struct GpuMesh {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &ObjMesh, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

fn uniform_entry<T>(dynamic: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: wgpu::BufferSize::new(size_of::<T>() as u64),
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        // displacement samples the height map in its vertex stage
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &TextureImage,
    map: TextureMap,
) -> wgpu::TextureView {
    let levels = image.mip_chain();
    let format = if map.is_srgb() {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&image.label),
        size: wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: levels.len() as u32,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for (mip_level, level) in (0u32..).zip(&levels) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &level.rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * level.width),
                rows_per_image: Some(level.height),
            },
            wgpu::Extent3d {
                width: level.width,
                height: level.height,
                depth_or_array_layers: 1,
            },
        );
    }
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn material_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    images: [&TextureImage; 3],
) -> wgpu::BindGroup {
    let [diffuse, normal, height] = [
        upload_texture(device, queue, images[0], TextureMap::Diffuse),
        upload_texture(device, queue, images[1], TextureMap::Normal),
        upload_texture(device, queue, images[2], TextureMap::Height),
    ];
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&images[0].label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&diffuse),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&normal),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&height),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
