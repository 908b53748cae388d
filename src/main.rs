use std::any::Any;
use std::env;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{error, info, warn};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::WindowBuilder;

use shading_lab::{
    show_control_panels, window_title, AppState, DemoAssets, DemoConfig, FpsCounter, FramePlan,
    KeyCode, MissingTexturePolicy, NamedKey, Renderer, Scene, StartupError, Technique,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        let code = if err.downcast_ref::<StartupError>().is_some() {
            StartupError::EXIT_CODE
        } else {
            1
        };
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let config = match &options.config {
        Some(path) => DemoConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DemoConfig::default(),
    };
    let policy = if options.strict_textures {
        MissingTexturePolicy::Fail
    } else {
        MissingTexturePolicy::Placeholder
    };
    let assets = DemoAssets::load(&config, policy).context("failed to load demo assets")?;

    if options.summary_only {
        print_summary(&assets);
        return Ok(());
    }
    run_interactive(&config, assets)
}

fn print_summary(assets: &DemoAssets) {
    println!("Loaded {} meshes", assets.meshes.len());
    for mesh in &assets.meshes {
        println!(
            " - {}: {} faces, {} patch faces (level {})",
            mesh.kind.name(),
            mesh.face_count(),
            mesh.patches.face_count(),
            mesh.patch_level
        );
    }
    println!(
        "Texture sets: {} ({} placeholder maps)",
        assets.texture_set_count(),
        assets.placeholder_count()
    );
    for name in &assets.material_names {
        println!(" - {name}");
    }
    let techniques: Vec<&str> = Technique::ALL.iter().map(|t| t.name()).collect();
    println!("Techniques: {}", techniques.join(", "));
}

fn run_interactive(config: &DemoConfig, assets: DemoAssets) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let mut event_loop = event_loop
        .map_err(|panic| StartupError::Window(format!("event loop: {}", panic_message(panic))))?;

    let window = WindowBuilder::new()
        .with_title(&config.window.title)
        .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
        .build(&event_loop)
        .map_err(|err| StartupError::Window(err.to_string()))?;

    let mut renderer = block_on(Renderer::new(window, &*event_loop, &assets))?;
    let scene = Scene::demo();
    let mut state = AppState::new();
    state.params.clamp_texture_set(assets.texture_set_count());

    let mut frame_clock = Instant::now();
    let mut fps = FpsCounter::default();
    let mut failure: Option<anyhow::Error> = None;

    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::WindowEvent { event, window_id } if window_id == renderer.window_id() => {
                let consumed = renderer.on_window_event(&event);
                match event {
                    WindowEvent::CloseRequested => control_flow.set_exit(),
                    WindowEvent::Resized(size) => renderer.resize(size),
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size)
                    }
                    WindowEvent::Focused(false) => state.input.release_all(),
                    WindowEvent::KeyboardInput { input, .. } => {
                        // releases always go through so no key stays held
                        if !consumed || input.state == ElementState::Released {
                            handle_keyboard(&mut state, &input);
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } if !consumed => {
                        state.handle_cursor(Vec2::new(position.x as f32, position.y as f32));
                    }
                    _ => {}
                }
            }
            Event::MainEventsCleared => renderer.window().request_redraw(),
            Event::RedrawRequested(window_id) if window_id == renderer.window_id() => {
                let now = Instant::now();
                let delta_time = now.duration_since(frame_clock).as_secs_f32();
                frame_clock = now;
                if let Some(rate) = fps.tick(delta_time) {
                    renderer.set_title(&window_title(&config.window.title, rate));
                }

                state.update(delta_time);
                let plan = FramePlan::build(&state, &scene, renderer.aspect_ratio());
                let names = &assets.material_names;
                match renderer.render(&plan, |ctx| show_control_panels(ctx, &mut state, names)) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.reconfigure()
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        warn!("surface timeout; retrying next frame")
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("GPU is out of memory");
                        failure = Some(anyhow!("GPU is out of memory"));
                        control_flow.set_exit();
                    }
                }
            }
            _ => {}
        }
        if state.quit_requested {
            control_flow.set_exit();
        }
    });

    info!("shutting down");
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_keyboard(state: &mut AppState, input: &KeyboardInput) {
    let Some(key) = input.virtual_keycode.and_then(map_keycode) else {
        return;
    };
    state.handle_key(key, input.state == ElementState::Pressed);
}

fn map_keycode(code: VirtualKeyCode) -> Option<KeyCode> {
    use VirtualKeyCode as Key;
    Some(match code {
        Key::Space => KeyCode::Named(NamedKey::Space),
        Key::Left => KeyCode::Named(NamedKey::Left),
        Key::Right => KeyCode::Named(NamedKey::Right),
        Key::Up => KeyCode::Named(NamedKey::Up),
        Key::Down => KeyCode::Named(NamedKey::Down),
        Key::Escape => KeyCode::Named(NamedKey::Escape),
        Key::PageUp => KeyCode::Named(NamedKey::PageUp),
        Key::PageDown => KeyCode::Named(NamedKey::PageDown),
        Key::W => KeyCode::Character('W'),
        Key::A => KeyCode::Character('A'),
        Key::S => KeyCode::Character('S'),
        Key::D => KeyCode::Character('D'),
        Key::P => KeyCode::Character('P'),
        Key::L => KeyCode::Character('L'),
        _ => return None,
    })
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

const USAGE: &str = "shading-lab [CONFIG.xml] [--summary-only] [--strict-textures]";

struct CliOptions {
    config: Option<PathBuf>,
    summary_only: bool,
    strict_textures: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut options = Self {
            config: None,
            summary_only: false,
            strict_textures: false,
        };
        for arg in env::args().skip(1) {
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--strict-textures" => options.strict_textures = true,
                flag if flag.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {flag}. Usage: {USAGE}"));
                }
                path if options.config.is_none() => options.config = Some(PathBuf::from(path)),
                extra => return Err(anyhow!("Unexpected argument: {extra}")),
            }
        }
        Ok(options)
    }
}
