// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use hound_core::init_tracing;
use hound_render::Renderer;
use hound_render_vk::{RendererConfig, VkRenderer};
use serde::Deserialize;
use tracing::{error, info, warn};

use hound_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file; a missing file means defaults
    #[arg(long, default_value = "hound.toml")]
    config: PathBuf,

    /// Force a physical device by enumeration index
    #[arg(long)]
    pick_device: Option<usize>,

    /// Enable the Khronos validation layer
    #[arg(long, conflicts_with = "no_validation")]
    validation: bool,

    /// Disable the Khronos validation layer
    #[arg(long)]
    no_validation: bool,
}

impl Args {
    /// Command-line flags win over the file and the environment.
    fn apply(&self, mut cfg: RendererConfig) -> RendererConfig {
        if let Some(index) = self.pick_device {
            cfg.pin_physical_device = Some(index);
        }
        if self.validation {
            cfg.validation = true;
        } else if self.no_validation {
            cfg.validation = false;
        }
        cfg
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
struct WindowCfg {
    title: String,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            title: "hound".into(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct AppCfg {
    #[serde(default)]
    window: WindowCfg,
    #[serde(default)]
    renderer: RendererConfig,
}

fn parse_cfg(text: &str) -> Result<AppCfg> {
    toml::from_str::<AppCfg>(text).context("parse config")
}

fn load_cfg(path: &Path) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => parse_cfg(&s).unwrap_or_else(|e| {
            warn!("{}: {e:#}; using defaults", path.display());
            AppCfg::default()
        }),
        Err(_) => AppCfg::default(),
    }
}

struct App {
    title: String,
    renderer_cfg: RendererConfig,
    window: Option<Window>,
    renderer: Option<VkRenderer>,
    exiting: bool,
}

impl App {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = hound_platform::create_window(event_loop, &self.title)?;
        let target = hound_platform::surface_target(&window)?;
        let renderer = VkRenderer::with_config(&target, &self.renderer_cfg)?;
        let size = renderer.size();
        info!("renderer up ({}x{})", size.width, size.height);

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        self.exiting = true;
        // Renderer first: the surface must go before its window.
        self.renderer = None;
        self.window = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if self.window.is_some() || self.exiting {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            error!("vk init failed: {e:#}");
            self.shut_down(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(window) = &self.window {
            if window_id != window.id() {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                self.shut_down(event_loop);
            }
            WindowEvent::Resized(new_size) => {
                info!("Resized → {}x{}", new_size.width, new_size.height);
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let cfg = load_cfg(&args.config);
    let renderer_cfg = args.apply(cfg.renderer.with_env_overrides());
    info!(
        "config: validation={} pin={:?}",
        renderer_cfg.validation, renderer_cfg.pin_physical_device
    );

    let event_loop: EventLoop<()> = EventLoop::new()?;
    let mut app = App {
        title: cfg.window.title,
        renderer_cfg,
        window: None,
        renderer: None,
        exiting: false,
    };

    event_loop.run_app(&mut app)?;
    Ok(())
}
