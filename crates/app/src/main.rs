//! swapframe: draws animated triangles through a resize-safe swap chain.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info};

use swapframe_core::AppConfig;
use swapframe_platform::Window;
use swapframe_renderer::{FrameOrchestrator, VertexModel, VulkanBackend};

fn run() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let window = Window::new(&config.window).context("Failed to create window")?;
    let backend = VulkanBackend::new(&window, &config.renderer)
        .context("Failed to initialize Vulkan")?;
    let model = VertexModel::triangle(backend.device().clone())
        .context("Failed to create triangle model")?;

    let mut orchestrator =
        FrameOrchestrator::new(backend, window, model, config.renderer.draw_instances)
            .context("Failed to create swap chain")?;

    orchestrator.run().context("Render loop failed")?;

    Ok(())
}

fn main() -> ExitCode {
    swapframe_core::init_logging();
    info!("Starting swapframe");

    match run() {
        Ok(()) => {
            info!("Exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
