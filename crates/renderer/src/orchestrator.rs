//! Per-frame render loop and swap chain recreation.
//!
//! ```text
//! Running   --acquire--> Ready     --record, submit--> Submitted --present--> Running
//! Running   --acquire--> OutOfDate --recreate--> Running (frame skipped)
//! Submitted --present--> OutOfDate | Suboptimal | resized --recreate--> Running
//! ```
//!
//! Any error from acquire, submit, present or recreation is fatal and is
//! returned to the caller.

use ash::vk;
use tracing::{debug, error, info};

use swapframe_core::FrameTimer;
use swapframe_rhi::command::{full_scissor, full_viewport};
use swapframe_rhi::swapchain::AcquireStatus;
use swapframe_rhi::{RhiError, RhiResult};

use crate::backend::{BoundPipeline, CommandRecorder, PresentTarget, RenderBackend};
use crate::model::Model;
use crate::push_constants::{ANIMATION_PERIOD, PushConstantBlock};
use crate::window::WindowSurface;

/// Background color of every frame.
pub const CLEAR_COLOR: [f32; 4] = [0.01, 0.01, 0.01, 1.0];

/// What [`FrameOrchestrator::draw_frame`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was shown and the swap chain was not replaced.
    Presented,
    /// Acquire reported out-of-date; nothing was recorded and the swap
    /// chain was recreated unless the window closed while minimized.
    Skipped,
    /// The frame was shown, then the swap chain was replaced.
    PresentedThenRecreated,
}

/// Clear values in render pass attachment order: color, depth.
pub fn clear_values() -> [vk::ClearValue; 2] {
    [
        vk::ClearValue {
            color: vk::ClearColorValue {
                float32: CLEAR_COLOR,
            },
        },
        vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: 1.0,
                stencil: 0,
            },
        },
    ]
}

fn is_zero_area(extent: vk::Extent2D) -> bool {
    extent.width == 0 || extent.height == 0
}

/// Owns the current swap chain, pipeline and command buffers and drives
/// them one frame at a time.
///
/// `command_buffers` always has one entry per swap chain image outside of
/// [`Self::recreate_swap_chain`], and the pipeline is always bound to the
/// swap chain's current render pass.
pub struct FrameOrchestrator<B: RenderBackend, W: WindowSurface, M: Model> {
    swap_chain: Option<B::SwapChain>,
    pipeline: Option<B::Pipeline>,
    command_buffers: Vec<B::Commands>,
    // Model data goes before the backend that owns the device.
    model: M,
    backend: B,
    window: W,
    draw_instances: u32,
    frame_number: u32,
    timer: FrameTimer,
}

impl<B: RenderBackend, W: WindowSurface, M: Model> FrameOrchestrator<B, W, M> {
    /// Creates the first swap chain, its pipeline and command buffers.
    ///
    /// Waits for a non-zero window extent first.
    ///
    /// # Errors
    ///
    /// Any creation failure, or [`RhiError::SwapchainError`] if the window
    /// is closed before it ever had a drawable size.
    pub fn new(mut backend: B, mut window: W, model: M, draw_instances: u32) -> RhiResult<Self> {
        let extent = wait_for_drawable_extent(&mut window).ok_or_else(|| {
            RhiError::SwapchainError("Window closed before the first frame".to_string())
        })?;

        let swap_chain = backend.create_swap_chain(extent, None)?;
        let pipeline = backend.create_pipeline(swap_chain.render_pass())?;
        let command_buffers = backend.allocate_command_buffers(swap_chain.image_count())?;

        info!(
            "Frame loop ready: {}x{}, {} images, {} draw instance(s)",
            extent.width,
            extent.height,
            swap_chain.image_count(),
            draw_instances
        );

        Ok(Self {
            swap_chain: Some(swap_chain),
            pipeline: Some(pipeline),
            command_buffers,
            model,
            backend,
            window,
            draw_instances,
            frame_number: 0,
            timer: FrameTimer::default(),
        })
    }

    /// Polls events and draws until the window asks to close, then waits
    /// for the device to go idle.
    pub fn run(&mut self) -> RhiResult<()> {
        info!("Entering render loop");

        while !self.window.should_close() {
            self.window.poll_events();
            // Polling may have delivered the close request.
            if self.window.should_close() {
                break;
            }
            self.draw_frame()?;
        }

        self.backend.wait_idle()?;
        info!("Render loop finished");
        Ok(())
    }

    /// Acquires, records, submits and presents one frame.
    pub fn draw_frame(&mut self) -> RhiResult<FrameOutcome> {
        let status = self.swap_chain_mut()?.acquire_next_image()?;

        let image_index = match status {
            AcquireStatus::OutOfDate => {
                debug!("Swap chain out of date on acquire, skipping frame");
                self.recreate_swap_chain()?;
                return Ok(FrameOutcome::Skipped);
            }
            AcquireStatus::Suboptimal(index) => {
                debug!("Acquired image {} from a suboptimal swap chain", index);
                index
            }
            AcquireStatus::Ready(index) => index,
        };

        self.record_command_buffer(image_index)?;

        let commands = self.command_buffer(image_index)?.handle();
        let swap_chain = self.swap_chain_mut()?;
        swap_chain.submit(image_index, commands)?;
        let present_status = swap_chain.present(image_index)?;

        self.frame_number = (self.frame_number + 1) % ANIMATION_PERIOD;
        if let Some(stats) = self.timer.record_frame() {
            info!(
                "{:.1} fps ({:.2} ms/frame)",
                stats.fps(),
                stats.frame_time_ms()
            );
        }

        if present_status.needs_recreation() || self.window.was_resized() {
            debug!(
                "Recreating after present (status {:?}, resized {})",
                present_status,
                self.window.was_resized()
            );
            self.window.reset_resized_flag();
            if self.recreate_swap_chain()? {
                return Ok(FrameOutcome::PresentedThenRecreated);
            }
        }

        Ok(FrameOutcome::Presented)
    }

    /// Replaces the swap chain, command buffers (if the image count
    /// changed) and pipeline for the current window extent.
    ///
    /// Blocks while the window is minimized. Returns `false` without
    /// touching anything if the window is closed during that wait.
    pub fn recreate_swap_chain(&mut self) -> RhiResult<bool> {
        let Some(extent) = wait_for_drawable_extent(&mut self.window) else {
            info!("Window closed while minimized, abandoning swap chain recreation");
            return Ok(false);
        };

        self.backend.wait_idle()?;

        let previous = self.swap_chain.take();
        let swap_chain = self.backend.create_swap_chain(extent, previous)?;

        let image_count = swap_chain.image_count();
        if image_count != self.command_buffers.len() {
            debug!(
                "Image count changed {} -> {}, reallocating command buffers",
                self.command_buffers.len(),
                image_count
            );
            let old = std::mem::take(&mut self.command_buffers);
            self.backend.free_command_buffers(old);
            self.command_buffers = self.backend.allocate_command_buffers(image_count)?;
        }

        // The old pipeline goes before its replacement is built.
        self.pipeline = None;
        self.pipeline = Some(self.backend.create_pipeline(swap_chain.render_pass())?);
        self.swap_chain = Some(swap_chain);

        info!(
            "Swap chain recreated: {}x{}, {} images",
            extent.width, extent.height, image_count
        );

        Ok(true)
    }

    fn record_command_buffer(&self, image_index: u32) -> RhiResult<()> {
        let swap_chain = self.swap_chain()?;
        let pipeline = self.pipeline()?;
        let commands = self.command_buffer(image_index)?;

        debug_assert_eq!(pipeline.render_pass(), swap_chain.render_pass());

        let extent = swap_chain.extent();
        let clear_values = clear_values();

        commands.begin()?;
        commands.begin_render_pass(
            swap_chain.render_pass(),
            swap_chain.framebuffer(image_index),
            extent,
            &clear_values,
        );

        // Dynamic state is not part of the pipeline; set it every frame.
        commands.set_viewport(&full_viewport(extent));
        commands.set_scissor(&full_scissor(extent));

        pipeline.bind(commands);
        self.model.bind(commands);

        for instance in 0..self.draw_instances {
            let push = PushConstantBlock::for_instance(self.frame_number, instance);
            commands.push_constants(
                pipeline.layout(),
                PushConstantBlock::stages(),
                0,
                push.as_bytes(),
            );
            self.model.draw(commands);
        }

        commands.end_render_pass();
        commands.end()
    }

    fn command_buffer(&self, image_index: u32) -> RhiResult<&B::Commands> {
        self.command_buffers
            .get(image_index as usize)
            .ok_or_else(|| {
                RhiError::InvalidHandle(format!(
                    "No command buffer for image {} ({} allocated)",
                    image_index,
                    self.command_buffers.len()
                ))
            })
    }

    fn swap_chain_mut(&mut self) -> RhiResult<&mut B::SwapChain> {
        self.swap_chain
            .as_mut()
            .ok_or_else(|| RhiError::SwapchainError("No swap chain".to_string()))
    }

    /// Current swap chain.
    pub fn swap_chain(&self) -> RhiResult<&B::SwapChain> {
        self.swap_chain
            .as_ref()
            .ok_or_else(|| RhiError::SwapchainError("No swap chain".to_string()))
    }

    /// Pipeline bound to the current swap chain's render pass.
    pub fn pipeline(&self) -> RhiResult<&B::Pipeline> {
        self.pipeline
            .as_ref()
            .ok_or_else(|| RhiError::PipelineError("No pipeline".to_string()))
    }

    /// Image count of the current swap chain, 0 if there is none.
    pub fn image_count(&self) -> usize {
        self.swap_chain
            .as_ref()
            .map_or(0, PresentTarget::image_count)
    }

    pub fn command_buffers(&self) -> &[B::Commands] {
        &self.command_buffers
    }

    /// Animation frame, wrapping at [`ANIMATION_PERIOD`].
    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }
}

impl<B: RenderBackend, W: WindowSurface, M: Model> Drop for FrameOrchestrator<B, W, M> {
    fn drop(&mut self) {
        if let Err(e) = self.backend.wait_idle() {
            error!("Failed to wait for device idle during shutdown: {}", e);
        }

        self.swap_chain = None;
        self.pipeline = None;
        let command_buffers = std::mem::take(&mut self.command_buffers);
        self.backend.free_command_buffers(command_buffers);

        info!("Frame loop resources released");
    }
}

/// Current extent, waiting on events while it has zero area.
///
/// `None` if the window asks to close first.
fn wait_for_drawable_extent<W: WindowSurface>(window: &mut W) -> Option<vk::Extent2D> {
    let mut extent = window.extent();

    if is_zero_area(extent) {
        debug!("Window minimized, waiting for a drawable size");
    }

    while is_zero_area(extent) {
        if window.should_close() {
            return None;
        }
        window.wait_events();
        extent = window.extent();
    }

    Some(extent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_values() {
        let [color, depth] = clear_values();
        unsafe {
            assert_eq!(color.color.float32, [0.01, 0.01, 0.01, 1.0]);
            assert_eq!(depth.depth_stencil.depth, 1.0);
            assert_eq!(depth.depth_stencil.stencil, 0);
        }
    }

    #[test]
    fn test_zero_area() {
        assert!(is_zero_area(vk::Extent2D { width: 0, height: 0 }));
        assert!(is_zero_area(vk::Extent2D { width: 640, height: 0 }));
        assert!(!is_zero_area(vk::Extent2D { width: 640, height: 480 }));
    }
}
