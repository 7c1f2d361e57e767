//! Window management using winit.
//!
//! The render loop pulls events instead of handing control to
//! `EventLoop::run_app`: [`Window::poll_events`] drains pending events
//! without blocking and [`Window::wait_events`] sleeps until at least one
//! arrives. Both pump the same [`ApplicationHandler`], which records the
//! close request, the latest framebuffer size and a resize flag.

use std::ffi::c_char;
use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window as WinitWindow, WindowAttributes, WindowId};

use swapframe_core::{Error, Result, WindowConfig};

/// Pumps allowed while waiting for the platform to hand us a window.
const CREATE_PUMP_LIMIT: usize = 100;
const CREATE_PUMP_TIMEOUT: Duration = Duration::from_millis(10);

/// RAII wrapper for a Vulkan surface.
///
/// The Vulkan instance that created it must outlive this value.
pub struct Surface {
    handle: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
}

impl Surface {
    #[inline]
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    #[inline]
    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        // SAFETY: created by ash_window::create_surface from the same
        // instance as the loader, and destroyed only here.
        unsafe {
            self.surface_loader.destroy_surface(self.handle, None);
        }
        tracing::debug!("Vulkan surface destroyed");
    }
}

/// Event-driven state shared with winit while pumping.
struct WindowState {
    attributes: WindowAttributes,
    window: Option<Arc<WinitWindow>>,
    width: u32,
    height: u32,
    framebuffer_resized: bool,
    close_requested: bool,
    creation_error: Option<String>,
}

impl WindowState {
    fn on_resized(&mut self, size: PhysicalSize<u32>) {
        if size.width != self.width || size.height != self.height {
            tracing::debug!("Window resized: {}x{}", size.width, size.height);
        }
        self.width = size.width;
        self.height = size.height;
        self.framebuffer_resized = true;
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => {
                let size = window.inner_size();
                self.width = size.width;
                self.height = size.height;
                tracing::info!("Window created: {}x{}", size.width, size.height);
                self.window = Some(Arc::new(window));
            }
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                self.creation_error = Some(e.to_string());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested");
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => self.on_resized(size),
            _ => {}
        }
    }
}

/// Resizable application window with a pull-style event pump.
pub struct Window {
    // Dropped before the event loop.
    state: WindowState,
    event_loop: EventLoop<()>,
}

impl Window {
    /// Opens a window sized and titled from `config`.
    ///
    /// # Errors
    ///
    /// [`Error::Window`] if the event loop or window cannot be created.
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let event_loop = EventLoop::new().map_err(|e| Error::Window(e.to_string()))?;

        let attributes = WindowAttributes::default()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(true);

        let mut window = Self {
            state: WindowState {
                attributes,
                window: None,
                width: config.width,
                height: config.height,
                framebuffer_resized: false,
                close_requested: false,
                creation_error: None,
            },
            event_loop,
        };

        for _ in 0..CREATE_PUMP_LIMIT {
            window.pump(Some(CREATE_PUMP_TIMEOUT));

            if let Some(message) = window.state.creation_error.take() {
                return Err(Error::Window(message));
            }
            if window.state.window.is_some() {
                // Events seen before the first frame are not a resize.
                window.state.framebuffer_resized = false;
                return Ok(window);
            }
            if window.state.close_requested {
                break;
            }
        }

        Err(Error::Window(format!(
            "Window '{}' was not created by the event loop",
            config.title
        )))
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        let status = self.event_loop.pump_app_events(timeout, &mut self.state);
        if let PumpStatus::Exit(code) = status {
            tracing::debug!("Event loop exited with code {}", code);
            self.state.close_requested = true;
        }
    }

    /// Processes pending events without blocking.
    pub fn poll_events(&mut self) {
        self.pump(Some(Duration::ZERO));
    }

    /// Blocks until at least one event arrives, then processes it.
    pub fn wait_events(&mut self) {
        self.pump(None);
    }

    /// Current framebuffer size; zero while minimized on some platforms.
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.state.width,
            height: self.state.height,
        }
    }

    #[inline]
    pub fn should_close(&self) -> bool {
        self.state.close_requested
    }

    #[inline]
    pub fn was_resized(&self) -> bool {
        self.state.framebuffer_resized
    }

    #[inline]
    pub fn reset_resized_flag(&mut self) {
        self.state.framebuffer_resized = false;
    }

    fn winit_window(&self) -> Result<&WinitWindow> {
        self.state
            .window
            .as_deref()
            .ok_or_else(|| Error::Window("Window is not available".to_string()))
    }

    /// Instance extensions needed to create a surface for this window.
    ///
    /// The pointers reference static strings owned by `ash_window`.
    pub fn required_extensions(&self) -> Result<Vec<*const c_char>> {
        let display_handle = self
            .winit_window()?
            .display_handle()
            .map_err(|e| Error::Window(format!("Failed to get display handle: {}", e)))?;

        let extensions = ash_window::enumerate_required_extensions(display_handle.as_raw())
            .map_err(|e| {
                Error::Render(format!("Failed to enumerate required extensions: {}", e))
            })?;

        tracing::debug!(
            "Required Vulkan extensions for surface: {:?}",
            extensions
                .iter()
                // SAFETY: ash_window returns valid, null-terminated static strings.
                .map(|&ext| unsafe { std::ffi::CStr::from_ptr(ext) })
                .collect::<Vec<_>>()
        );

        Ok(extensions.to_vec())
    }

    /// Creates a Vulkan surface for this window.
    ///
    /// `instance` must have been created with [`Self::required_extensions`]
    /// enabled and must outlive the returned [`Surface`].
    pub fn create_surface(&self, entry: &ash::Entry, instance: &ash::Instance) -> Result<Surface> {
        let window = self.winit_window()?;

        let display_handle = window
            .display_handle()
            .map_err(|e| Error::Window(format!("Failed to get display handle: {}", e)))?;

        let window_handle = window
            .window_handle()
            .map_err(|e| Error::Window(format!("Failed to get window handle: {}", e)))?;

        // SAFETY: entry and instance are valid; the handles come from a live
        // winit window. The surface is destroyed in Surface::drop.
        let handle = unsafe {
            ash_window::create_surface(
                entry,
                instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| Error::Render(format!("Failed to create Vulkan surface: {}", e)))?
        };

        let surface_loader = ash::khr::surface::Instance::new(entry, instance);

        tracing::info!("Vulkan surface created");

        Ok(Surface {
            handle,
            surface_loader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(width: u32, height: u32) -> WindowState {
        WindowState {
            attributes: WindowAttributes::default(),
            window: None,
            width,
            height,
            framebuffer_resized: false,
            close_requested: false,
            creation_error: None,
        }
    }

    #[test]
    fn test_resize_records_size_and_flag() {
        let mut state = state(800, 600);
        state.on_resized(PhysicalSize::new(640, 480));
        assert_eq!((state.width, state.height), (640, 480));
        assert!(state.framebuffer_resized);
    }

    #[test]
    fn test_minimize_reports_zero_extent() {
        let mut state = state(800, 600);
        state.on_resized(PhysicalSize::new(0, 0));
        assert_eq!((state.width, state.height), (0, 0));
        assert!(state.framebuffer_resized);
    }
}
