//! Window collaborator seen by the frame loop.

use ash::vk;
use swapframe_platform::Window;

/// Size, close and resize state plus the two ways of pumping events.
pub trait WindowSurface {
    /// Current framebuffer extent; 0×0 while minimized.
    fn extent(&self) -> vk::Extent2D;
    fn should_close(&self) -> bool;
    fn was_resized(&self) -> bool;
    fn reset_resized_flag(&mut self);
    /// Blocks until at least one event has been handled.
    fn wait_events(&mut self);
    /// Handles pending events without blocking.
    fn poll_events(&mut self);
}

impl WindowSurface for Window {
    fn extent(&self) -> vk::Extent2D {
        Window::extent(self)
    }

    fn should_close(&self) -> bool {
        Window::should_close(self)
    }

    fn was_resized(&self) -> bool {
        Window::was_resized(self)
    }

    fn reset_resized_flag(&mut self) {
        Window::reset_resized_flag(self);
    }

    fn wait_events(&mut self) {
        Window::wait_events(self);
    }

    fn poll_events(&mut self) {
        Window::poll_events(self);
    }
}
