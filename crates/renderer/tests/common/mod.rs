//! Recording fakes for the backend, window and model seams.
//!
//! Every fake shares one [`World`] that scripts surface and window
//! behavior and logs every call as an [`Event`].

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use ash::vk::{self, Handle};
use swapframe_renderer::{
    BoundPipeline, CommandRecorder, FrameOrchestrator, Model, PresentTarget, RenderBackend,
    WindowSurface,
};
use swapframe_rhi::RhiResult;
use swapframe_rhi::swapchain::{AcquireStatus, PresentStatus};

pub const VERTEX_BUFFER: u64 = 0x55;
pub const PIPELINE_LAYOUT: u64 = 0x77;

pub fn extent(width: u32, height: u32) -> vk::Extent2D {
    vk::Extent2D { width, height }
}

pub fn render_pass_of(swap_chain: u64) -> vk::RenderPass {
    vk::RenderPass::from_raw(0x1000 + swap_chain)
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Begin,
    End,
    BeginRenderPass {
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
    },
    EndRenderPass,
    Viewport { width: f32, height: f32 },
    Scissor(vk::Rect2D),
    BindPipeline(vk::Pipeline),
    BindVertexBuffers(Vec<vk::Buffer>),
    PushConstants {
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        bytes: Vec<u8>,
    },
    Draw { vertex_count: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    WaitIdle,
    CreateSwapChain {
        generation: u64,
        extent: vk::Extent2D,
        chained_from: Option<u64>,
    },
    DestroySwapChain(u64),
    CreatePipeline {
        generation: u64,
        render_pass: vk::RenderPass,
    },
    DestroyPipeline(u64),
    AllocateCommandBuffers(Vec<vk::CommandBuffer>),
    FreeCommandBuffers(Vec<vk::CommandBuffer>),
    Acquire(u64),
    Submit {
        swap_chain: u64,
        image_index: u32,
        commands: vk::CommandBuffer,
    },
    Present {
        swap_chain: u64,
        image_index: u32,
    },
    PollEvents,
    WaitEvents,
    Record(vk::CommandBuffer, Command),
}

/// Scripted state shared by all fakes.
#[derive(Debug)]
pub struct World {
    pub events: Vec<Event>,
    /// Images every new swap chain gets.
    pub surface_image_count: usize,
    /// Acquire results to return before falling back to round-robin `Ready`.
    pub acquire_script: VecDeque<RhiResult<AcquireStatus>>,
    /// Present results to return before falling back to `Optimal`.
    pub present_script: VecDeque<PresentStatus>,
    pub window_extent: vk::Extent2D,
    /// Extents the window takes on, one per `wait_events` call.
    pub extents_after_wait: VecDeque<vk::Extent2D>,
    pub resized: bool,
    pub close_requested: bool,
    /// Request close on this `poll_events` call (1-based).
    pub close_on_poll: Option<usize>,
    pub polls: usize,
    next_swap_chain: u64,
    next_pipeline: u64,
    next_command_buffer: u64,
}

impl Default for World {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            surface_image_count: 3,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            window_extent: extent(800, 600),
            extents_after_wait: VecDeque::new(),
            resized: false,
            close_requested: false,
            close_on_poll: None,
            polls: 0,
            next_swap_chain: 1,
            next_pipeline: 1,
            next_command_buffer: 1,
        }
    }
}

pub type Shared = Rc<RefCell<World>>;

pub fn world() -> Shared {
    Rc::new(RefCell::new(World::default()))
}

pub fn log(world: &Shared, event: Event) {
    world.borrow_mut().events.push(event);
}

/// Removes and returns everything logged so far.
pub fn take_events(world: &Shared) -> Vec<Event> {
    std::mem::take(&mut world.borrow_mut().events)
}

pub fn position(events: &[Event], predicate: impl Fn(&Event) -> bool) -> Option<usize> {
    events.iter().position(predicate)
}

pub fn recorded(events: &[Event]) -> Vec<Command> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Record(_, command) => Some(command.clone()),
            _ => None,
        })
        .collect()
}

pub struct FakeSwapChain {
    world: Shared,
    pub generation: u64,
    extent: vk::Extent2D,
    image_count: usize,
    next_image: u32,
}

impl PresentTarget for FakeSwapChain {
    fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    fn image_count(&self) -> usize {
        self.image_count
    }

    fn render_pass(&self) -> vk::RenderPass {
        render_pass_of(self.generation)
    }

    fn framebuffer(&self, image_index: u32) -> vk::Framebuffer {
        vk::Framebuffer::from_raw(self.generation * 100 + u64::from(image_index) + 1)
    }

    fn acquire_next_image(&mut self) -> RhiResult<AcquireStatus> {
        log(&self.world, Event::Acquire(self.generation));

        let scripted = self.world.borrow_mut().acquire_script.pop_front();
        match scripted {
            Some(result) => result,
            None => {
                let index = self.next_image % self.image_count as u32;
                self.next_image += 1;
                Ok(AcquireStatus::Ready(index))
            }
        }
    }

    fn submit(&mut self, image_index: u32, commands: vk::CommandBuffer) -> RhiResult<()> {
        log(
            &self.world,
            Event::Submit {
                swap_chain: self.generation,
                image_index,
                commands,
            },
        );
        Ok(())
    }

    fn present(&mut self, image_index: u32) -> RhiResult<PresentStatus> {
        log(
            &self.world,
            Event::Present {
                swap_chain: self.generation,
                image_index,
            },
        );
        let scripted = self.world.borrow_mut().present_script.pop_front();
        Ok(scripted.unwrap_or(PresentStatus::Optimal))
    }
}

impl Drop for FakeSwapChain {
    fn drop(&mut self) {
        log(&self.world, Event::DestroySwapChain(self.generation));
    }
}

pub struct FakePipeline {
    world: Shared,
    pub generation: u64,
    render_pass: vk::RenderPass,
}

impl BoundPipeline for FakePipeline {
    fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    fn layout(&self) -> vk::PipelineLayout {
        vk::PipelineLayout::from_raw(PIPELINE_LAYOUT)
    }

    fn bind<C: CommandRecorder>(&self, commands: &C) {
        commands.bind_pipeline(vk::Pipeline::from_raw(self.generation));
    }
}

impl Drop for FakePipeline {
    fn drop(&mut self) {
        log(&self.world, Event::DestroyPipeline(self.generation));
    }
}

pub struct FakeCommands {
    world: Shared,
    handle: vk::CommandBuffer,
}

impl FakeCommands {
    fn record(&self, command: Command) {
        log(&self.world, Event::Record(self.handle, command));
    }
}

impl CommandRecorder for FakeCommands {
    fn handle(&self) -> vk::CommandBuffer {
        self.handle
    }

    fn begin(&self) -> RhiResult<()> {
        self.record(Command::Begin);
        Ok(())
    }

    fn end(&self) -> RhiResult<()> {
        self.record(Command::End);
        Ok(())
    }

    fn begin_render_pass(
        &self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        _clear_values: &[vk::ClearValue],
    ) {
        self.record(Command::BeginRenderPass {
            render_pass,
            framebuffer,
            extent,
        });
    }

    fn end_render_pass(&self) {
        self.record(Command::EndRenderPass);
    }

    fn set_viewport(&self, viewport: &vk::Viewport) {
        self.record(Command::Viewport {
            width: viewport.width,
            height: viewport.height,
        });
    }

    fn set_scissor(&self, scissor: &vk::Rect2D) {
        self.record(Command::Scissor(*scissor));
    }

    fn bind_pipeline(&self, pipeline: vk::Pipeline) {
        self.record(Command::BindPipeline(pipeline));
    }

    fn bind_vertex_buffers(&self, _first_binding: u32, buffers: &[vk::Buffer], _offsets: &[vk::DeviceSize]) {
        self.record(Command::BindVertexBuffers(buffers.to_vec()));
    }

    fn push_constants(
        &self,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        _offset: u32,
        data: &[u8],
    ) {
        self.record(Command::PushConstants {
            layout,
            stages,
            bytes: data.to_vec(),
        });
    }

    fn draw(&self, vertex_count: u32, _instance_count: u32, _first_vertex: u32, _first_instance: u32) {
        self.record(Command::Draw { vertex_count });
    }
}

pub struct FakeBackend {
    world: Shared,
}

impl RenderBackend for FakeBackend {
    type SwapChain = FakeSwapChain;
    type Pipeline = FakePipeline;
    type Commands = FakeCommands;

    fn create_swap_chain(
        &mut self,
        extent: vk::Extent2D,
        previous: Option<FakeSwapChain>,
    ) -> RhiResult<FakeSwapChain> {
        let (generation, image_count) = {
            let mut world = self.world.borrow_mut();
            let generation = world.next_swap_chain;
            world.next_swap_chain += 1;
            (generation, world.surface_image_count)
        };

        log(
            &self.world,
            Event::CreateSwapChain {
                generation,
                extent,
                chained_from: previous.as_ref().map(|old| old.generation),
            },
        );

        let swap_chain = FakeSwapChain {
            world: self.world.clone(),
            generation,
            extent,
            image_count,
            next_image: 0,
        };

        // Released only once the new one exists.
        drop(previous);

        Ok(swap_chain)
    }

    fn create_pipeline(&mut self, render_pass: vk::RenderPass) -> RhiResult<FakePipeline> {
        let generation = {
            let mut world = self.world.borrow_mut();
            let generation = world.next_pipeline;
            world.next_pipeline += 1;
            generation
        };

        log(
            &self.world,
            Event::CreatePipeline {
                generation,
                render_pass,
            },
        );

        Ok(FakePipeline {
            world: self.world.clone(),
            generation,
            render_pass,
        })
    }

    fn allocate_command_buffers(&mut self, count: usize) -> RhiResult<Vec<FakeCommands>> {
        let handles: Vec<vk::CommandBuffer> = {
            let mut world = self.world.borrow_mut();
            (0..count)
                .map(|_| {
                    let raw = world.next_command_buffer;
                    world.next_command_buffer += 1;
                    vk::CommandBuffer::from_raw(raw)
                })
                .collect()
        };

        log(&self.world, Event::AllocateCommandBuffers(handles.clone()));

        Ok(handles
            .into_iter()
            .map(|handle| FakeCommands {
                world: self.world.clone(),
                handle,
            })
            .collect())
    }

    fn free_command_buffers(&mut self, buffers: Vec<FakeCommands>) {
        let handles = buffers.iter().map(|buffer| buffer.handle).collect();
        log(&self.world, Event::FreeCommandBuffers(handles));
    }

    fn wait_idle(&self) -> RhiResult<()> {
        log(&self.world, Event::WaitIdle);
        Ok(())
    }
}

pub struct FakeWindow {
    world: Shared,
}

impl WindowSurface for FakeWindow {
    fn extent(&self) -> vk::Extent2D {
        self.world.borrow().window_extent
    }

    fn should_close(&self) -> bool {
        self.world.borrow().close_requested
    }

    fn was_resized(&self) -> bool {
        self.world.borrow().resized
    }

    fn reset_resized_flag(&mut self) {
        self.world.borrow_mut().resized = false;
    }

    fn wait_events(&mut self) {
        log(&self.world, Event::WaitEvents);
        let mut world = self.world.borrow_mut();
        if let Some(next) = world.extents_after_wait.pop_front() {
            world.window_extent = next;
        }
    }

    fn poll_events(&mut self) {
        log(&self.world, Event::PollEvents);
        let mut world = self.world.borrow_mut();
        world.polls += 1;
        if world.close_on_poll == Some(world.polls) {
            world.close_requested = true;
        }
    }
}

pub struct FakeModel {
    world: Shared,
}

impl Model for FakeModel {
    fn bind<C: CommandRecorder>(&self, commands: &C) {
        commands.bind_vertex_buffers(0, &[vk::Buffer::from_raw(VERTEX_BUFFER)], &[0]);
    }

    fn draw<C: CommandRecorder>(&self, commands: &C) {
        commands.draw(3, 1, 0, 0);
    }
}

pub type TestLoop = FrameOrchestrator<FakeBackend, FakeWindow, FakeModel>;

pub fn try_frame_loop(world: &Shared, draw_instances: u32) -> RhiResult<TestLoop> {
    FrameOrchestrator::new(
        FakeBackend {
            world: world.clone(),
        },
        FakeWindow {
            world: world.clone(),
        },
        FakeModel {
            world: world.clone(),
        },
        draw_instances,
    )
}

pub fn frame_loop(world: &Shared, draw_instances: u32) -> TestLoop {
    try_frame_loop(world, draw_instances).expect("frame loop should start")
}

pub fn command_handles(frame_loop: &TestLoop) -> Vec<vk::CommandBuffer> {
    frame_loop
        .command_buffers()
        .iter()
        .map(CommandRecorder::handle)
        .collect()
}
