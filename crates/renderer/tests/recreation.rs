//! Swap chain recreation tests
//!
//! Minimize/restore, image count changes and the ordering of teardown and
//! rebuild steps.

mod common;

use ash::vk;
use common::*;
use swapframe_renderer::{BoundPipeline, FrameOutcome, PresentTarget};
use swapframe_rhi::RhiError;
use swapframe_rhi::swapchain::PresentStatus;

fn assert_consistent(frame_loop: &TestLoop) {
    let swap_chain = frame_loop.swap_chain().unwrap();
    assert_eq!(
        frame_loop.command_buffers().len(),
        swap_chain.image_count(),
        "one command buffer per image"
    );
    assert_eq!(
        frame_loop.pipeline().unwrap().render_pass(),
        swap_chain.render_pass(),
        "pipeline is bound to the current render pass"
    );
}

#[test]
fn test_minimize_then_restore() {
    let world = world();
    let mut frame_loop = frame_loop(&world, 1);
    take_events(&world);
    {
        let mut world = world.borrow_mut();
        world.window_extent = extent(0, 0);
        world.extents_after_wait.push_back(extent(0, 0));
        world.extents_after_wait.push_back(extent(640, 480));
        world.resized = true;
    }

    let outcome = frame_loop.draw_frame().unwrap();
    assert_eq!(outcome, FrameOutcome::PresentedThenRecreated);

    let events = take_events(&world);
    let waits: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, Event::WaitEvents))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(waits.len(), 2, "blocks until the extent is positive");

    let wait_idle = position(&events, |e| matches!(e, Event::WaitIdle)).unwrap();
    assert!(
        waits.iter().all(|&w| w < wait_idle),
        "nothing is torn down while minimized"
    );
    assert!(events.contains(&Event::CreateSwapChain {
        generation: 2,
        extent: extent(640, 480),
        chained_from: Some(1),
    }));
    assert!(events.contains(&Event::CreatePipeline {
        generation: 2,
        render_pass: render_pass_of(2),
    }));
    assert_consistent(&frame_loop);

    frame_loop.draw_frame().unwrap();
    let commands = recorded(&take_events(&world));
    assert!(commands.contains(&Command::Viewport {
        width: 640.0,
        height: 480.0,
    }));
    assert!(commands.contains(&Command::Scissor(vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent: extent(640, 480),
    })));
}

#[test]
fn test_recreation_order() {
    let world = world();
    let mut frame_loop = frame_loop(&world, 1);
    take_events(&world);

    assert!(frame_loop.recreate_swap_chain().unwrap());

    assert_eq!(
        take_events(&world),
        vec![
            Event::WaitIdle,
            Event::CreateSwapChain {
                generation: 2,
                extent: extent(800, 600),
                chained_from: Some(1),
            },
            Event::DestroySwapChain(1),
            Event::DestroyPipeline(1),
            Event::CreatePipeline {
                generation: 2,
                render_pass: render_pass_of(2),
            },
        ],
        "old pipeline is dropped before the new one is built"
    );
}

#[test]
fn test_recreation_is_idempotent() {
    let world = world();
    let mut frame_loop = frame_loop(&world, 1);
    let before = command_handles(&frame_loop);
    take_events(&world);

    assert!(frame_loop.recreate_swap_chain().unwrap());
    assert!(frame_loop.recreate_swap_chain().unwrap());

    assert_eq!(frame_loop.image_count(), 3);
    assert_eq!(
        command_handles(&frame_loop),
        before,
        "same image count keeps the command buffers"
    );
    assert!(!take_events(&world).iter().any(|e| matches!(
        e,
        Event::FreeCommandBuffers(_) | Event::AllocateCommandBuffers(_)
    )));
    assert_consistent(&frame_loop);
}

#[test]
fn test_image_count_change_reallocates() {
    let world = world();
    let mut frame_loop = frame_loop(&world, 1);
    let before = command_handles(&frame_loop);
    take_events(&world);
    world.borrow_mut().surface_image_count = 2;

    assert!(frame_loop.recreate_swap_chain().unwrap());

    let events = take_events(&world);
    let freed = position(&events, |e| *e == Event::FreeCommandBuffers(before.clone())).unwrap();
    let allocated = position(&events, |e| {
        matches!(e, Event::AllocateCommandBuffers(handles) if handles.len() == 2)
    })
    .unwrap();
    assert!(freed < allocated);
    assert_eq!(frame_loop.command_buffers().len(), 2);
    assert_consistent(&frame_loop);

    // Frames keep flowing with the smaller chain.
    for _ in 0..3 {
        assert_eq!(frame_loop.draw_frame().unwrap(), FrameOutcome::Presented);
    }
}

#[test]
fn test_consistent_after_every_trigger() {
    let world = world();
    let mut frame_loop = frame_loop(&world, 1);

    let counts = [4, 4, 2, 3];
    for count in counts {
        {
            let mut world = world.borrow_mut();
            world.surface_image_count = count;
            world.present_script.push_back(PresentStatus::OutOfDate);
        }
        frame_loop.draw_frame().unwrap();
        assert_eq!(frame_loop.image_count(), count);
        assert_consistent(&frame_loop);
    }
}

#[test]
fn test_close_while_minimized_abandons_recreation() {
    let world = world();
    let mut frame_loop = frame_loop(&world, 1);
    take_events(&world);
    {
        let mut world = world.borrow_mut();
        world.window_extent = extent(0, 0);
        world.close_requested = true;
    }

    assert!(!frame_loop.recreate_swap_chain().unwrap());

    assert!(
        take_events(&world).is_empty(),
        "no wait, teardown or rebuild once the window is closing"
    );
    assert_eq!(frame_loop.swap_chain().unwrap().generation, 1);
}

#[test]
fn test_startup_waits_for_drawable_extent() {
    let world = world();
    {
        let mut world = world.borrow_mut();
        world.window_extent = extent(0, 0);
        world.extents_after_wait.push_back(extent(1024, 768));
    }

    let frame_loop = frame_loop(&world, 1);

    assert_eq!(frame_loop.swap_chain().unwrap().extent(), extent(1024, 768));
    assert_eq!(take_events(&world)[0], Event::WaitEvents);
}

#[test]
fn test_startup_fails_if_closed_while_minimized() {
    let world = world();
    {
        let mut world = world.borrow_mut();
        world.window_extent = extent(0, 0);
        world.close_requested = true;
    }

    let result = try_frame_loop(&world, 1);

    assert!(matches!(result, Err(RhiError::SwapchainError(_))));
    assert!(
        !take_events(&world)
            .iter()
            .any(|e| matches!(e, Event::CreateSwapChain { .. })),
        "nothing is created for a window that never had a size"
    );
}
