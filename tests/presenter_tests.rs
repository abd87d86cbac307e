use std::thread;

use frame_bridge::core::{Presenter, PumpStatus};
use frame_bridge::{BridgeError, DisplaySurface, Frame, MemorySurface, PresentationBridge, SurfaceSize};

fn solid(size: SurfaceSize, rgba: [u8; 4]) -> Vec<u8> {
    rgba.repeat(size.pixel_count())
}

#[test]
fn test_owner_thread_applies_commands_in_order() {
    let bridge = PresentationBridge::new(MemorySurface::new(1, 1));
    let (presenter, handle) = Presenter::new(bridge);
    let owner = thread::spawn(move || presenter.run());

    let size = SurfaceSize::new(4, 3);
    handle.resize(size.width, size.height).unwrap();
    handle.present(&solid(size, [0, 255, 0, 255]), size.width).unwrap();
    handle.close().unwrap();

    let bridge = owner.join().unwrap();
    let surface = bridge.surface();

    assert_eq!(surface.size(), size);
    assert_eq!(surface.pixel(3, 2), Some([0, 255, 0, 255]));
    assert_eq!(surface.blit_count(), 1);
}

#[test]
fn test_many_producers_single_writer() {
    let size = SurfaceSize::new(8, 8);
    let bridge = PresentationBridge::new(MemorySurface::new(size.width, size.height));
    let (presenter, handle) = Presenter::new(bridge);
    let owner = thread::spawn(move || presenter.run());

    let producers: Vec<_> = (0..4u8)
        .map(|id| {
            let handle = handle.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    handle.present(&solid(size, [id, id, id, 255]), size.width).unwrap();
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    handle.close().unwrap();

    let bridge = owner.join().unwrap();
    let blits = bridge.surface().blit_count();
    assert!((1..=100).contains(&blits), "{} blits", blits);

    // Every pixel comes from one whole frame
    let first = bridge.surface().pixel(0, 0).unwrap();
    assert!(bridge.surface().pixels().chunks_exact(4).all(|px| px == first));
}

#[test]
fn test_malformed_frame_rejected_before_send() {
    let bridge = PresentationBridge::new(MemorySurface::new(2, 2));
    let (mut presenter, handle) = Presenter::new(bridge);

    assert_eq!(
        handle.present(&[0u8; 10], 2),
        Err(BridgeError::InvalidBufferShape { len: 10, width: 2 })
    );
    assert!(Frame::new(0, vec![0u8; 10], 2).is_err());

    assert_eq!(presenter.pump(), PumpStatus::Idle);
    assert_eq!(presenter.bridge().surface().blit_count(), 0);
}

#[test]
fn test_pump_per_frame_callback() {
    let bridge = PresentationBridge::new(MemorySurface::new(2, 1));
    let (mut presenter, handle) = Presenter::new(bridge);

    // Host callback with nothing queued
    assert_eq!(presenter.pump(), PumpStatus::Idle);

    let frame = Frame::new(42, [1, 2, 3, 255, 4, 5, 6, 255].to_vec(), 2).unwrap();
    handle.submit(frame).unwrap();
    assert_eq!(presenter.pump(), PumpStatus::Presented);
    assert_eq!(presenter.bridge().surface().pixel(1, 0), Some([4, 5, 6, 255]));

    assert_eq!(presenter.pump(), PumpStatus::Idle);
}

#[test]
fn test_producer_running_ahead_sees_newest_frame() {
    let bridge = PresentationBridge::new(MemorySurface::new(1, 1));
    let (mut presenter, handle) = Presenter::new(bridge);

    for round in 0..3u32 {
        for i in 0..100u32 {
            handle.present(&[(round * 100 + i) as u8, 0, 0, 255], 1).unwrap();
        }
        assert_eq!(presenter.pump(), PumpStatus::Presented);
        assert_eq!(presenter.last_presented(), Some(u64::from(round * 100 + 99)));
    }

    assert_eq!(presenter.frames_presented(), 3);
    assert_eq!(presenter.pump(), PumpStatus::Idle);
}

#[test]
fn test_resize_collapse_then_present_is_skipped_quietly() {
    let bridge = PresentationBridge::new(MemorySurface::new(2, 2));
    let (mut presenter, handle) = Presenter::new(bridge);

    handle.resize(0, 0).unwrap();
    handle.present(&[9u8; 16], 2).unwrap();

    assert_eq!(presenter.pump(), PumpStatus::Presented);
    assert_eq!(presenter.bridge().surface().size(), SurfaceSize::ZERO);
    assert_eq!(presenter.bridge().surface().blit_count(), 0);
}
