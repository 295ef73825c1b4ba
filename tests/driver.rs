mod common;

use cascade_detector::{DetectorParams, FrameDriver};
use common::cascades::block_cascade;
use common::synthetic_image::{integral_of, squares_u8};
use common::{build_detector, init_logger};
use std::sync::Arc;

fn driver(slots: usize) -> FrameDriver {
    let params = DetectorParams {
        initial_scale: 1.0,
        min_size: 8.0,
        max_size: 8.0,
        min_neighbors: 0,
        ..Default::default()
    };
    let detector = build_detector(&block_cascade(&[1, 2, 4]), params, 2, 32, 32);
    FrameDriver::new(Arc::new(detector), slots).expect("driver")
}

#[test]
fn admission_is_bounded_by_slot_count() {
    init_logger();
    let driver = driver(2);
    assert_eq!(driver.available(), 2);

    let first = driver.acquire().expect("first slot");
    let second = driver.try_acquire().expect("second slot");
    assert_eq!(driver.available(), 0);
    assert!(driver.try_acquire().is_none());

    drop(first);
    assert_eq!(driver.available(), 1);
    let third = driver.try_acquire();
    assert!(third.is_some());
    drop(second);
    drop(third);
    assert_eq!(driver.available(), 2);
}

#[test]
fn workspaces_are_reused_round_robin() {
    init_logger();
    let driver = driver(2);
    let integral = integral_of(&squares_u8(32, 32, &[(12, 12)], 4), 32, 32);
    for _ in 0..4 {
        let report = driver.process(&integral).expect("frame");
        assert_eq!(report.detections.len(), 1);
    }

    let a = driver.acquire().expect("slot");
    let b = driver.acquire().expect("slot");
    let frames = |slot: &cascade_detector::detector::FrameSlot<'_>| {
        slot.workspace().map(|ws| ws.frames_processed())
    };
    assert_eq!(frames(&a), Some(2));
    assert_eq!(frames(&b), Some(2));
}

#[test]
fn concurrent_frames_get_identical_results() {
    init_logger();
    let driver = driver(2);
    let integral = integral_of(&squares_u8(32, 32, &[(12, 12)], 4), 32, 32);

    let reports: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..3)
                        .map(|_| driver.process(&integral).expect("frame"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().expect("worker thread"))
            .collect()
    });

    assert_eq!(reports.len(), 12);
    for report in &reports {
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].x, 10.0);
        assert_eq!(report.trace.survivors, 1);
    }
    assert_eq!(driver.available(), 2);
}
