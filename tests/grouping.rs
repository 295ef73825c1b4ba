mod common;

use cascade_detector::detector::DetectionWindow;
use cascade_detector::grouping::{
    build_adjacency, flood_fill, reduce_clusters, suppress_nested, union_find, windows_overlap,
    AdjacencyScratch, Clustering, Detection,
};
use common::init_logger;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashSet};

fn window(x: u32, y: u32, width: u32, height: u32) -> DetectionWindow {
    DetectionWindow {
        x,
        y,
        width,
        height,
    }
}

/// Canonical partition: the set of member sets, independent of label values.
fn partition(clustering: &Clustering) -> BTreeSet<Vec<usize>> {
    clustering.members().into_iter().collect()
}

#[test]
fn adjacency_matches_ground_truth_groups() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(7);
    let group_sizes = [1usize, 2, 3, 5, 8];
    let mut windows = Vec::new();
    let mut group_of = Vec::new();
    for (g, &size) in group_sizes.iter().enumerate() {
        for _ in 0..size {
            let x = 200 * g as u32 + rng.random_range(0..4);
            let y = 50 + rng.random_range(0..4);
            windows.push(window(x, y, 40, 40));
            group_of.push(g);
        }
    }

    let mut scratch = AdjacencyScratch::new(64).expect("scratch");
    let adjacency = build_adjacency(&windows, 0.2, &mut scratch);
    assert_eq!(adjacency.len(), windows.len());

    let mut seen_offsets = HashSet::new();
    let mut covered = vec![false; adjacency.reserved()];
    for i in 0..windows.len() {
        let expected = group_sizes[group_of[i]] - 1;
        assert_eq!(adjacency.neighbor_count(i), expected, "window {i}");
        assert!(seen_offsets.insert(adjacency.offset(i)), "offset reused by {i}");
        for slot in adjacency.offset(i)..adjacency.offset(i) + expected.max(1) {
            assert!(!covered[slot], "entry {slot} shared between ranges");
            covered[slot] = true;
        }
        for j in adjacency.neighbors(i) {
            assert_ne!(i, j);
            assert_eq!(group_of[j], group_of[i]);
            assert!(windows_overlap(&windows[i], &windows[j], 0.2));
        }
    }
    assert!(covered.iter().all(|&c| c));
    let directed: usize = group_sizes.iter().map(|&s| s * (s - 1)).sum();
    assert_eq!(adjacency.entry_count(), directed);
}

#[test]
fn isolated_windows_get_distinct_offsets() {
    init_logger();
    let windows: Vec<DetectionWindow> = [0, 100, 200, 300, 1, 2]
        .into_iter()
        .map(|x| window(x, 0, 40, 40))
        .collect();
    let mut scratch = AdjacencyScratch::new(8).expect("scratch");
    let adjacency = build_adjacency(&windows, 0.2, &mut scratch);

    let counts: Vec<usize> = (0..windows.len()).map(|i| adjacency.neighbor_count(i)).collect();
    assert_eq!(counts, vec![2, 0, 0, 0, 2, 2]);
    let offsets: HashSet<usize> = (0..windows.len()).map(|i| adjacency.offset(i)).collect();
    assert_eq!(offsets.len(), windows.len());
    assert_eq!(adjacency.entry_count(), 6);
    assert_eq!(adjacency.reserved(), 9);
    for i in 1..4 {
        assert_eq!(adjacency.neighbors(i).count(), 0);
    }
}

#[test]
fn flood_fill_and_union_find_agree_on_random_graphs() {
    init_logger();
    let mut scratch = AdjacencyScratch::new(256).expect("scratch");
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = rng.random_range(50..200);
        let windows: Vec<DetectionWindow> = (0..n)
            .map(|_| {
                let side = rng.random_range(30..40);
                window(rng.random_range(0..300), rng.random_range(0..300), side, side)
            })
            .collect();
        let min_neighbors = (seed % 3) as u32;

        let adjacency = build_adjacency(&windows, 0.3, &mut scratch);
        let fill = flood_fill(&adjacency, min_neighbors);
        let reference = union_find(&adjacency, min_neighbors);

        assert_eq!(partition(&fill), partition(&reference), "seed {seed}");
        let clustered: usize = fill.members().iter().map(Vec::len).sum();
        assert_eq!(fill.noise_count(), n - clustered);
        for (i, label) in fill.labels().iter().enumerate() {
            let eligible = adjacency.neighbor_count(i) >= min_neighbors as usize;
            assert_eq!(label.is_some(), eligible, "node {i} seed {seed}");
        }

        // the marks are reset on every run
        assert_eq!(partition(&flood_fill(&adjacency, min_neighbors)), partition(&fill));
    }
}

#[test]
fn noise_nodes_do_not_bridge_clusters() {
    // 0 - 1 - 2 chain where 1 sits between two windows that do not overlap
    // each other; with min_neighbors = 2 only the middle node qualifies
    let windows = [window(0, 0, 20, 20), window(4, 0, 20, 20), window(8, 0, 20, 20)];
    let mut scratch = AdjacencyScratch::new(8).expect("scratch");
    let adjacency = build_adjacency(&windows, 0.25, &mut scratch);
    assert_eq!(adjacency.neighbor_count(0), 1);
    assert_eq!(adjacency.neighbor_count(1), 2);
    assert_eq!(adjacency.neighbor_count(2), 1);

    let clustering = flood_fill(&adjacency, 2);
    assert_eq!(clustering.labels(), &[None, Some(0), None]);
    assert_eq!(clustering.noise_count(), 2);
    assert_eq!(union_find(&adjacency, 2), clustering);
}

#[test]
fn centroid_is_mean_of_members() {
    for k in [1u32, 2, 5, 10] {
        let windows: Vec<DetectionWindow> = (1..=k).map(|i| window(i, i, i, i)).collect();
        let clustering = Clustering::from_labels(vec![Some(0); k as usize]);
        let reduced = reduce_clusters(&windows, &clustering, 1.0);
        assert_eq!(reduced.len(), 1);
        let mean = (k + 1) as f32 / 2.0;
        let d = reduced[0];
        assert_eq!((d.x, d.y, d.width, d.height), (mean, mean, mean, mean), "k={k}");
        assert_eq!(d.neighbors, k);

        let rescaled = reduce_clusters(&windows, &clustering, 0.5)[0];
        assert_eq!(rescaled.x, 2.0 * mean);
    }
}

#[test]
fn unlabelled_windows_are_ignored_by_reduction() {
    let windows = [window(0, 0, 10, 10), window(100, 0, 10, 10), window(2, 0, 10, 10)];
    let clustering = Clustering::from_labels(vec![Some(0), None, Some(0)]);
    let reduced = reduce_clusters(&windows, &clustering, 1.0);
    assert_eq!(reduced.len(), 1);
    assert_eq!(reduced[0].x, 1.0);
    assert_eq!(reduced[0].neighbors, 2);
}

fn detection(x: f32, y: f32, side: f32, neighbors: u32) -> Detection {
    Detection {
        x,
        y,
        width: side,
        height: side,
        neighbors,
    }
}

#[test]
fn suppression_drops_weak_and_nested_detections() {
    let clusters = vec![
        detection(100.0, 100.0, 30.0, 2),  // nested in the strong face, n < 3
        detection(90.0, 90.0, 60.0, 12),   // strong face
        detection(300.0, 300.0, 50.0, 1),  // at min_neighbors: discarded
        detection(95.0, 95.0, 40.0, 6),    // nested, and the face has more than max(3, 6)
        detection(400.0, 50.0, 40.0, 4),   // isolated
    ];
    let kept = suppress_nested(clusters, 1, 0.2);
    let neighbors: Vec<u32> = kept.iter().map(|d| d.neighbors).collect();
    assert_eq!(neighbors, vec![12, 4]);
}

#[test]
fn suppression_keeps_comparable_nested_detections() {
    let clusters = vec![detection(0.0, 0.0, 100.0, 5), detection(10.0, 10.0, 50.0, 5)];
    let kept = suppress_nested(clusters, 0, 0.2);
    assert_eq!(kept.len(), 2);
}
