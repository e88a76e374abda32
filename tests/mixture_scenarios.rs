//! End-to-end learning and query scenarios for the colour mixture.
//!
//! Drives the model the way a segmentation loop does: assign, accumulate,
//! commit, re-query.

use colormix_core::{ColorMixture, MixtureError, SampleAccumulator, Vec3};

// ─── helpers ─────────────────────────────────────────────────────────────────

const SKY: [Vec3; 5] = [
    [90.0, 140.0, 220.0],
    [94.0, 138.0, 225.0],
    [88.0, 145.0, 218.0],
    [92.0, 141.0, 229.0],
    [95.0, 136.0, 221.0],
];

const GRASS: [Vec3; 5] = [
    [40.0, 160.0, 50.0],
    [44.0, 158.0, 47.0],
    [38.0, 166.0, 55.0],
    [41.0, 161.0, 52.0],
    [46.0, 155.0, 49.0],
];

/// Deterministic pseudo-random integer colours around `centre`.
fn jittered(centre: Vec3, n: usize, seed: u64) -> Vec<Vec3> {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        ((state >> 33) % 21) as f64 - 10.0
    };
    (0..n)
        .map(|_| [centre[0] + next(), centre[1] + next(), centre[2] + next()])
        .collect()
}

fn sky_and_grass() -> ColorMixture {
    let mut gmm: ColorMixture = ColorMixture::new();
    gmm.learn(
        SKY.iter()
            .map(|&c| (0, c))
            .chain(GRASS.iter().map(|&c| (1, c))),
    )
    .unwrap();
    gmm
}

// ─── degenerate component ────────────────────────────────────────────────────

/// Ten identical samples on one component: weight 1, exact mean, and the
/// zero covariance regularised to 0.01·I. All other components are inactive.
#[test]
fn test_identical_samples_single_component() {
    let mut gmm: ColorMixture = ColorMixture::new();
    gmm.init_learning();
    for _ in 0..10 {
        gmm.add_sample(2, [100.0, 100.0, 100.0]);
    }
    gmm.end_learning().unwrap();

    assert_eq!(gmm.weight(2), 1.0);
    for v in gmm.mean(2) {
        assert!((v - 100.0).abs() < 1e-9, "mean={:?}", gmm.mean(2));
    }
    let cov = gmm.covariance(2);
    for r in 0..3 {
        for c in 0..3 {
            let expected = if r == c { 0.01 } else { 0.0 };
            assert!((cov[r][c] - expected).abs() < 1e-9, "cov={:?}", cov);
        }
    }
    assert!(gmm.determinant(2) > f64::EPSILON);

    for ci in [0, 1, 3, 4] {
        assert_eq!(gmm.weight(ci), 0.0);
        for color in [[100.0, 100.0, 100.0], [0.0, 0.0, 0.0], [255.0, 10.0, 99.0]] {
            assert_eq!(gmm.weight(ci) * gmm.component_density(ci, color), 0.0);
        }
    }
    assert_eq!(gmm.which_component([100.0, 100.0, 100.0]), 2);
}

// ─── separated clusters ──────────────────────────────────────────────────────

#[test]
fn test_which_component_picks_nearest_cluster() {
    let gmm = sky_and_grass();
    assert_eq!(gmm.which_component([91.0, 140.0, 222.0]), 0);
    assert_eq!(gmm.which_component([42.0, 160.0, 51.0]), 1);
}

#[test]
fn test_weights_sum_to_one_over_active_components() {
    let mut gmm: ColorMixture = ColorMixture::new();
    gmm.learn(
        SKY.iter()
            .map(|&c| (0, c))
            .chain(GRASS.iter().take(3).map(|&c| (3, c)))
            .chain(GRASS.iter().skip(3).map(|&c| (4, c))),
    )
    .unwrap();

    let active = gmm.active_components();
    assert_eq!(active.as_slice(), &[0, 3, 4]);
    let sum: f64 = active.iter().map(|&ci| gmm.weight(ci)).sum();
    assert!((sum - 1.0).abs() < 1e-12, "sum={}", sum);
    assert!((gmm.weight(0) - 0.5).abs() < 1e-15);
    assert!((gmm.weight(3) - 0.3).abs() < 1e-15);
}

#[test]
fn test_mixture_density_is_weighted_component_sum() {
    let gmm = sky_and_grass();
    for color in SKY.iter().chain(GRASS.iter()).chain([[0.0, 0.0, 0.0]].iter()) {
        let expected: f64 = (0..5)
            .map(|ci| gmm.weight(ci) * gmm.component_density(ci, *color))
            .fold(0.0, |acc, x| acc + x);
        assert_eq!(gmm.density(*color), expected);
    }
}

// ─── persistence round-trip ──────────────────────────────────────────────────

/// A model rebuilt from its flat parameters gives identical densities.
#[test]
fn test_param_buffer_round_trip_preserves_densities() {
    let gmm = sky_and_grass();
    let mut params = [0.0; 65];
    gmm.write_params(&mut params).unwrap();

    let restored = ColorMixture::<5>::from_params(&params).unwrap();
    for color in SKY.iter().chain(GRASS.iter()) {
        for ci in 0..5 {
            assert_eq!(
                restored.component_density(ci, *color).to_bits(),
                gmm.component_density(ci, *color).to_bits(),
                "component {} at {:?}",
                ci,
                color
            );
        }
        assert_eq!(restored.density(*color), gmm.density(*color));
    }
}

#[test]
fn test_malformed_buffer_is_invalid_argument() {
    let params = vec![0.0; 13 * 5 + 1];
    match ColorMixture::<5>::from_params(&params) {
        Err(MixtureError::InvalidArgument { expected, got }) => {
            assert_eq!(expected, 65);
            assert_eq!(got, 66);
        }
        other => panic!("expected InvalidArgument, got {:?}", other.map(|_| ())),
    }
}

// ─── refinement loop ─────────────────────────────────────────────────────────

/// A few assign/refit rounds keep both clusters separated and stable.
#[test]
fn test_refinement_loop_converges_on_labels() {
    let sky = jittered([90.0, 140.0, 220.0], 40, 7);
    let grass = jittered([40.0, 160.0, 50.0], 60, 11);
    let pixels: Vec<Vec3> = sky.iter().chain(grass.iter()).copied().collect();

    // crude initial split: first half vs second half
    let mut gmm: ColorMixture = ColorMixture::new();
    gmm.learn(pixels.iter().enumerate().map(|(i, &c)| (if i < 50 { 0 } else { 1 }, c)))
        .unwrap();

    for _ in 0..4 {
        let labels: Vec<usize> = pixels.iter().map(|&c| gmm.which_component(c)).collect();
        gmm.learn(labels.iter().zip(pixels.iter()).map(|(&k, &c)| (k, c)))
            .unwrap();
    }

    let k_sky = gmm.which_component([90.0, 140.0, 220.0]);
    let k_grass = gmm.which_component([40.0, 160.0, 50.0]);
    assert_ne!(k_sky, k_grass);
    assert!((gmm.weight(k_sky) - 0.4).abs() < 1e-12, "w={}", gmm.weight(k_sky));
    assert!((gmm.weight(k_grass) - 0.6).abs() < 1e-12, "w={}", gmm.weight(k_grass));
}

// ─── parallel accumulation ───────────────────────────────────────────────────

/// Per-worker accumulators merged after a parallel scan give the same fit as
/// a single sequential pass.
#[test]
fn test_merged_worker_accumulators_match_sequential_pass() {
    let mut pixels = jittered([90.0, 140.0, 220.0], 64, 3);
    pixels.extend(jittered([40.0, 160.0, 50.0], 64, 5));
    let model = sky_and_grass();

    let mut sequential = model.clone();
    sequential.init_learning();
    for &c in &pixels {
        let k = sequential.which_component(c);
        sequential.add_sample(k, c);
    }
    sequential.end_learning().unwrap();

    let parts: Vec<SampleAccumulator> = std::thread::scope(|s| {
        let handles: Vec<_> = pixels
            .chunks(32)
            .map(|chunk| {
                let model = &model;
                s.spawn(move || {
                    let mut acc: SampleAccumulator = SampleAccumulator::new();
                    for &c in chunk {
                        acc.add_sample(model.which_component(c), c);
                    }
                    acc
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut total: SampleAccumulator = SampleAccumulator::new();
    for part in &parts {
        total.merge(part);
    }
    assert_eq!(total.total_sample_count(), pixels.len());

    let mut parallel = model.clone();
    parallel.end_learning_from(&total).unwrap();

    for ci in 0..5 {
        assert_eq!(parallel.weight(ci), sequential.weight(ci));
        for r in 0..3 {
            assert!((parallel.mean(ci)[r] - sequential.mean(ci)[r]).abs() < 1e-9);
            for c in 0..3 {
                assert!(
                    (parallel.covariance(ci)[r][c] - sequential.covariance(ci)[r][c]).abs() < 1e-6
                );
            }
        }
    }
}

#[test]
fn test_empty_pass_is_usage_error() {
    let mut gmm = sky_and_grass();
    gmm.init_learning();
    assert_eq!(gmm.end_learning(), Err(MixtureError::EmptyPass));
    // the previous fit is still usable
    assert_eq!(gmm.which_component([42.0, 160.0, 51.0]), 1);
}
