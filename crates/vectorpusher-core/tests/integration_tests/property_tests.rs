//! Property sweeps over seeded random tables.

use rand::Rng;
use vectorpusher_core::vector::angle_between_deg;
use vectorpusher_core::{
    sculpt_vector, EmbeddingTable, NeighborFinder, RobustWeighter, Schedule,
    SculptConfig, SculptMode, VectorSculptor,
};

use super::helpers::{clustered_table, generate_table, random_table, relative_norm_error, rng};

const SWEEPS: u64 = 24;

#[test]
fn test_magnitude_invariance() {
    for seed in 0..SWEEPS {
        let mut r = rng(seed);
        let scale = [1e-6f32, 0.01, 1.0, 40.0][seed as usize % 4];
        let table = random_table(&mut r, 48, 12, scale);
        for _ in 0..6 {
            let row = r.gen_range(0..table.len());
            let strength = r.gen_range(0.0f32..=1.0);
            let attention = r.gen_range(0.0f32..=1.0);
            let query = table.row(row).unwrap().to_vec();
            let out = sculpt_vector(&query, &table, strength, Some(attention), None).unwrap();
            assert!(
                relative_norm_error(&query, &out) < 1e-4,
                "seed={seed} row={row} strength={strength}"
            );
        }
    }
}

#[test]
fn test_magnitude_invariance_off_table_query() {
    let table = generate_table(40, 16, 3);
    for seed in 0..SWEEPS {
        let mut r = rng(100 + seed);
        let query: Vec<f32> = (0..16).map(|_| r.gen_range(-3.0f32..3.0)).collect();
        let out = sculpt_vector(&query, &table, 0.8, Some(1.0), None).unwrap();
        assert!(relative_norm_error(&query, &out) < 1e-4);
    }
}

#[test]
fn test_identity_at_zero_strength() {
    for seed in 0..SWEEPS {
        let mut r = rng(200 + seed);
        let table = random_table(&mut r, 32, 8, 2.0);
        let query = table.row(r.gen_range(0..32)).unwrap().to_vec();
        let out = sculpt_vector(&query, &table, 0.0, Some(r.gen_range(0.0..1.0)), None).unwrap();
        assert_eq!(out, query);
    }
}

#[test]
fn test_angular_bound_multi_scale() {
    for seed in 0..SWEEPS {
        let mut r = rng(300 + seed);
        let table = clustered_table(&mut r, 6, 8, 10);
        let strength = seed as f32 / (SWEEPS - 1) as f32;
        let schedule = Schedule::from_strength(strength);
        for row in (0..table.len()).step_by(7) {
            let query = table.row(row).unwrap().to_vec();
            let out = sculpt_vector(&query, &table, strength, Some(1.0), None).unwrap();
            let angle = angle_between_deg(&query, &out);
            assert!(
                angle <= schedule.theta_max_deg + 0.05,
                "angle {angle} exceeds cap {} at strength {strength}",
                schedule.theta_max_deg
            );
        }
    }
}

#[test]
fn test_angular_bound_single_scale() {
    let sculptor = VectorSculptor::new(SculptConfig::default().with_mode(SculptMode::SingleScale));
    for seed in 0..SWEEPS {
        let mut r = rng(400 + seed);
        let table = clustered_table(&mut r, 4, 10, 8);
        let strength = r.gen_range(0.01f32..=1.0);
        let row = r.gen_range(0..table.len());
        let query = table.row(row).unwrap().to_vec();
        let outcome = sculptor.sculpt(&query, &table, strength, None, None).unwrap();
        let theta = outcome.schedule.unwrap().theta_max_deg;
        assert!(angle_between_deg(&query, &outcome.vector) <= theta + 0.05);
        assert!(relative_norm_error(&query, &outcome.vector) < 1e-4);
    }
}

#[test]
fn test_weight_normalization_with_non_finite() {
    let weighter = RobustWeighter::default();
    for seed in 0..SWEEPS {
        let mut r = rng(500 + seed);
        let n = r.gen_range(1..24);
        let mut sims: Vec<f32> = (0..n).map(|_| r.gen_range(-1.0f32..=1.0)).collect();
        for s in sims.iter_mut() {
            match r.gen_range(0..10) {
                0 => *s = f32::NAN,
                1 => *s = f32::INFINITY,
                2 => *s = f32::NEG_INFINITY,
                _ => {}
            }
        }
        let tau = r.gen_range(0.5f32..20.0);
        let weights = weighter.weights(&sims, tau);
        assert_eq!(weights.len(), n);
        let sum: f32 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "sum={sum} for {sims:?}");
        assert!(weights.iter().all(|w| *w >= 0.0 && w.is_finite()));
    }
}

#[test]
fn test_weight_normalization_all_nan() {
    let weights = RobustWeighter::default().weights(&[f32::NAN; 5], 9.0);
    let sum: f32 = weights.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
    assert!(weights.iter().all(|w| (*w - 0.2).abs() < 1e-5));
}

#[test]
fn test_self_exclusion() {
    let finder = NeighborFinder::default();
    for seed in 0..SWEEPS {
        let mut r = rng(600 + seed);
        let table = random_table(&mut r, 40, 6, 1.0);
        for row in 0..table.len() {
            let query = table.row(row).unwrap();
            let found = finder.find(query, &table, 8);
            assert_eq!(found.len(), 8);
            assert!(!found.indices.contains(&row), "row {row} returned as its own neighbor");
        }
    }
}

#[test]
fn test_self_exclusion_with_near_duplicates() {
    let finder = NeighborFinder::default();
    for seed in 0..SWEEPS {
        let mut r = rng(650 + seed);
        // each odd row sits right behind a lower-index near-duplicate
        let mut rows = Vec::new();
        for _ in 0..16 {
            let base: Vec<f32> = (0..6).map(|_| r.gen_range(-1.0f32..1.0)).collect();
            let mut near = base.clone();
            near[r.gen_range(0..6)] += 1e-4;
            rows.push(near);
            rows.push(base);
        }
        let table = EmbeddingTable::from_rows(rows).unwrap();
        for row in (1..table.len()).step_by(2) {
            let query = table.row(row).unwrap();
            let found = finder.find(query, &table, 4);
            assert_eq!(found.len(), 4);
            assert!(!found.indices.contains(&row), "seed={seed} row {row} returned as its own neighbor");
            assert_eq!(found.indices[0], row - 1);
        }
    }
}

#[test]
fn test_kl_bound_or_exhaustion() {
    let sculptor = VectorSculptor::default();
    let kappa = sculptor.config().blend.kappa;
    let budget = sculptor.config().blend.max_shrink_iterations;
    for seed in 0..SWEEPS {
        let mut r = rng(700 + seed);
        let table = clustered_table(&mut r, 5, 9, 12);
        let strength = r.gen_range(0.0f32..=1.0);
        let row = r.gen_range(0..table.len());
        let query = table.row(row).unwrap().to_vec();
        let outcome = sculptor.sculpt(&query, &table, strength, Some(1.0), None).unwrap();
        let report = outcome.report;
        assert!(
            report.kl <= kappa + 1e-6 || report.shrink_iterations == budget,
            "kl={} after {} shrinks",
            report.kl,
            report.shrink_iterations
        );
        assert!(report.shrink_iterations <= budget);
    }
}

#[test]
fn test_deterministic_output() {
    let mut r = rng(900);
    let table = clustered_table(&mut r, 4, 8, 16);
    let query = table.row(11).unwrap().to_vec();
    let a = sculpt_vector(&query, &table, 0.7, Some(0.4), None).unwrap();
    let b = sculpt_vector(&query, &table, 0.7, Some(0.4), None).unwrap();
    assert_eq!(a, b);
}
