//! Concrete end-to-end scenarios.

use vectorpusher_core::vector::{angle_between_deg, l2_norm};
use vectorpusher_core::{BlendConfig, EmbeddingTable, SculptConfig, VectorSculptor};

use super::helpers::{clustered_table, orthonormal_table, relative_norm_error, rng};

#[test]
fn test_orthonormal_scenario() {
    let table = orthonormal_table();
    let query = table.row(2).unwrap().to_vec();

    let outcome = VectorSculptor::default()
        .sculpt(&query, &table, 0.5, Some(1.0), None)
        .unwrap();

    let schedule = outcome.schedule.expect("strength 0.5 yields a schedule");
    assert_eq!(schedule.k, 14);
    assert!((schedule.theta_max_deg - 14.0).abs() < 1e-5);

    assert!((l2_norm(&outcome.vector) - l2_norm(&query)).abs() < 1e-4);
    assert!(angle_between_deg(&query, &outcome.vector) <= 14.0 + 1e-3);
    assert!(outcome.report.kl <= 0.03 + 1e-6);
    assert!(outcome.report.converged);
    // Only four other rows exist, so every scale sees the same neighbors.
    assert_eq!(outcome.report.confidences.len(), 3);
}

#[test]
fn test_attention_monotonic_sensitivity() {
    let config = SculptConfig {
        blend: BlendConfig {
            kappa: 10.0,
            ..BlendConfig::default()
        },
        ..SculptConfig::default()
    };
    let sculptor = VectorSculptor::new(config);

    let mut checked = 0;
    for seed in 0..8 {
        let mut r = rng(1000 + seed);
        let table = clustered_table(&mut r, 4, 10, 12);
        let query = table.row(3).unwrap().to_vec();

        let full = sculptor.sculpt(&query, &table, 1.0, Some(1.0), None).unwrap();
        let none = sculptor.sculpt(&query, &table, 1.0, Some(0.0), None).unwrap();
        if full.report.degenerate {
            continue;
        }
        let full_angle = angle_between_deg(&query, &full.vector);
        let none_angle = angle_between_deg(&query, &none.vector);
        assert!(
            none_angle < full_angle,
            "attention 0 moved {none_angle} deg, attention 1 moved {full_angle} deg"
        );
        checked += 1;
    }
    assert!(checked > 0);
}

#[test]
fn test_attention_out_of_range_matches_clamped() {
    let mut r = rng(1100);
    let table = clustered_table(&mut r, 3, 8, 6);
    let query = table.row(4).unwrap().to_vec();
    let sculptor = VectorSculptor::default();

    let high = sculptor.sculpt(&query, &table, 0.6, Some(7.5), None).unwrap();
    let one = sculptor.sculpt(&query, &table, 0.6, Some(1.0), None).unwrap();
    assert_eq!(high.vector, one.vector);

    let nan = sculptor.sculpt(&query, &table, 0.6, Some(f32::NAN), None).unwrap();
    let missing = sculptor.sculpt(&query, &table, 0.6, None, None).unwrap();
    assert_eq!(nan.vector, missing.vector);
    assert_eq!(nan.vector, one.vector);
}

#[test]
fn test_single_row_table_is_identity() {
    let table = EmbeddingTable::from_rows(vec![vec![0.3, -0.4, 1.2]]).unwrap();
    let query = table.row(0).unwrap().to_vec();
    let outcome = VectorSculptor::default()
        .sculpt(&query, &table, 1.0, Some(1.0), None)
        .unwrap();
    assert_eq!(outcome.vector, query);
    assert!(outcome.report.degenerate);
}

#[test]
fn test_corrupted_row_does_not_poison_output() {
    let mut rows = vec![
        vec![1.0, 0.1, 0.0, 0.0],
        vec![0.9, 0.3, 0.1, 0.0],
        vec![f32::NAN, 0.0, 1.0, 0.0],
        vec![0.8, 0.0, 0.4, 0.1],
        vec![0.7, 0.5, 0.0, 0.2],
        vec![0.0, 0.0, 0.0, 1.0],
    ];
    rows.push(vec![0.95, 0.2, 0.05, 0.05]);
    let table = EmbeddingTable::from_rows(rows).unwrap();
    let query = table.row(0).unwrap().to_vec();
    let out = VectorSculptor::default()
        .sculpt(&query, &table, 1.0, Some(1.0), None)
        .unwrap();
    assert!(out.vector.iter().all(|x| x.is_finite()));
    assert!(relative_norm_error(&query, &out.vector) < 1e-4);
}

#[test]
fn test_zero_query_stays_zero() {
    let mut r = rng(1200);
    let table = clustered_table(&mut r, 2, 6, 5);
    let query = vec![0.0; 5];
    let outcome = VectorSculptor::default()
        .sculpt(&query, &table, 0.9, Some(1.0), None)
        .unwrap();
    assert!(outcome.vector.iter().all(|x| *x == 0.0));
}
