//! Helper Functions: Deterministic Data Generation

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vectorpusher_core::EmbeddingTable;

/// Seeded generator shared by the property sweeps.
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Generate deterministic embedding using sin-based values in [-1, 1].
pub fn generate_embedding(dim: usize, seed: u64) -> Vec<f32> {
    (0..dim)
        .map(|i| {
            let x = (i as f64 + 1.0) * (seed as f64 * 0.37 + 0.11);
            x.sin() as f32
        })
        .collect()
}

/// Table of `rows` sin-based embeddings.
pub fn generate_table(rows: usize, dim: usize, base_seed: u64) -> EmbeddingTable {
    let data = (0..rows)
        .map(|i| generate_embedding(dim, base_seed + i as u64))
        .collect();
    EmbeddingTable::from_rows(data).expect("generated table is rectangular")
}

/// Table with uniformly random entries in [-scale, scale].
pub fn random_table(rng: &mut ChaCha8Rng, rows: usize, dim: usize, scale: f32) -> EmbeddingTable {
    let data = (0..rows)
        .map(|_| (0..dim).map(|_| rng.gen_range(-scale..scale)).collect())
        .collect();
    EmbeddingTable::from_rows(data).expect("random table is rectangular")
}

/// Table of clustered rows: `clusters` random centers, each with noisy members.
pub fn clustered_table(rng: &mut ChaCha8Rng, clusters: usize, members: usize, dim: usize) -> EmbeddingTable {
    let mut data = Vec::with_capacity(clusters * members);
    for _ in 0..clusters {
        let center: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
        for _ in 0..members {
            data.push(
                center
                    .iter()
                    .map(|c| c + rng.gen_range(-0.15f32..0.15))
                    .collect(),
            );
        }
    }
    EmbeddingTable::from_rows(data).expect("clustered table is rectangular")
}

/// The four standard basis vectors of R^4 plus their normalized sum.
pub fn orthonormal_table() -> EmbeddingTable {
    EmbeddingTable::from_rows(vec![
        vec![1.0, 0.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0, 0.0],
        vec![0.0, 0.0, 1.0, 0.0],
        vec![0.0, 0.0, 0.0, 1.0],
        vec![0.5, 0.5, 0.5, 0.5],
    ])
    .expect("orthonormal table is rectangular")
}

/// Relative magnitude error between `a` and `b`.
pub fn relative_norm_error(a: &[f32], b: &[f32]) -> f32 {
    let na = vectorpusher_core::vector::l2_norm(a);
    let nb = vectorpusher_core::vector::l2_norm(b);
    (na - nb).abs() / na.max(1e-12)
}
