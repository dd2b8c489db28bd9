//! Token embedding sculpting for text-conditioning pipelines.
//!
//! Each token's embedding is rotated a bounded amount toward a robust
//! consensus of its nearest neighbors in the vocabulary table. The output
//! keeps the query's dimension and magnitude; only its direction moves.
//!
//! # Modules
//!
//! - [`config`]: Configuration for blending, schedules, branches and ignored tokens
//! - [`error`]: Error types and result aliases
//! - [`vector`]: Dense vector helpers and the read-only [`EmbeddingTable`]
//! - [`neighbors`]: Cosine top-k neighbor search with self-exclusion
//! - [`weighting`]: Softmax and winsorized (median/MAD) weighting
//! - [`divergence`]: KL divergence, entropy and consensus confidence
//! - [`trust_region`]: Angle-capped tangent steps
//! - [`schedule`]: Strength-to-parameter mapping
//! - [`blender`]: Multi-scale blend with KL-bounded shrinking
//! - [`sculpt`]: The vector-to-vector boundary
//! - [`provider`]: Tokenizer and embedding-table capability traits
//! - [`pipeline`]: Token-level sculpting over tokenizer output
//!
//! # Example
//!
//! ```
//! use vectorpusher_core::{sculpt_vector, EmbeddingTable, Schedule};
//!
//! let table = EmbeddingTable::from_rows(vec![
//!     vec![1.0, 0.0, 0.0],
//!     vec![0.9, 0.4, 0.0],
//!     vec![0.8, 0.0, 0.5],
//!     vec![0.0, 0.0, 1.0],
//! ]).unwrap();
//!
//! let schedule = Schedule::from_strength(0.5);
//! assert_eq!(schedule.k, 14);
//!
//! let query = table.row(0).unwrap().to_vec();
//! let sculpted = sculpt_vector(&query, &table, 0.5, None, None).unwrap();
//! assert_eq!(sculpted.len(), query.len());
//! ```

pub mod config;
pub mod error;
pub mod vector;

// Numeric pipeline stages
pub mod blender;
pub mod divergence;
pub mod neighbors;
pub mod schedule;
pub mod sculpt;
pub mod trust_region;
pub mod weighting;

// Host integration
pub mod pipeline;
pub mod provider;

pub use config::{BlendConfig, BranchConfig, ScheduleConfig, SculptConfig, SculptMode};
pub use error::{SculptError, SculptResult};
pub use vector::{EmbeddingTable, Vector};

pub use blender::{BlendOutcome, BlendReport, MultiScaleBlender};
pub use neighbors::{NeighborFinder, NeighborSet};
pub use schedule::{Schedule, ScheduleMapper, ScheduleOverrides};
pub use sculpt::{coerce_attention, sculpt_vector, SculptOutcome, VectorSculptor};
pub use trust_region::{StepOutcome, TrustRegionStepper};
pub use weighting::RobustWeighter;

pub use pipeline::{params_summary, SculptStats, SculptedText, SculptedToken, TokenSculptor};
pub use provider::{
    EmbeddingProvider, InMemoryEmbeddingProvider, TokenWeight, TokenizedText, Tokenizer,
};
