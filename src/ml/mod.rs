// ============================================================
// Layer 5 - Model Contracts
// ============================================================
// The pipeline prepares data; models and embedding trainers
// consume it. This layer holds the contracts between the two
// and the implementations the binary ships with:
//
//   export.rs    - ExportModel: writes every prepared input
//                  (splits, vectors, indexes, hyperparameters,
//                  commands) for an external trainer
//
//   embedding.rs - ProjectionEmbedder: seeded random projection
//                  of one-hot skill rows into dense team vectors
//
// Real architectures (feed-forward, Bayesian, NMT) implement
// TeamModel outside this crate.

/// Hands prepared inputs to external trainers
pub mod export;

/// Dense team vectors from sparse skill rows
pub mod embedding;

use anyhow::Result;
use std::path::Path;

use crate::application::settings::ModelParams;
use crate::data::{
    splitter::Splits,
    vectorizer::{TeamIndexes, TeamVectors},
};

/// Model keys accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Random,
    Tfnn,
    Tbnn,
    TfnnEmb,
    TbnnEmb,
    Nmt,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Random  => "random",
            ModelKind::Tfnn    => "tfnn",
            ModelKind::Tbnn    => "tbnn",
            ModelKind::TfnnEmb => "tfnn_emb",
            ModelKind::TbnnEmb => "tbnn_emb",
            ModelKind::Nmt     => "nmt",
        }
    }

    /// Embedding-augmented variants train on learned team vectors
    /// instead of one-hot skills.
    pub fn is_embedding(&self) -> bool {
        self.name().contains("_emb")
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── TeamModel ────────────────────────────────────────────────────────────────
/// A team-formation model's training entrypoint.
///
/// Implementations:
///   - ExportModel → writes the inputs for an external trainer
pub trait TeamModel {
    fn run(
        &self,
        splits:  &Splits,
        vectors: &TeamVectors,
        indexes: &TeamIndexes,
        output:  &Path,
        params:  &ModelParams,
        cmd:     &[String],
    ) -> Result<()>;
}

// ─── EmbeddingTrainer ─────────────────────────────────────────────────────────
/// Learns one dense vector per team from its skills.
///
/// Implementations:
///   - ProjectionEmbedder → seeded random projection
pub trait EmbeddingTrainer {
    /// Fit the embedding.
    /// `mode` follows doc2vec: 1 = distributed memory, 0 = bag of words.
    fn train(&mut self, dims: usize, window: usize, mode: u8, epochs: usize) -> Result<()>;

    /// One vector per team row, in row order.
    fn vectors(&self) -> Result<Vec<Vec<f32>>>;
}
