// ============================================================
// Layer 5 - Projection Embedder
// ============================================================
// Maps each team's one-hot skill row to a dense vector:
//
//   1. draw one random vector per skill, uniform in
//      [-1, 1] / sqrt(dims), from the run's seeded RNG
//   2. a team's vector is the mean of its skills' vectors
//
// Teams sharing skills land close together, which is the
// property downstream `_emb` models rely on. Window, mode and
// epochs are accepted for contract compatibility with
// doc2vec-style trainers but do not affect a projection.

use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng};

use crate::data::vectorizer::SkillVectors;
use crate::ml::EmbeddingTrainer;

pub struct ProjectionEmbedder {
    rows:     Vec<Vec<usize>>,
    n_skills: usize,
    rng:      StdRng,
    vectors:  Option<Vec<Vec<f32>>>,
}

impl ProjectionEmbedder {
    /// Fails when the skills are already dense.
    pub fn new(skills: &SkillVectors, rng: StdRng) -> Result<Self> {
        match skills {
            SkillVectors::Sparse(s) => Ok(Self {
                rows:     s.rows.clone(),
                n_skills: s.n_cols,
                rng,
                vectors:  None,
            }),
            SkillVectors::Dense(_) => bail!("Skill vectors are already embedded"),
        }
    }
}

impl EmbeddingTrainer for ProjectionEmbedder {
    fn train(&mut self, dims: usize, window: usize, mode: u8, epochs: usize) -> Result<()> {
        if dims == 0 {
            bail!("Embedding dimensions must be positive");
        }
        tracing::debug!(
            "Projecting {} skills to {} dims (window={}, mode={}, epochs={} unused)",
            self.n_skills,
            dims,
            window,
            mode,
            epochs
        );

        let scale = 1.0 / (dims as f32).sqrt();
        let table: Vec<Vec<f32>> = (0..self.n_skills)
            .map(|_| (0..dims).map(|_| self.rng.gen_range(-1.0f32..=1.0) * scale).collect())
            .collect();

        let vectors = self
            .rows
            .iter()
            .map(|row| {
                let mut v = vec![0.0f32; dims];
                for &s in row {
                    for (acc, x) in v.iter_mut().zip(&table[s]) {
                        *acc += x;
                    }
                }
                if !row.is_empty() {
                    let n = row.len() as f32;
                    v.iter_mut().for_each(|x| *x /= n);
                }
                v
            })
            .collect();

        self.vectors = Some(vectors);
        Ok(())
    }

    fn vectors(&self) -> Result<Vec<Vec<f32>>> {
        match &self.vectors {
            Some(v) => Ok(v.clone()),
            None    => bail!("Embedding has not been trained"),
        }
    }
}
