// ============================================================
// Layer 2 - PipelineUseCase
// ============================================================
// Runs every requested (dataset, model) pair:
//
//   Step 1: Validate the request                  (before any work)
//   Step 2: Save the effective settings           (Layer 6 - infra)
//   Step 3: Seed the run's RNG once
//   For each (domain, model) in the Cartesian product:
//   Step 4: Vectorise the dataset                 (Layer 4 - data)
//   Step 5: Split and persist the split           (Layer 4 / 6)
//   Step 6: Embed skills for `_emb` models        (Layer 5 - ml)
//   Step 7: Hand everything to the model          (Layer 5 - ml)
//
// Steps 4 and 5 run once per domain and are shared by all of
// its models, so every model of a dataset sees the same split.
//
// All randomness flows from one StdRng seeded from the
// settings. Its draws happen in a fixed order (domain order,
// then model order), which keeps runs reproducible.
//
// Paths:
//   prep output  <preprocessed_root>/<domain>/<file name><suffix>
//   model output <output>/<file name><suffix>/<model>
// where suffix is ".filtered.mt<N>.ts<M>" for filtered runs.

use anyhow::{bail, Context, Result};
use itertools::iproduct;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::application::settings::Settings;
use crate::data::{
    splitter::{create_evaluation_splits, create_streaming_splits, Splits},
    vectorizer::{Domain, PublicationVectorizer, SkillVectors, SparseVectorizer, TeamIndexes, TeamVectors},
};
use crate::infra::split_store::SplitStore;
use crate::ml::{
    embedding::ProjectionEmbedder, export::ExportModel, EmbeddingTrainer, ModelKind, TeamModel,
};

/// Which split the models receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitStrategy {
    /// Order-preserving train prefix / test suffix
    #[default]
    Temporal,
    /// Shuffled test set plus k-fold folds
    Evaluation,
}

/// What to run. Built from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Dataset path `i` belongs to domain `i`
    pub data:    Vec<PathBuf>,
    pub domains: Vec<Domain>,
    pub models:  Vec<ModelKind>,
    pub filter:  bool,
    pub output:  PathBuf,
    pub split:   SplitStrategy,
}

type ModelFactory    = Box<dyn Fn(ModelKind) -> Box<dyn TeamModel>>;
type EmbedderFactory = Box<dyn Fn(&SkillVectors, StdRng) -> Result<Box<dyn EmbeddingTrainer>>>;

/// Vectors, indexes and split of one dataset.
struct Prepared {
    vectors: TeamVectors,
    indexes: TeamIndexes,
    splits:  Splits,
}

pub struct PipelineUseCase {
    config:      RunConfig,
    settings:    Settings,
    vectorizers: HashMap<Domain, Box<dyn SparseVectorizer>>,
    models:      ModelFactory,
    embedder:    EmbedderFactory,
}

impl PipelineUseCase {
    /// Pipeline with the built-in collaborators: publication
    /// vectorizer for dblp, export models, projection embedder.
    pub fn new(config: RunConfig, settings: Settings) -> Self {
        let mut vectorizers: HashMap<Domain, Box<dyn SparseVectorizer>> = HashMap::new();
        vectorizers.insert(Domain::Dblp, Box::new(PublicationVectorizer));

        Self {
            config,
            settings,
            vectorizers,
            models:   Box::new(|kind| Box::new(ExportModel::new(kind)) as Box<dyn TeamModel>),
            embedder: Box::new(
                |skills: &SkillVectors, rng: StdRng| -> Result<Box<dyn EmbeddingTrainer>> {
                    Ok(Box::new(ProjectionEmbedder::new(skills, rng)?))
                },
            ),
        }
    }

    /// Check the request before touching any data.
    fn validate(&self) -> Result<()> {
        let cfg = &self.config;
        if cfg.data.len() != cfg.domains.len() {
            bail!(
                "Got {} dataset paths for {} domains; pass one path per domain",
                cfg.data.len(),
                cfg.domains.len()
            );
        }
        if cfg.domains.is_empty() || cfg.models.is_empty() {
            bail!("At least one domain and one model are required");
        }
        for domain in &cfg.domains {
            if !self.vectorizers.contains_key(domain) {
                bail!("No vectorizer is available for domain '{domain}'");
            }
        }
        Ok(())
    }

    /// `<file name><suffix>` for a dataset path.
    fn dataset_tag(&self, data_path: &Path) -> Result<String> {
        let name = data_path
            .file_name()
            .with_context(|| format!("Dataset path '{}' has no file name", data_path.display()))?
            .to_string_lossy();

        let suffix = if self.config.filter {
            self.settings.data.filter.suffix()
        } else {
            String::new()
        };
        Ok(format!("{name}{suffix}"))
    }

    fn prep_output(&self, domain: Domain, data_path: &Path) -> Result<PathBuf> {
        Ok(self
            .settings
            .data
            .preprocessed_root
            .join(domain.as_str())
            .join(self.dataset_tag(data_path)?))
    }

    fn model_output(&self, kind: ModelKind, data_path: &Path) -> Result<PathBuf> {
        Ok(self.config.output.join(self.dataset_tag(data_path)?).join(kind.name()))
    }

    /// Vectorise one dataset and split its rows.
    fn prepare(&self, domain: Domain, data_path: &Path, rng: &mut StdRng) -> Result<Prepared> {
        let prep_output = self.prep_output(domain, data_path)?;
        let vectorizer  = &self.vectorizers[&domain];

        tracing::info!("Vectorising {} dataset '{}'", domain, data_path.display());
        let (vectors, indexes) = vectorizer.generate_sparse_vectors(
            data_path,
            &prep_output,
            self.config.filter,
            &self.settings.data,
        )?;

        let n_sample = vectors.n_teams();
        let ratio    = self.settings.model.train_test_split;
        let splits = match self.config.split {
            SplitStrategy::Temporal => Splits::Streaming(create_streaming_splits(n_sample, ratio)?),
            SplitStrategy::Evaluation => Splits::Evaluation(create_evaluation_splits(
                n_sample,
                self.settings.model.nfolds,
                ratio,
                rng,
            )?),
        };
        let path = SplitStore::new(&prep_output).save(&splits)?;
        tracing::info!("{} teams split into '{}'", n_sample, path.display());

        Ok(Prepared { vectors, indexes, splits })
    }

    /// Replace one-hot skills with learned team vectors.
    fn embed(&self, vectors: &mut TeamVectors, rng: &mut StdRng) -> Result<()> {
        let emb = &self.settings.model.baseline.emb;
        let mut trainer = (self.embedder)(&vectors.skill, StdRng::seed_from_u64(rng.gen()))?;

        trainer.train(emb.d, emb.w, emb.dm, emb.e)?;
        let dense = trainer.vectors()?;
        if dense.len() != vectors.n_teams() {
            bail!(
                "Embedding returned {} vectors for {} teams",
                dense.len(),
                vectors.n_teams()
            );
        }

        vectors.skill = SkillVectors::Dense(dense);
        Ok(())
    }

    /// Run every requested (dataset, model) pair.
    pub fn execute(&self) -> Result<()> {
        self.validate()?;
        let cfg = &self.config;

        self.settings.save(&cfg.output)?;
        let mut rng = StdRng::seed_from_u64(self.settings.seed);

        // first path wins when a domain is listed twice
        let mut datasets: Vec<(Domain, &Path)> = Vec::new();
        for (domain, path) in cfg.domains.iter().zip(&cfg.data) {
            if !datasets.iter().any(|(d, _)| d == domain) {
                datasets.push((*domain, path.as_path()));
            }
        }
        let mut models: Vec<ModelKind> = Vec::new();
        for kind in &cfg.models {
            if !models.contains(kind) {
                models.push(*kind);
            }
        }

        let mut prepared: HashMap<Domain, Prepared> = HashMap::new();

        for ((domain, data_path), kind) in iproduct!(datasets, models.iter().copied()) {
            if !prepared.contains_key(&domain) {
                let p = self.prepare(domain, data_path, &mut rng)?;
                prepared.insert(domain, p);
            }
            let p = &prepared[&domain];

            let mut vectors = p.vectors.clone();
            if kind.is_embedding() {
                tracing::info!("Training team embeddings for {kind}");
                self.embed(&mut vectors, &mut rng)?;
            }

            let output = self.model_output(kind, data_path)?;
            let params = self.settings.model.baseline.params_for(kind);

            tracing::info!("Running {} on {} → '{}'", kind, domain, output.display());
            (self.models)(kind)
                .run(&p.splits, &vectors, &p.indexes, &output, &params, &self.settings.model.cmd)
                .with_context(|| format!("Model {kind} failed on {domain}"))?;
        }

        Ok(())
    }
}

// Collaborator overrides: vectorizers for further domains, other
// model or embedding implementations.
#[allow(dead_code)]
impl PipelineUseCase {
    /// Register (or replace) the vectorizer for a domain.
    pub fn with_vectorizer(mut self, domain: Domain, v: impl SparseVectorizer + 'static) -> Self {
        self.vectorizers.insert(domain, Box::new(v));
        self
    }

    pub fn with_models(mut self, f: impl Fn(ModelKind) -> Box<dyn TeamModel> + 'static) -> Self {
        self.models = Box::new(f);
        self
    }

    pub fn with_embedder(
        mut self,
        f: impl Fn(&SkillVectors, StdRng) -> Result<Box<dyn EmbeddingTrainer>> + 'static,
    ) -> Self {
        self.embedder = Box::new(f);
        self
    }
}
