// ============================================================
// Layer 2 - Run Settings
// ============================================================
// Every knob of a pipeline run that is not a command-line flag:
// data preparation, split ratios, and per-model
// hyperparameters. Defaults reproduce the published setup;
// a JSON file passed with -settings overrides any subset.
//
// The effective settings are written next to the outputs so a
// run can be reproduced from its output directory alone.
//
// Hyperparameter keys keep their short historical names
// (d, lr, b, e, ...) so existing settings files still load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::splitter::DEFAULT_TRAIN_RATIO;
use crate::domain::publication::KeywordExpansion;
use crate::ml::ModelKind;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for the single RNG threaded through a run
    pub seed:  u64,
    pub data:  DataSettings,
    pub model: ModelSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Root for entity caches and per-domain preprocessing output
    pub preprocessed_root: PathBuf,
    pub filter:            FilterSettings,
    pub keyword_expansion: KeywordExpansion,
    /// Stop ingesting after this many records
    pub cap:               Option<usize>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            preprocessed_root: PathBuf::from("./../data/preprocessed"),
            filter:            FilterSettings::default(),
            keyword_expansion: KeywordExpansion::default(),
            cap:               None,
        }
    }
}

/// Outlier removal applied when a run is filtered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Members on fewer teams than this are dropped
    pub min_nteam:     usize,
    /// Teams left with fewer members than this are dropped
    pub min_team_size: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self { min_nteam: 75, min_team_size: 3 }
    }
}

impl FilterSettings {
    /// Path suffix that tells filtered outputs apart:
    /// `.filtered.mt<min_nteam>.ts<min_team_size>`
    pub fn suffix(&self) -> String {
        format!(".filtered.mt{}.ts{}", self.min_nteam, self.min_team_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Share of teams in the training side of a split
    pub train_test_split: f64,
    /// Cross-validation folds for evaluation splits
    pub nfolds:           usize,
    pub baseline:         BaselineSettings,
    /// Steps every model runs (e.g. train, test, eval)
    pub cmd:              Vec<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            train_test_split: DEFAULT_TRAIN_RATIO,
            nfolds:           3,
            baseline:         BaselineSettings::default(),
            cmd:              vec!["train".into(), "test".into(), "eval".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomParams {
    /// batch size
    pub b: usize,
}

impl Default for RandomParams {
    fn default() -> Self {
        Self { b: 128 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralParams {
    /// hidden size
    pub d:  usize,
    /// learning rate
    pub lr: f64,
    /// batch size
    pub b:  usize,
    /// epochs
    pub e:  usize,
}

impl Default for NeuralParams {
    fn default() -> Self {
        Self { d: 100, lr: 0.001, b: 100, e: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianParams {
    #[serde(flatten)]
    pub nn: NeuralParams,
    /// weight samples per prediction
    pub s:  usize,
}

impl Default for BayesianParams {
    fn default() -> Self {
        Self { nn: NeuralParams::default(), s: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NmtParams {
    pub base_config: PathBuf,
}

impl Default for NmtParams {
    fn default() -> Self {
        Self { base_config: PathBuf::from("./mdl/nmt_config.yaml") }
    }
}

/// Team-to-vector embedding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingParams {
    /// dimensions
    pub d:  usize,
    /// context window
    pub w:  usize,
    /// training mode (1 = distributed memory, 0 = bag of words)
    pub dm: u8,
    /// epochs
    pub e:  usize,
}

impl Default for EmbeddingParams {
    fn default() -> Self {
        Self { d: 100, w: 1, dm: 1, e: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineSettings {
    pub random: RandomParams,
    pub fnn:    NeuralParams,
    pub bnn:    BayesianParams,
    pub nmt:    NmtParams,
    pub emb:    EmbeddingParams,
}

/// Hyperparameters handed to one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelParams {
    Random(RandomParams),
    Fnn(NeuralParams),
    Bnn(BayesianParams),
    Nmt(NmtParams),
}

impl BaselineSettings {
    /// Hyperparameters for a model; embedding variants share their
    /// base model's entry.
    pub fn params_for(&self, kind: ModelKind) -> ModelParams {
        match kind {
            ModelKind::Random                    => ModelParams::Random(self.random.clone()),
            ModelKind::Tfnn | ModelKind::TfnnEmb => ModelParams::Fnn(self.fnn.clone()),
            ModelKind::Tbnn | ModelKind::TbnnEmb => ModelParams::Bnn(self.bnn.clone()),
            ModelKind::Nmt                       => ModelParams::Nmt(self.nmt.clone()),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; missing keys keep defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read settings from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid settings in '{}'", path.display()))
    }

    /// Write the effective settings to `<dir>/settings.json`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let path = dir.join("settings.json");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write settings to '{}'", path.display()))?;

        tracing::debug!("Saved settings to '{}'", path.display());
        Ok(path)
    }
}
