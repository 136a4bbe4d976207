// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands a RunConfig plus
// Settings to the pipeline. All work is delegated to Layer 2.
//
// Example:
//   team-formation -data ../data/raw/dblp/toy.dblp.v12.json \
//                  -domain dblp -model random tfnn tfnn_emb
//
// Missing required flags make clap print usage and exit with a
// non-zero status before anything else runs.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::application::{
    pipeline_use_case::{PipelineUseCase, RunConfig},
    settings::Settings,
};
use commands::{DomainArg, ModelArg, SplitArg};

#[derive(Parser, Debug)]
#[command(
    name = "team-formation",
    version,
    about = "Prepare team-formation datasets and run models over every (dataset, model) pair."
)]
pub struct Cli {
    /// Dataset paths, one per domain (e.g. -data ../data/raw/dblp/toy.dblp.v12.json)
    #[arg(long = "data", visible_alias = "data-list", num_args = 1.., required = true)]
    pub data: Vec<PathBuf>,

    /// Domain of each dataset, in the same order as -data
    #[arg(long = "domain", visible_alias = "domain-list", value_enum, num_args = 1.., required = true)]
    pub domain: Vec<DomainArg>,

    /// Models to run on every dataset
    #[arg(long = "model", visible_alias = "model-list", value_enum, num_args = 1.., required = true)]
    pub model: Vec<ModelArg>,

    /// Remove outlier members and teams (0 or 1)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub filter: u8,

    /// Output root for model results
    #[arg(long, default_value = "./../output/")]
    pub output: PathBuf,

    /// Split handed to the models
    #[arg(long, value_enum, default_value_t = SplitArg::Temporal)]
    pub split: SplitArg,

    /// JSON settings file; keys it leaves out keep their defaults
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Seed for every random step (overrides the settings file)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop ingesting after this many records
    #[arg(long)]
    pub cap: Option<usize>,
}

impl Cli {
    /// Parse the process arguments, accepting single-dash long flags.
    pub fn parse_args() -> Self {
        Self::parse_from(commands::normalise_args(std::env::args_os()))
    }

    /// Settings from the file (or defaults) with flag overrides.
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => Settings::load(path)?,
            None       => Settings::default(),
        };
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if self.cap.is_some() {
            settings.data.cap = self.cap;
        }
        Ok(settings)
    }

    fn run_config(&self) -> RunConfig {
        RunConfig {
            data:    self.data.clone(),
            domains: self.domain.iter().map(|&d| d.into()).collect(),
            models:  self.model.iter().map(|&m| m.into()).collect(),
            filter:  self.filter == 1,
            output:  self.output.clone(),
            split:   self.split.into(),
        }
    }

    pub fn run(self) -> Result<()> {
        let settings = self.settings()?;
        let config   = self.run_config();

        tracing::info!(
            "Running {} model(s) on {} dataset(s), output '{}'",
            config.models.len(),
            config.data.len(),
            config.output.display()
        );

        PipelineUseCase::new(config, settings).execute()?;

        println!("Pipeline complete.");
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline_use_case::SplitStrategy;
    use crate::data::vectorizer::Domain;
    use crate::ml::ModelKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(commands::normalise_args(args.iter().copied()))
    }

    #[test]
    fn test_historical_flags_parse() {
        let cli = parse(&[
            "team-formation", "-data", "a.json", "b.tsv", "-domain", "dblp", "imdb",
            "-model", "random", "tfnn_emb", "-filter", "1",
        ])
        .unwrap();

        let cfg = cli.run_config();
        assert_eq!(cfg.data, vec![PathBuf::from("a.json"), PathBuf::from("b.tsv")]);
        assert_eq!(cfg.domains, vec![Domain::Dblp, Domain::Imdb]);
        assert_eq!(cfg.models, vec![ModelKind::Random, ModelKind::TfnnEmb]);
        assert!(cfg.filter);
        assert_eq!(cfg.output, PathBuf::from("./../output/"));
        assert_eq!(cfg.split, SplitStrategy::Temporal);
    }

    #[test]
    fn test_long_aliases_parse() {
        let cli = parse(&[
            "team-formation", "--data-list", "a.json", "--domain-list", "dblp",
            "--model-list", "nmt", "--split", "eval", "--seed", "3",
        ])
        .unwrap();

        assert_eq!(cli.run_config().split, SplitStrategy::Evaluation);
        assert_eq!(cli.settings().unwrap().seed, 3);
    }

    #[test]
    fn test_missing_required_flag_is_a_usage_error() {
        let err = parse(&["team-formation", "-data", "a.json", "-domain", "dblp"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_unknown_model_and_bad_filter_are_rejected() {
        assert!(parse(&["t", "-data", "a", "-domain", "dblp", "-model", "fnn"]).is_err());
        assert!(parse(&["t", "-data", "a", "-domain", "dblp", "-model", "nmt", "-filter", "2"]).is_err());
    }
}
