// ============================================================
// Layer 1 - CLI Argument Values
// ============================================================
// Value types for the command-line flags and their conversion
// into application types. The application layer never sees
// clap types.
//
// The historical flag spelling is single-dash long flags
// (`-data`, `-model`, ...). clap only parses single-character
// short flags, so those spellings are rewritten to their `--`
// form before parsing.

use clap::ValueEnum;
use std::ffi::OsString;

use crate::application::pipeline_use_case::SplitStrategy;
use crate::data::vectorizer::Domain;
use crate::ml::ModelKind;

/// Long flags that may be written with a single dash.
const SINGLE_DASH_FLAGS: &[&str] = &[
    "-data", "-domain", "-model", "-filter", "-output", "-split", "-seed", "-cap", "-settings",
];

/// Rewrite `-data` style flags to `--data`; everything else
/// passes through untouched.
pub fn normalise_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg: OsString| match arg.to_str() {
            Some(s) if SINGLE_DASH_FLAGS.contains(&s) => OsString::from(format!("-{s}")),
            Some(s) => match s.split_once('=') {
                Some((flag, value)) if SINGLE_DASH_FLAGS.contains(&flag) => {
                    OsString::from(format!("-{flag}={value}"))
                }
                _ => arg,
            },
            None => arg,
        })
        .collect()
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainArg {
    /// DBLP publications
    Dblp,
    /// IMDb movies
    Imdb,
    /// USPTO patents
    Uspt,
}

impl From<DomainArg> for Domain {
    fn from(d: DomainArg) -> Self {
        match d {
            DomainArg::Dblp => Domain::Dblp,
            DomainArg::Imdb => Domain::Imdb,
            DomainArg::Uspt => Domain::Uspt,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelArg {
    /// Random baseline
    Random,
    /// Feed-forward network
    Tfnn,
    /// Bayesian network
    Tbnn,
    /// Feed-forward network on team embeddings
    #[value(name = "tfnn_emb")]
    TfnnEmb,
    /// Bayesian network on team embeddings
    #[value(name = "tbnn_emb")]
    TbnnEmb,
    /// Neural machine translation baseline
    Nmt,
}

impl From<ModelArg> for ModelKind {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Random  => ModelKind::Random,
            ModelArg::Tfnn    => ModelKind::Tfnn,
            ModelArg::Tbnn    => ModelKind::Tbnn,
            ModelArg::TfnnEmb => ModelKind::TfnnEmb,
            ModelArg::TbnnEmb => ModelKind::TbnnEmb,
            ModelArg::Nmt     => ModelKind::Nmt,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitArg {
    /// Order-preserving train/test split
    Temporal,
    /// Shuffled test split with k-fold cross-validation
    Eval,
}

impl From<SplitArg> for SplitStrategy {
    fn from(s: SplitArg) -> Self {
        match s {
            SplitArg::Temporal => SplitStrategy::Temporal,
            SplitArg::Eval     => SplitStrategy::Evaluation,
        }
    }
}
