// ============================================================
// Layer 4 - Sparse Team Vectorizer
// ============================================================
// Turns a team registry into the matrices models train on:
//
//   ids    - row → team id
//   skill  - row → indices of the team's skills
//   member - row → indices of the team's members
//
// plus the index maps between labels and column numbers:
//
//   s2i / i2s  skills
//   c2i / i2c  members (candidates), keyed "<id>_<name>"
//   t2i / i2t  teams
//
// Indices are assigned in order of first appearance, and rows
// follow registry order, which follows the input file. The
// temporal split depends on that order.
//
// With filtering on, outliers are removed before indexing:
//   1. members on fewer than min_nteam teams are dropped
//   2. teams left with fewer than min_team_size members are dropped
//
// Results are cached under the preprocessing output directory.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
};

use crate::application::settings::{DataSettings, FilterSettings};
use crate::data::reader::PublicationReader;
use crate::domain::traits::{Member, Team};
use crate::infra::{cache::VersionedCache, split_store::to_json_pretty};

const VECTORS_SCHEMA: &str = "team-vectors";
const VECTORS_VERSION: u32 = 1;

/// Dataset domains the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    /// DBLP publications
    Dblp,
    /// IMDb movies
    Imdb,
    /// USPTO patents
    Uspt,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Dblp => "dblp",
            Domain::Imdb => "imdb",
            Domain::Uspt => "uspt",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows of column indices; every stored value is 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseRows {
    pub n_cols: usize,
    pub rows:   Vec<Vec<usize>>,
}

impl SparseRows {
    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// Skill representation of each team: one-hot rows until an
/// embedding replaces them with dense document vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillVectors {
    Sparse(SparseRows),
    Dense(Vec<Vec<f32>>),
}

impl SkillVectors {
    /// Width of a row: vocabulary size or embedding dimensions.
    pub fn n_cols(&self) -> usize {
        match self {
            SkillVectors::Sparse(s) => s.n_cols,
            SkillVectors::Dense(d)  => d.first().map_or(0, Vec::len),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamVectors {
    pub ids:    Vec<String>,
    pub skill:  SkillVectors,
    pub member: SparseRows,
}

impl TeamVectors {
    pub fn n_teams(&self) -> usize {
        self.ids.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamIndexes {
    pub s2i: IndexMap<String, usize>,
    pub i2s: Vec<String>,
    pub c2i: IndexMap<String, usize>,
    pub i2c: Vec<String>,
    pub t2i: IndexMap<String, usize>,
    pub i2t: Vec<String>,
}

/// Look up `label`, assigning the next index on first sight.
fn intern(map: &mut IndexMap<String, usize>, rev: &mut Vec<String>, label: &str) -> usize {
    if let Some(&i) = map.get(label) {
        return i;
    }
    let i = rev.len();
    map.insert(label.to_string(), i);
    rev.push(label.to_string());
    i
}

// ─── SparseVectorizer ─────────────────────────────────────────────────────────
/// Per-domain vector generation.
///
/// Implementations:
///   - PublicationVectorizer → DBLP dumps
pub trait SparseVectorizer {
    fn generate_sparse_vectors(
        &self,
        raw_path:    &Path,
        prep_output: &Path,
        filter:      bool,
        settings:    &DataSettings,
    ) -> Result<(TeamVectors, TeamIndexes)>;
}

/// Build vectors and indexes for any kind of team.
pub fn build_vectors<'a, T, I>(teams: I, filter: Option<&FilterSettings>) -> (TeamVectors, TeamIndexes)
where
    T: Team + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let teams: Vec<&T> = teams.into_iter().collect();

    // member key → number of teams it appears on
    let kept_members: Option<BTreeSet<String>> = filter.map(|f| {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for team in &teams {
            for m in team.members() {
                *counts.entry(m.index_key()).or_insert(0) += 1;
            }
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n >= f.min_nteam)
            .map(|(k, _)| k)
            .collect()
    });

    let mut idx = TeamIndexes::default();
    let mut ids = Vec::new();
    let mut skill_rows: Vec<Vec<usize>> = Vec::new();
    let mut member_rows: Vec<Vec<usize>> = Vec::new();

    for team in teams {
        let members: Vec<String> = team
            .members()
            .iter()
            .map(|m| m.index_key())
            .filter(|k| kept_members.as_ref().map_or(true, |kept| kept.contains(k)))
            .collect();

        if let Some(f) = filter {
            if members.len() < f.min_team_size {
                continue;
            }
        }
        if members.is_empty() || team.skills().is_empty() {
            continue;
        }

        intern(&mut idx.t2i, &mut idx.i2t, team.id());
        ids.push(team.id().to_string());

        let skills: BTreeSet<usize> = team
            .skills()
            .iter()
            .map(|s| intern(&mut idx.s2i, &mut idx.i2s, s))
            .collect();
        skill_rows.push(skills.into_iter().collect());

        let cols: BTreeSet<usize> = members
            .iter()
            .map(|m| intern(&mut idx.c2i, &mut idx.i2c, m))
            .collect();
        member_rows.push(cols.into_iter().collect());
    }

    let vectors = TeamVectors {
        ids,
        skill:  SkillVectors::Sparse(SparseRows { n_cols: idx.i2s.len(), rows: skill_rows }),
        member: SparseRows { n_cols: idx.i2c.len(), rows: member_rows },
    };
    (vectors, idx)
}

/// Vectors and indexes cached under one preprocessing directory.
pub struct VectorStore {
    dir:    PathBuf,
    schema: String,
}

impl VectorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), schema: VECTORS_SCHEMA.to_string() }
    }

    /// Qualify the cache schema with a setting the vectors depend
    /// on; a cache written under another tag is a miss.
    pub fn tagged(mut self, tag: &str) -> Self {
        self.schema = format!("{VECTORS_SCHEMA}:{tag}");
        self
    }

    fn vectors_cache(&self) -> VersionedCache {
        VersionedCache::new(self.dir.join("teamsvecs.bin"), self.schema.as_str(), VECTORS_VERSION)
    }

    fn indexes_path(&self) -> PathBuf {
        self.dir.join("indexes.json")
    }

    /// Cached vectors and indexes, or `None` when either is unusable.
    pub fn load(&self) -> Option<(TeamVectors, TeamIndexes)> {
        let vectors = match self.vectors_cache().load::<TeamVectors>() {
            Ok(v) => v,
            Err(e) => {
                tracing::info!("Vector cache miss ({e})");
                return None;
            }
        };

        let indexes = fs::read(self.indexes_path())
            .ok()
            .and_then(|bytes| serde_json::from_slice::<TeamIndexes>(&bytes).ok());
        match indexes {
            Some(indexes) if indexes.i2t.len() == vectors.n_teams() => Some((vectors, indexes)),
            _ => {
                tracing::info!("Index cache in '{}' is missing or stale", self.dir.display());
                None
            }
        }
    }

    pub fn save(&self, vectors: &TeamVectors, indexes: &TeamIndexes) -> Result<()> {
        self.vectors_cache().store(vectors)?;
        let path = self.indexes_path();
        fs::write(&path, to_json_pretty(indexes)?)
            .with_context(|| format!("Cannot write indexes to '{}'", path.display()))?;
        Ok(())
    }
}

// ─── PublicationVectorizer ────────────────────────────────────────────────────
/// Vectorizer for DBLP publication dumps.
pub struct PublicationVectorizer;

impl SparseVectorizer for PublicationVectorizer {
    fn generate_sparse_vectors(
        &self,
        raw_path:    &Path,
        prep_output: &Path,
        filter:      bool,
        settings:    &DataSettings,
    ) -> Result<(TeamVectors, TeamIndexes)> {
        let store = VectorStore::new(prep_output).tagged(settings.keyword_expansion.as_str());
        if let Some(cached) = store.load() {
            tracing::info!("Loaded team vectors from '{}'", prep_output.display());
            return Ok(cached);
        }

        let reader = PublicationReader::new(&settings.preprocessed_root, settings.keyword_expansion);
        let registries = reader.read(raw_path, settings.cap)?;

        let (vectors, indexes) =
            build_vectors(registries.teams.values(), filter.then_some(&settings.filter));
        tracing::info!(
            "Vectorised {} teams: {} skills, {} members, {} memberships{}",
            vectors.n_teams(),
            indexes.i2s.len(),
            indexes.i2c.len(),
            vectors.member.nnz(),
            if filter { " (filtered)" } else { "" }
        );

        store.save(&vectors, &indexes)?;
        Ok((vectors, indexes))
    }
}
