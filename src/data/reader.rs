// ============================================================
// Layer 4 - Publication Reader (Ingestor)
// ============================================================
// Streams a line-delimited JSON dump into an author registry
// and a team registry, memoised in a versioned cache file.
//
//   1. Derive the cache path from the input file name; the cache
//      header carries the keyword expansion mode, so a cache built
//      in another mode is a miss
//   2. Cache hit  → return the cached registries
//      Cache miss → stream the file:
//        - skip line 1 (header / record count)
//        - lower-case, strip leading commas, parse JSON
//        - skip records without fos or authors (silently)
//        - dedup authors by id, first sighting wins
//        - insert the publication keyed by id
//        - log and skip lines that fail to parse
//   3. Write the cache before returning
//
// Memory stays bounded by the registries themselves: the input
// is read one line at a time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    rc::Rc,
    time::Instant,
};

use crate::data::record::RawPublication;
use crate::domain::{
    member::Author,
    publication::{has_weighted_fos, normalise_label, KeywordExpansion, Publication, PublicationMeta},
    AuthorRegistry, TeamRegistry,
};
use crate::infra::cache::VersionedCache;

const CACHE_SCHEMA: &str = "publication-teams";
const CACHE_VERSION: u32 = 1;
const CACHE_FILE: &str = "teams.bin";

/// Log progress after this many ingested records.
const PROGRESS_EVERY: usize = 10_000;

/// Author and team registries produced by one ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Registries {
    pub authors: AuthorRegistry,
    pub teams:   TeamRegistry<Publication>,
}

// ─── Cache snapshot ───────────────────────────────────────────────────────────
// Teams reference authors by id on disk; sharing is restored on
// load by resolving ids against the author registry.
#[derive(Serialize, Deserialize)]
struct TeamSnapshot {
    id:         String,
    author_ids: Vec<String>,
    meta:       PublicationMeta,
    fields:     Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct RegistrySnapshot {
    authors: Vec<Author>,
    teams:   Vec<TeamSnapshot>,
}

impl From<&Registries> for RegistrySnapshot {
    fn from(r: &Registries) -> Self {
        Self {
            authors: r.authors.values().map(|a| Author::clone(a)).collect(),
            teams:   r
                .teams
                .values()
                .map(|t| TeamSnapshot {
                    id:         t.id.clone(),
                    author_ids: t.authors.iter().map(|a| a.id.clone()).collect(),
                    meta:       t.meta.clone(),
                    fields:     t.fields().to_vec(),
                })
                .collect(),
        }
    }
}

impl RegistrySnapshot {
    /// Relink teams to shared authors. `None` when a team names an
    /// author the snapshot does not contain.
    fn restore(self) -> Option<Registries> {
        let authors: AuthorRegistry = self
            .authors
            .into_iter()
            .map(|a| (a.id.clone(), Rc::new(a)))
            .collect();

        let mut teams = TeamRegistry::with_capacity(self.teams.len());
        for t in self.teams {
            let members = t
                .author_ids
                .iter()
                .map(|id| authors.get(id).cloned())
                .collect::<Option<Vec<_>>>()?;
            teams.insert(t.id.clone(), Publication::from_parts(t.id, members, t.meta, t.fields));
        }

        Some(Registries { authors, teams })
    }
}

// ─── Reader ───────────────────────────────────────────────────────────────────
/// Reads publication dumps, caching results under `cache_root`.
pub struct PublicationReader {
    cache_root: PathBuf,
    expansion:  KeywordExpansion,
}

impl PublicationReader {
    pub fn new(cache_root: impl Into<PathBuf>, expansion: KeywordExpansion) -> Self {
        Self { cache_root: cache_root.into(), expansion }
    }

    /// Cache file for an input: `<root>/<stem>/teams.bin`.
    pub fn cache_path(&self, data_path: &Path) -> PathBuf {
        self.cache_root.join(cache_stem(data_path)).join(CACHE_FILE)
    }

    fn cache(&self, data_path: &Path) -> VersionedCache {
        let schema = format!("{CACHE_SCHEMA}:{}", self.expansion.as_str());
        VersionedCache::new(self.cache_path(data_path), schema, CACHE_VERSION)
    }

    /// Load registries for `data_path`, from cache when possible.
    /// `cap` limits the number of ingested records.
    pub fn read(&self, data_path: &Path, cap: Option<usize>) -> Result<Registries> {
        let cache = self.cache(data_path);
        let start = Instant::now();

        match cache.load::<RegistrySnapshot>() {
            Ok(snapshot) => match snapshot.restore() {
                Some(registries) => {
                    tracing::info!(
                        "Loaded {} teams and {} authors from cache in {:.2?}",
                        registries.teams.len(),
                        registries.authors.len(),
                        start.elapsed()
                    );
                    return Ok(registries);
                }
                None => tracing::warn!(
                    "Cache '{}' references unknown authors, rebuilding",
                    cache.path().display()
                ),
            },
            Err(e) => tracing::info!("Cache miss ({e}), ingesting '{}'", data_path.display()),
        }

        let registries = self.ingest(data_path, cap)?;
        tracing::info!(
            "Ingested {} teams and {} authors in {:.2?}",
            registries.teams.len(),
            registries.authors.len(),
            start.elapsed()
        );

        let write_start = Instant::now();
        cache.store(&RegistrySnapshot::from(&registries))?;
        tracing::info!("Cached registries in {:.2?}", write_start.elapsed());

        Ok(registries)
    }

    /// Stream the input file into fresh registries.
    fn ingest(&self, data_path: &Path, cap: Option<usize>) -> Result<Registries> {
        let file = File::open(data_path)
            .with_context(|| format!("Cannot open input '{}'", data_path.display()))?;
        let mut reader = BufReader::new(file);

        let mut registries = Registries {
            authors: AuthorRegistry::new(),
            teams:   TeamRegistry::new(),
        };
        let start = Instant::now();
        let mut buf = Vec::new();
        let mut line_no = 0usize;
        let mut counter = 0usize;

        loop {
            if cap.is_some_and(|cap| counter >= cap) {
                break;
            }

            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .with_context(|| format!("Cannot read '{}'", data_path.display()))?;
            if read == 0 {
                break;
            }
            line_no += 1;

            // first line is a header / record count
            if line_no == 1 {
                continue;
            }

            match self.ingest_line(&buf, &mut registries) {
                Ok(true) => {
                    counter += 1;
                    if counter % PROGRESS_EVERY == 0 {
                        tracing::info!(
                            "{} records loaded, {:.2?} elapsed",
                            counter,
                            start.elapsed()
                        );
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        "Skipping line {} of '{}': `{}`\n{:?}",
                        line_no,
                        data_path.display(),
                        String::from_utf8_lossy(&buf).trim_end(),
                        e
                    );
                }
            }
        }

        Ok(registries)
    }

    /// Parse one line into the registries.
    /// Ok(true) when a team was added, Ok(false) when the line was
    /// blank or the record is ineligible.
    fn ingest_line(&self, bytes: &[u8], registries: &mut Registries) -> Result<bool> {
        let line = std::str::from_utf8(bytes).context("Line is not valid UTF-8")?;
        if line.trim().is_empty() {
            return Ok(false);
        }

        let lowered = line.to_lowercase();
        let record: RawPublication = serde_json::from_str(lowered.trim_start_matches(','))
            .context("Cannot parse record")?;

        // a team must have skills and members
        let eligible = record.fos.as_deref().is_some_and(has_weighted_fos)
            && record.authors.as_ref().is_some_and(|a| !a.is_empty());
        if !eligible {
            return Ok(false);
        }

        let (id, meta, raw_authors) = record.into_parts();

        let members: Vec<Rc<Author>> = raw_authors
            .into_iter()
            .map(|raw| {
                registries
                    .authors
                    .entry(raw.id.clone())
                    .or_insert_with(|| {
                        let org = raw.org.as_deref().map(normalise_label).unwrap_or_default();
                        Rc::new(Author::new(raw.id, normalise_label(&raw.name), org))
                    })
                    .clone()
            })
            .collect();

        let team = Publication::new(id.clone(), members, meta, self.expansion);
        if registries.teams.insert(id, team).is_some() {
            tracing::debug!("Duplicate team id replaced an earlier record");
        }

        Ok(true)
    }
}

/// File name without its last extension, remaining dots → '_'.
/// `toy.dblp.v12.json` → `toy_dblp_v12`
pub fn cache_stem(data_path: &Path) -> String {
    let name = data_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.replace('.', "_"),
        _ => name,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::fs;
    use tracing_test::traced_test;

    const DUMP: &str = r#"3
{"id": 1, "title": "First", "year": 2001, "doc_type": "journal", "authors": [{"id": "a1", "name": "Ada Lovelace", "org": "Uni X"}, {"id": "a2", "name": "Alan Turing"}], "fos": [{"name": "Machine Learning", "w": 0.5}, {"name": "Biology", "w": 0}]}
,{"id": 2, "title": "Second", "year": 2002, "doc_type": "conference", "authors": [{"id": "a1", "name": "Ada L", "org": "Uni Y"}, {"id": "a3", "name": "Grace Hopper"}], "fos": [{"name": "Compilers", "w": 0.9}]}
{"id": 3, "title": "No skills", "year": 2003, "doc_type": "journal", "authors": [{"id": "a4", "name": "Nobody"}]}
{"id": 4, "title": "No authors", "year": 2004, "doc_type": "journal", "fos": [{"name": "Physics", "w": 0.4}]}
{"id": 5, "title": "Zero weights", "year": 2005, "doc_type": "journal", "authors": [{"id": "a5", "name": "Zed"}], "fos": [{"name": "Physics", "w": 0.0}]}
{"id": 6, "title": "Empty authors", "year": 2006, "doc_type": "journal", "authors": [], "fos": [{"name": "Physics", "w": 0.4}]}
{"id": 7, "year": 2007, "doc_type": "journal", "authors": [{"id": "a6", "name": "Missing Title"}], "fos": [{"name": "Physics", "w": 0.4}]}
this is not json
{"id": 8, "title": "Third", "year": 2008, "doc_type": "book", "authors": [{"id": "a3", "name": "Grace Hopper"}], "fos": [{"name": "Compilers", "w": 0.2}]}
]
"#;

    fn write_dump(dir: &Path) -> PathBuf {
        let path = dir.join("toy.dblp.v12.json");
        fs::write(&path, DUMP).unwrap();
        path
    }

    fn reader(dir: &Path) -> PublicationReader {
        PublicationReader::new(dir.join("preprocessed"), KeywordExpansion::Characters)
    }

    #[test]
    fn test_cache_stem() {
        assert_eq!(cache_stem(Path::new("../data/raw/toy.dblp.v12.json")), "toy_dblp_v12");
        assert_eq!(cache_stem(Path::new("plain.json")), "plain");
        assert_eq!(cache_stem(Path::new("noext")), "noext");
    }

    #[test]
    fn test_only_eligible_records_are_admitted() {
        let dir  = tempfile::tempdir().unwrap();
        let data = write_dump(dir.path());
        let r    = reader(dir.path()).read(&data, None).unwrap();

        let ids: Vec<&str> = r.teams.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["1", "2", "8"]);
    }

    #[test]
    fn test_authors_are_deduplicated_first_seen_wins() {
        let dir  = tempfile::tempdir().unwrap();
        let data = write_dump(dir.path());
        let r    = reader(dir.path()).read(&data, None).unwrap();

        // a4, a5, a6 only appear on ineligible or malformed records
        let ids: HashSet<&str> = r.authors.keys().map(String::as_str).collect();
        assert_eq!(ids, HashSet::from(["a1", "a2", "a3"]));

        let first  = &r.teams["1"].authors[0];
        let second = &r.teams["2"].authors[0];
        assert!(Rc::ptr_eq(first, second));
        assert_eq!(first.org, "uni_x");
        assert_eq!(first.name, "ada_lovelace");

        // a2 has no org
        assert_eq!(r.teams["1"].authors[1].org, "");
    }

    #[test]
    fn test_fields_are_normalised_non_zero_fos() {
        let dir  = tempfile::tempdir().unwrap();
        let data = write_dump(dir.path());
        let r    = reader(dir.path()).read(&data, None).unwrap();

        assert_eq!(r.teams["1"].fields(), ["machine_learning".to_string()]);
        assert_eq!(r.teams["1"].meta.title, "first");
    }

    #[test]
    fn test_cap_limits_ingested_records() {
        let dir  = tempfile::tempdir().unwrap();
        let data = write_dump(dir.path());
        let r    = reader(dir.path()).read(&data, Some(2)).unwrap();

        assert_eq!(r.teams.len(), 2);
        assert_eq!(r.authors.len(), 3);
    }

    #[test]
    fn test_cache_round_trip_keeps_sharing() {
        let dir    = tempfile::tempdir().unwrap();
        let data   = write_dump(dir.path());
        let reader = reader(dir.path());

        let fresh = reader.read(&data, None).unwrap();
        assert!(reader.cache_path(&data).ends_with("toy_dblp_v12/teams.bin"));
        assert!(reader.cache_path(&data).exists());

        // the input is gone, so this must come from the cache
        fs::remove_file(&data).unwrap();
        let cached = reader.read(&data, None).unwrap();

        assert_eq!(cached, fresh);
        assert!(Rc::ptr_eq(&cached.teams["2"].authors[1], &cached.teams["8"].authors[0]));
        assert!(Rc::ptr_eq(&cached.teams["2"].authors[1], &cached.authors["a3"]));
    }

    #[test]
    fn test_reingest_without_cache_is_identical() {
        let dir    = tempfile::tempdir().unwrap();
        let data   = write_dump(dir.path());
        let reader = reader(dir.path());

        let a = reader.read(&data, None).unwrap();
        fs::remove_file(reader.cache_path(&data)).unwrap();
        let b = reader.read(&data, None).unwrap();

        assert_eq!(a.teams.keys().collect::<Vec<_>>(), b.teams.keys().collect::<Vec<_>>());
        for (id, team) in &a.teams {
            assert_eq!(team.fields(), b.teams[id].fields());
        }
    }

    #[test]
    fn test_corrupt_cache_is_rebuilt() {
        let dir    = tempfile::tempdir().unwrap();
        let data   = write_dump(dir.path());
        let reader = reader(dir.path());

        let cache = reader.cache_path(&data);
        fs::create_dir_all(cache.parent().unwrap()).unwrap();
        fs::write(&cache, b"not a cache").unwrap();

        let r = reader.read(&data, None).unwrap();
        assert_eq!(r.teams.len(), 3);
    }

    #[test]
    fn test_switching_keyword_expansion_rebuilds_cache() {
        let dir  = tempfile::tempdir().unwrap();
        let data = dir.path().join("kw.json");
        fs::write(
            &data,
            "1\n{\"id\": 1, \"title\": \"t\", \"year\": 2000, \"doc_type\": \"j\", \"keywords\": [\"deep learning\"], \"authors\": [{\"id\": \"a\", \"name\": \"x\"}], \"fos\": [{\"name\": \"ml\", \"w\": 1}]}\n",
        )
        .unwrap();
        let root = dir.path().join("preprocessed");

        let chars = PublicationReader::new(&root, KeywordExpansion::Characters).read(&data, None).unwrap();
        assert_eq!(chars.teams["1"].fields()[1], "d");

        // the characters cache is still on disk here
        let tokens = PublicationReader::new(&root, KeywordExpansion::Tokens);
        let via_cache = tokens.read(&data, None).unwrap();
        assert_eq!(via_cache.teams["1"].fields(), ["ml".to_string(), "deep_learning".to_string()]);

        fs::remove_file(tokens.cache_path(&data)).unwrap();
        let fresh = tokens.read(&data, None).unwrap();
        assert_eq!(via_cache, fresh);

        // and the tokens cache is now served back in tokens mode
        let again = tokens.read(&data, None).unwrap();
        assert_eq!(again, fresh);
    }

    #[traced_test]
    #[test]
    fn test_ineligible_records_are_skipped_silently() {
        let dir  = tempfile::tempdir().unwrap();
        let data = write_dump(dir.path());
        reader(dir.path()).read(&data, None).unwrap();

        // malformed lines are reported with the offending text
        assert!(logs_contain("this is not json"));
        assert!(logs_contain("missing field `title`"));

        logs_assert(|lines: &[&str]| {
            let errors: Vec<&str> = lines.iter().copied().filter(|l| l.contains("ERROR")).collect();
            for title in ["No skills", "No authors", "Zero weights", "Empty authors"] {
                if errors.iter().any(|l| l.contains(title)) {
                    return Err(format!("record '{title}' should not be logged"));
                }
            }
            // id 7 (no title), the non-JSON line and the closing bracket
            match errors.iter().filter(|l| l.contains("Skipping line")).count() {
                3 => Ok(()),
                n => Err(format!("expected 3 skipped lines, got {n}")),
            }
        });
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = reader(dir.path()).read(&dir.path().join("absent.json"), None);
        assert!(err.is_err());
    }
}
