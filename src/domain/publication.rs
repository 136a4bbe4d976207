// ============================================================
// Layer 3 - Publication Domain Type
// ============================================================
// A publication is the team variant for bibliographic data:
// its authors are the members and its fields of study are the
// skills. The skill list (`fields`) is computed once when the
// publication is built and never changes afterwards.
//
// Field extraction, in order:
//   1. every fos entry with a non-zero weight, spaces → '_'
//   2. keyword-derived entries, see KeywordExpansion
//
// Keywords keep the shape they had in the source (one string or a
// list) because the two expansion modes treat them differently.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::member::Author;
use super::traits::Team;

/// One field-of-study annotation with its relevance weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOfStudy {
    pub name: String,
    pub w:    f64,
}

/// Keywords as they appear in the source record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Keywords {
    /// One free-text string, kept verbatim
    Text(String),
    /// One entry per keyword
    List(Vec<String>),
}

impl Default for Keywords {
    fn default() -> Self {
        Keywords::List(Vec::new())
    }
}

impl Keywords {
    pub fn is_empty(&self) -> bool {
        match self {
            Keywords::Text(s)  => s.is_empty(),
            Keywords::List(l)  => l.is_empty(),
        }
    }
}

/// How keywords are turned into extra fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordExpansion {
    /// Every character of the normalised keyword string (list
    /// entries joined by one space) becomes a field. Matches the
    /// behaviour published results were produced with; almost
    /// certainly meant to be `Tokens`.
    #[default]
    Characters,

    /// Every keyword entry (or whitespace token of a keyword string)
    /// becomes one normalised field.
    Tokens,
}

impl KeywordExpansion {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordExpansion::Characters => "characters",
            KeywordExpansion::Tokens     => "tokens",
        }
    }
}

/// Everything a publication carries besides its id and authors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationMeta {
    pub title:      String,
    pub year:       i32,
    pub doc_type:   String,
    pub venue:      Option<String>,
    pub references: Vec<String>,
    pub fos:        Vec<FieldOfStudy>,
    pub keywords:   Keywords,
}

/// A publication team.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub id:      String,
    pub authors: Vec<Rc<Author>>,
    pub meta:    PublicationMeta,
    fields:      Vec<String>,
}

impl Publication {
    /// Build a publication and derive its fields.
    pub fn new(
        id:        impl Into<String>,
        authors:   Vec<Rc<Author>>,
        meta:      PublicationMeta,
        expansion: KeywordExpansion,
    ) -> Self {
        let fields = extract_fields(&meta.fos, &meta.keywords, expansion);
        Self { id: id.into(), authors, meta, fields }
    }

    /// Rebuild a publication whose fields were computed earlier
    /// (e.g. restored from the entity cache).
    pub fn from_parts(
        id:      String,
        authors: Vec<Rc<Author>>,
        meta:    PublicationMeta,
        fields:  Vec<String>,
    ) -> Self {
        Self { id, authors, meta, fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Team for Publication {
    type Member = Author;

    fn id(&self) -> &str {
        &self.id
    }

    fn members(&self) -> &[Rc<Author>] {
        &self.authors
    }

    fn skills(&self) -> &[String] {
        &self.fields
    }
}

/// Replace spaces with underscores so multi-word labels become
/// single vocabulary entries.
pub fn normalise_label(label: &str) -> String {
    label.replace(' ', "_")
}

/// True when at least one fos entry carries a non-zero weight,
/// i.e. the publication would end up with at least one skill.
pub fn has_weighted_fos(fos: &[FieldOfStudy]) -> bool {
    fos.iter().any(|f| f.w != 0.0)
}

/// Derive the skill fields of one publication.
pub fn extract_fields(
    fos:       &[FieldOfStudy],
    keywords:  &Keywords,
    expansion: KeywordExpansion,
) -> Vec<String> {
    let mut fields: Vec<String> = fos
        .iter()
        .filter(|f| f.w != 0.0)
        .map(|f| normalise_label(&f.name))
        .collect();

    if keywords.is_empty() {
        return fields;
    }

    match expansion {
        KeywordExpansion::Characters => {
            let joined = match keywords {
                Keywords::Text(s) => normalise_label(s),
                Keywords::List(l) => normalise_label(&l.join(" ")),
            };
            fields.extend(joined.chars().map(String::from));
        }
        KeywordExpansion::Tokens => match keywords {
            Keywords::Text(s) => fields.extend(s.split_whitespace().map(normalise_label)),
            Keywords::List(l) => fields.extend(
                l.iter()
                    .map(|k| normalise_label(k.trim()))
                    .filter(|k| !k.is_empty()),
            ),
        },
    }

    fields
}
