// ============================================================
// Layer 4 - Raw Input Records
// ============================================================
// The shape of one line of the bibliographic input file.
//
// Required: id, title, year, doc_type
// Defaulted: venue (none), references (empty), keywords (empty)
// Eligibility: fos and authors (absent → record is skipped)
//
// Source ids are numbers in some dumps and strings in others,
// so they are accepted as either and kept as strings. Venue is
// either a plain name or an object whose `raw` field is the
// name. Keywords are either one string (kept verbatim) or a list
// of strings.

use serde::{Deserialize, Deserializer};

use crate::domain::publication::{FieldOfStudy, Keywords, PublicationMeta};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Int(n)  => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

fn id_strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let ids: Option<Vec<RawId>> = Option::deserialize(d)?;
    Ok(ids.unwrap_or_default().into_iter().map(String::from).collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVenue {
    Name(String),
    Object {
        #[serde(default)]
        raw: Option<String>,
    },
}

fn venue_name<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let venue: Option<RawVenue> = Option::deserialize(d)?;
    Ok(venue.and_then(|v| match v {
        RawVenue::Name(name)       => Some(name),
        RawVenue::Object { raw }   => raw,
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKeywords {
    One(String),
    Many(Vec<String>),
}

fn keyword_list<'de, D: Deserializer<'de>>(d: D) -> Result<Keywords, D::Error> {
    let keywords: Option<RawKeywords> = Option::deserialize(d)?;
    Ok(match keywords {
        None                          => Keywords::default(),
        Some(RawKeywords::One(s))     => Keywords::Text(s),
        Some(RawKeywords::Many(list)) => Keywords::List(list),
    })
}

/// One author entry of a record.
#[derive(Debug, Deserialize)]
pub struct RawAuthor {
    #[serde(deserialize_with = "id_string")]
    pub id:   String,
    pub name: String,
    #[serde(default)]
    pub org:  Option<String>,
}

/// One line of the input file.
#[derive(Debug, Deserialize)]
pub struct RawPublication {
    #[serde(deserialize_with = "id_string")]
    pub id:       String,
    pub title:    String,
    pub year:     i32,
    pub doc_type: String,

    #[serde(default, deserialize_with = "venue_name")]
    pub venue:      Option<String>,
    #[serde(default, deserialize_with = "id_strings")]
    pub references: Vec<String>,
    #[serde(default, deserialize_with = "keyword_list")]
    pub keywords:   Keywords,

    #[serde(default)]
    pub fos:     Option<Vec<FieldOfStudy>>,
    #[serde(default)]
    pub authors: Option<Vec<RawAuthor>>,
}

impl RawPublication {
    /// Split the record into its metadata and author list.
    /// Callers check eligibility (fos and authors) beforehand.
    pub fn into_parts(self) -> (String, PublicationMeta, Vec<RawAuthor>) {
        let meta = PublicationMeta {
            title:      self.title,
            year:       self.year,
            doc_type:   self.doc_type,
            venue:      self.venue,
            references: self.references,
            fos:        self.fos.unwrap_or_default(),
            keywords:   self.keywords,
        };
        (self.id, meta, self.authors.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_ids() {
        let r: RawPublication = serde_json::from_str(
            r#"{"id": 7, "title": "t", "year": 2001, "doc_type": "", "references": [1, "x2"],
                "authors": [{"id": "a9", "name": "n"}]}"#,
        )
        .unwrap();

        assert_eq!(r.id, "7");
        assert_eq!(r.references, vec!["1", "x2"]);
        assert_eq!(r.authors.unwrap()[0].id, "a9");
        assert!(r.fos.is_none());
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let r: RawPublication =
            serde_json::from_str(r#"{"id": "p", "title": "t", "year": 1999, "doc_type": "book"}"#)
                .unwrap();

        assert!(r.venue.is_none());
        assert!(r.references.is_empty());
        assert!(r.keywords.is_empty());
        assert!(r.authors.is_none());
    }

    #[test]
    fn test_venue_object_and_keyword_string() {
        let r: RawPublication = serde_json::from_str(
            r#"{"id": "p", "title": "t", "year": 1999, "doc_type": "conference",
                "venue": {"raw": "icml", "id": 3}, "keywords": "deep  learning"}"#,
        )
        .unwrap();

        assert_eq!(r.venue.as_deref(), Some("icml"));
        assert_eq!(r.keywords, Keywords::Text("deep  learning".to_string()));
    }

    #[test]
    fn test_missing_required_field_fails() {
        let r = serde_json::from_str::<RawPublication>(r#"{"id": "p", "year": 1999, "doc_type": ""}"#);
        assert!(r.is_err());
    }
}
