// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs and traits describing teams and the people
// on them. No file I/O and no model code lives here.
//
//   traits.rs      - Member / Team capabilities
//   member.rs      - Author, the member variant of bibliographic data
//   publication.rs - Publication, the team variant of bibliographic
//                    data, plus field (skill) extraction

/// Member and Team capabilities shared by every domain variant
pub mod traits;

/// An author of a publication
pub mod member;

/// A publication and its derived skill fields
pub mod publication;

use std::rc::Rc;

use indexmap::IndexMap;

use member::Author;

/// Authors keyed by id, in first-seen order.
/// Values are shared with every team that lists the author.
pub type AuthorRegistry = IndexMap<String, Rc<Author>>;

/// Teams keyed by id, in first-seen order.
pub type TeamRegistry<T> = IndexMap<String, T>;
