// ============================================================
// Layer 3 - Core Traits
// ============================================================
// Every dataset domain (publications, movies, patents) produces
// teams that have members and skills. The vectorizer and the
// orchestrator only ever see these two traits, so a new domain
// plugs in by implementing them for its own record types.

use std::rc::Rc;

// ─── Member ───────────────────────────────────────────────────────────────────
/// Anyone who can sit on a team.
///
/// Implementations:
///   - Author → a publication author with an organisation
pub trait Member {
    /// Stable identifier from the source data
    fn id(&self) -> &str;

    /// Normalised display name
    fn name(&self) -> &str;

    /// Key used for the member index: `<id>_<name>`
    fn index_key(&self) -> String {
        format!("{}_{}", self.id(), self.name())
    }
}

// ─── Team ─────────────────────────────────────────────────────────────────────
/// A group of members who produced one work, described by the
/// skills (fields) the work covers.
///
/// Implementations:
///   - Publication → authors + fields of study
pub trait Team {
    /// The member type on this kind of team
    type Member: Member;

    /// Stable identifier from the source data
    fn id(&self) -> &str;

    /// Members in source order, shared with the member registry
    fn members(&self) -> &[Rc<Self::Member>];

    /// Skill vocabulary of the team
    fn skills(&self) -> &[String];
}
