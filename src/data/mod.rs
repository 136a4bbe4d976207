// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Raw dump to model-ready vectors:
//
//   raw dump (JSON lines)
//       │
//       ▼
//   RawPublication      → tolerant serde view of one record
//       │
//       ▼
//   PublicationReader   → eligibility, author dedup, registries,
//       │                 versioned cache
//       ▼
//   build_vectors       → index maps, sparse skill/member rows,
//       │                 optional outlier filter
//       ▼
//   splitter            → temporal or k-fold evaluation splits

/// Serde view of one raw dblp record
pub mod record;

/// Streams a dump into author and team registries
pub mod reader;

/// Train/test and k-fold index splits
pub mod splitter;

/// Team-to-vector conversion and the per-domain vectorizers
pub mod vectorizer;
