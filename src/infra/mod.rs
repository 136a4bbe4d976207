// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
//   cache.rs       - versioned bincode files; a stale or
//                    corrupt cache reads as a miss
//   split_store.rs - writes split JSON next to model output

/// Versioned binary cache files
pub mod cache;

/// Split JSON persistence
pub mod split_store;
