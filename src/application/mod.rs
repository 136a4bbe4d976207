// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers for one run:
//
//   validate inputs → save settings → seed RNG
//     → per dataset: vectorise once, split once
//     → per (dataset, model): optional embedding, run model
//
// No parsing, vector math or model code lives here; this layer
// only decides what runs, in which order, and where output goes.

/// Run settings, loaded from JSON with defaults for every key
pub mod settings;

/// The dataset × model pipeline
pub mod pipeline_use_case;
