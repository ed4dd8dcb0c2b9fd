// All report building lives in nutrimed-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod sources;

// Re-export core types for convenience
pub use nutrimed_core::*;

// Re-export CLI utilities
pub use sources::{AnalysisSource, DisplayOverrides, HistoryEntry, LoadedAnalysis};
