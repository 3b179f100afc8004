//! Scale warnings for Ocean Notes.
//!
//! Every store operation rewrites the whole collection, which is fine for a
//! personal notebook. These warnings fire when a collection outgrows that.

use crate::storage::StoreStats;

/// Note count above which list/search start to feel slow.
pub const NOTE_COUNT_WARNING_THRESHOLD: usize = 2_000;
/// Collection size above which browser-style storage quotas (5MB) get close.
pub const BLOB_SIZE_WARNING_THRESHOLD: usize = 4 * 1024 * 1024;

/// A warning about potential performance issues.
#[derive(Debug, Clone)]
pub enum Warning {
    /// Note count exceeds recommended threshold.
    HighNoteCount { count: usize, threshold: usize },
    /// Serialized collection exceeds recommended size.
    LargeCollection { size_mb: f64, threshold_mb: f64 },
}

/// Check thresholds and return any warnings (empty if all is well).
pub fn check_thresholds(stats: &StoreStats) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if stats.note_count > NOTE_COUNT_WARNING_THRESHOLD {
        warnings.push(Warning::HighNoteCount {
            count: stats.note_count,
            threshold: NOTE_COUNT_WARNING_THRESHOLD,
        });
    }

    if stats.blob_bytes > BLOB_SIZE_WARNING_THRESHOLD {
        warnings.push(Warning::LargeCollection {
            size_mb: stats.blob_bytes as f64 / (1024.0 * 1024.0),
            threshold_mb: BLOB_SIZE_WARNING_THRESHOLD as f64 / (1024.0 * 1024.0),
        });
    }

    warnings
}

/// Format a warning for display.
pub fn format_warning(warning: &Warning) -> String {
    match warning {
        Warning::HighNoteCount { count, threshold } => {
            format!(
                "Warning: {} notes exceeds recommended {} - every save rewrites the whole collection",
                count, threshold
            )
        }
        Warning::LargeCollection {
            size_mb,
            threshold_mb,
        } => {
            format!(
                "Warning: notes collection ({:.1}MB) exceeds recommended {:.0}MB",
                size_mb, threshold_mb
            )
        }
    }
}
