//! Search and ordering over note collections.
//!
//! Everything here is pure: no function touches persistence.

use crate::entity::Note;

/// Ordering applied to a note list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Most recently updated first.
    #[default]
    Updated,
    /// Most recently created first.
    Created,
    /// Title, ascending.
    Title,
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortBy::Updated => write!(f, "updated"),
            SortBy::Created => write!(f, "created"),
            SortBy::Title => write!(f, "title"),
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "updated" => Ok(SortBy::Updated),
            "created" => Ok(SortBy::Created),
            "title" => Ok(SortBy::Title),
            _ => Err(format!("Invalid sort key: {}", s)),
        }
    }
}

/// Case-insensitive substring search over title and body.
///
/// A blank query returns `notes` as given, in the same order.
pub fn search_notes(query: &str, notes: Vec<Note>) -> Vec<Note> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return notes;
    }
    notes
        .into_iter()
        .filter(|n| matches(n, &needle))
        .collect()
}

/// Whether `note` contains `needle`, which must already be lowercase.
fn matches(note: &Note, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle) || note.body.to_lowercase().contains(needle)
}

/// Sort in place. Comparisons are ordinal and the sort is stable.
pub fn sort_notes(notes: &mut [Note], sort_by: SortBy) {
    match sort_by {
        SortBy::Updated => notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        SortBy::Created => notes.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortBy::Title => notes.sort_by(|a, b| a.title.cmp(&b.title)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, title: &str, body: &str, created: &str, updated: &str) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: created.to_string(),
            updated_at: updated.to_string(),
        }
    }

    fn sample() -> Vec<Note> {
        vec![
            note(
                "1",
                "Groceries",
                "Milk and EGGS",
                "2025-01-01T00:00:00.000Z",
                "2025-01-05T00:00:00.000Z",
            ),
            note(
                "2",
                "Trip plan",
                "Pack the tent",
                "2025-01-03T00:00:00.000Z",
                "2025-01-04T00:00:00.000Z",
            ),
            note(
                "3",
                "eggs benedict",
                "",
                "2025-01-02T00:00:00.000Z",
                "2025-01-06T00:00:00.000Z",
            ),
        ]
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_empty_query_returns_input_unchanged() {
        assert_eq!(search_notes("", sample()), sample());
        assert_eq!(search_notes("   \t", sample()), sample());
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_body() {
        let results = search_notes("Eggs", sample());
        assert_eq!(ids(&results), vec!["1", "3"]);
    }

    #[test]
    fn test_search_matches_substrings() {
        let results = search_notes("ten", sample());
        assert_eq!(ids(&results), vec!["2"]);
    }

    #[test]
    fn test_search_trims_query() {
        let results = search_notes("  trip  ", sample());
        assert_eq!(ids(&results), vec!["2"]);
    }

    #[test]
    fn test_search_no_match() {
        assert!(search_notes("zebra", sample()).is_empty());
    }

    #[test]
    fn test_sort_by_updated() {
        let mut notes = sample();
        sort_notes(&mut notes, SortBy::Updated);
        assert_eq!(ids(&notes), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_sort_by_created() {
        let mut notes = sample();
        sort_notes(&mut notes, SortBy::Created);
        assert_eq!(ids(&notes), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_sort_by_title_is_ordinal() {
        let mut notes = sample();
        sort_notes(&mut notes, SortBy::Title);
        // Uppercase sorts before lowercase.
        assert_eq!(ids(&notes), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_sort_by_parse() {
        assert_eq!("Title".parse::<SortBy>(), Ok(SortBy::Title));
        assert_eq!("created".parse::<SortBy>(), Ok(SortBy::Created));
        assert!("size".parse::<SortBy>().is_err());
        assert_eq!(SortBy::default().to_string(), "updated");
    }
}
