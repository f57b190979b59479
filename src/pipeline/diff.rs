//! Change detection against the persisted record set.
//!
//! A record is new when no known record shares its `(name, link)` key.
//! The `date` field plays no part in identity.

use std::collections::HashSet;

use crate::models::{Record, RecordKey};

/// Records of `current` whose key is absent from `known`, in `current` order.
///
/// Repeats within `current` are all returned; see [`collapse_duplicates`].
pub fn detect_new(current: &[Record], known: &[Record]) -> Vec<Record> {
    let known_keys: HashSet<RecordKey<'_>> = known.iter().map(Record::key).collect();

    current
        .iter()
        .filter(|record| !known_keys.contains(&record.key()))
        .cloned()
        .collect()
}

/// Drop repeated keys, keeping the first occurrence.
pub fn collapse_duplicates(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    let mut deduped = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert((record.name.clone(), record.link.clone())) {
            deduped.push(record);
        }
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NO_DATE;

    fn make_record(n: usize) -> Record {
        Record::new(
            format!("Company{n} Placement Circular 01.01.2024"),
            format!("http://x/{n}"),
            "01.01.2024",
        )
    }

    #[test]
    fn test_empty_known_returns_current() {
        let current = vec![make_record(1), make_record(2)];
        assert_eq!(detect_new(&current, &[]), current);
    }

    #[test]
    fn test_preserves_current_order() {
        let current = vec![make_record(5), make_record(1), make_record(3), make_record(2)];
        let known = vec![make_record(1)];
        assert_eq!(
            detect_new(&current, &known),
            vec![make_record(5), make_record(3), make_record(2)]
        );
    }

    #[test]
    fn test_no_changes() {
        let current = vec![make_record(1), make_record(2)];
        assert!(detect_new(&current, &current.clone()).is_empty());
    }

    #[test]
    fn test_idempotent_after_merge() {
        let current = vec![make_record(1), make_record(2), make_record(3)];
        let mut known = vec![make_record(2), make_record(9)];

        let fresh = detect_new(&current, &known);
        assert_eq!(fresh, vec![make_record(1), make_record(3)]);

        known.extend(fresh);
        assert!(detect_new(&current, &known).is_empty());
    }

    #[test]
    fn test_date_drift_is_not_new() {
        let known = vec![make_record(1)];
        let mut drifted = make_record(1);
        drifted.date = NO_DATE.to_string();
        assert!(detect_new(&[drifted], &known).is_empty());
    }

    #[test]
    fn test_same_name_different_link_is_new() {
        let known = vec![make_record(1)];
        let mut moved = make_record(1);
        moved.link = "http://x/moved".to_string();
        assert_eq!(detect_new(&[moved.clone()], &known), vec![moved]);
    }

    #[test]
    fn test_duplicates_within_current_are_kept() {
        let current = vec![make_record(1), make_record(1)];
        assert_eq!(detect_new(&current, &[]).len(), 2);
    }

    #[test]
    fn test_collapse_duplicates_keeps_first() {
        let mut later = make_record(1);
        later.date = NO_DATE.to_string();
        let records = vec![make_record(1), make_record(2), later];

        assert_eq!(
            collapse_duplicates(records),
            vec![make_record(1), make_record(2)]
        );
    }
}
