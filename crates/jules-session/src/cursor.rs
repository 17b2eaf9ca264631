//! Reconciliation of a fetched activity list against the last-seen cursor.

use jules_core::Activity;

/// Activities in `fetched` that come after `cursor`.
///
/// - No cursor: everything is new.
/// - Cursor found: the suffix after it (empty if it is last).
/// - Cursor not found: nothing. Server-side truncation or reordering cannot
///   be repaired locally, so the cursor is left where it is.
#[must_use]
pub fn unseen<'a>(fetched: &'a [Activity], cursor: Option<&str>) -> &'a [Activity] {
    let Some(cursor) = cursor else {
        return fetched;
    };
    match fetched.iter().position(|activity| activity.id == cursor) {
        Some(i) => &fetched[i + 1..],
        None => &[],
    }
}

/// Whether `cursor` is set but missing from a non-empty `fetched` list.
#[must_use]
pub fn is_stale(fetched: &[Activity], cursor: Option<&str>) -> bool {
    cursor.is_some_and(|cursor| {
        !fetched.is_empty() && !fetched.iter().any(|activity| activity.id == cursor)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str) -> Activity {
        Activity {
            id: id.to_string(),
            name: String::new(),
            description: format!("did {id}"),
            create_time: None,
            update_time: None,
            prompt: String::new(),
            state: None,
        }
    }

    fn list(ids: &[&str]) -> Vec<Activity> {
        ids.iter().map(|id| activity(id)).collect()
    }

    fn ids(activities: &[Activity]) -> Vec<&str> {
        activities.iter().map(|a| a.id.as_str()).collect()
    }

    /// Apply one cycle: returns emitted ids and advances the cursor.
    fn cycle(fetched: &[Activity], cursor: &mut Option<String>) -> Vec<String> {
        let fresh = unseen(fetched, cursor.as_deref());
        for activity in fresh {
            *cursor = Some(activity.id.clone());
        }
        fresh.iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn fresh_cursor_takes_everything() {
        let fetched = list(&["a1", "a2"]);
        assert_eq!(ids(unseen(&fetched, None)), ["a1", "a2"]);
    }

    #[test]
    fn suffix_after_cursor() {
        let fetched = list(&["a1", "a2", "a3"]);
        assert_eq!(ids(unseen(&fetched, Some("a1"))), ["a2", "a3"]);
        assert!(unseen(&fetched, Some("a3")).is_empty());
    }

    #[test]
    fn missing_cursor_yields_nothing() {
        let fetched = list(&["b1", "b2"]);
        assert!(unseen(&fetched, Some("a1")).is_empty());
        assert!(is_stale(&fetched, Some("a1")));
        assert!(!is_stale(&fetched, Some("b1")));
        assert!(!is_stale(&[], Some("a1")));
        assert!(!is_stale(&fetched, None));
    }

    #[test]
    fn three_cycle_scenario() {
        let mut cursor = None;

        assert_eq!(cycle(&list(&["a1"]), &mut cursor), ["a1"]);
        assert_eq!(cursor.as_deref(), Some("a1"));

        assert_eq!(cycle(&list(&["a1", "a2"]), &mut cursor), ["a2"]);
        assert_eq!(cursor.as_deref(), Some("a2"));

        assert!(cycle(&list(&["a1", "a2"]), &mut cursor).is_empty());
        assert_eq!(cursor.as_deref(), Some("a2"));
    }

    #[test]
    fn truncated_fetch_leaves_cursor() {
        let mut cursor = Some("a2".to_string());
        assert!(cycle(&list(&["a3", "a4"]), &mut cursor).is_empty());
        assert_eq!(cursor.as_deref(), Some("a2"));
    }

    #[test]
    fn every_chunking_emits_each_activity_once_in_order() {
        let all = ["a1", "a2", "a3", "a4", "a5"];
        let full = list(&all);

        // Each bit decides whether a cycle observes the list at that length.
        for mask in 0u32..(1 << all.len()) {
            let mut cursor = None;
            let mut emitted = Vec::new();
            for len in 0..=all.len() {
                let observed = len == all.len() || mask & (1 << len) != 0;
                if observed {
                    emitted.extend(cycle(&full[..len], &mut cursor));
                    // A repeated identical fetch never emits.
                    assert!(cycle(&full[..len], &mut cursor).is_empty());
                }
            }
            assert_eq!(emitted, all, "chunking mask {mask:#b}");
        }
    }
}
