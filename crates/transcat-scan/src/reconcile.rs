//! Reconcile found sources against a catalog snapshot.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use transcat_catalog::{CatalogError, CatalogStore, KindOutcome, KindPlan, KindSnapshot};
use transcat_core::source::{MissingPolicy, SourceKind};

/// Decide inserts, renewals and pending ids for one kind. Pure.
///
/// Found values present and active are kept, present and missing are renewed,
/// absent ones are inserted. Snapshot rows never found end up in `pending`.
pub fn plan<'v>(snapshot: &KindSnapshot, found: impl IntoIterator<Item = &'v str>) -> KindPlan {
    let mut pending = snapshot.clone();
    let mut inserted = HashSet::new();
    let mut plan = KindPlan::default();

    for value in found {
        match pending.remove(value) {
            Some(entry) if entry.missing => plan.renew.push(entry.id),
            Some(_) => {}
            None if snapshot.contains_key(value) => {}
            None => {
                if inserted.insert(value) {
                    plan.inserts.push(value.to_string());
                }
            }
        }
    }

    plan.pending = pending.into_values().map(|entry| entry.id).collect();
    plan.pending.sort_unstable();
    plan
}

/// Apply a plan through the store, logging what it decided.
pub fn apply<S: CatalogStore + ?Sized>(
    store: &S,
    kind: SourceKind,
    plan: &KindPlan,
    policy: MissingPolicy,
    locale: &str,
    now: DateTime<Utc>,
) -> Result<KindOutcome, CatalogError> {
    tracing::debug!(
        kind = %kind,
        inserts = plan.inserts.len(),
        renew = plan.renew.len(),
        pending = plan.pending.len(),
        policy = ?policy,
        "reconcile plan"
    );
    store.apply(kind, plan, policy, locale, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transcat_catalog::SnapshotEntry;

    fn snapshot(rows: &[(&str, i64, bool)]) -> KindSnapshot {
        rows.iter()
            .map(|&(value, id, missing)| (value.to_string(), SnapshotEntry { id, missing }))
            .collect()
    }

    #[test]
    fn test_plan_classifies_values() {
        let snap = snapshot(&[("kept", 1, false), ("back", 2, true), ("gone", 3, false)]);
        let plan = plan(&snap, ["kept", "back", "new"]);
        assert_eq!(plan.inserts, vec!["new".to_string()]);
        assert_eq!(plan.renew, vec![2]);
        assert_eq!(plan.pending, vec![3]);
    }

    #[test]
    fn test_plan_pending_sorted_and_includes_already_missing() {
        let snap = snapshot(&[("c", 9, false), ("a", 4, true), ("b", 7, false)]);
        let plan = plan(&snap, std::iter::empty());
        assert_eq!(plan.pending, vec![4, 7, 9]);
        assert!(plan.inserts.is_empty());
        assert!(plan.renew.is_empty());
    }

    #[test]
    fn test_plan_keeps_insert_order_without_duplicates() {
        let plan = plan(&KindSnapshot::new(), ["z", "a", "z", "m"]);
        assert_eq!(plan.inserts, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_plan_repeated_found_value_renewed_once() {
        let snap = snapshot(&[("x", 1, true)]);
        let plan = plan(&snap, ["x", "x"]);
        assert_eq!(plan.renew, vec![1]);
        assert!(plan.inserts.is_empty());
    }
}
