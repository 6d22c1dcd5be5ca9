use crate::schema::{Entry, Occurrence, ScheduleId};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Suppresses projected occurrences that already exist as ledger entries.
///
/// An entry linked to a schedule marks that schedule's occurrence on the
/// entry's date as realized, whatever amount the entry was posted with.
#[derive(Debug, Clone, Default)]
pub struct EntryReconciler {
    realized: HashSet<(ScheduleId, NaiveDate)>,
}

impl EntryReconciler {
    pub fn new(entries: &[Entry]) -> Self {
        let realized = entries
            .iter()
            .filter_map(|e| e.schedule_id.map(|id| (id, e.entry_date)))
            .collect();
        Self { realized }
    }

    pub fn is_realized(&self, occurrence: &Occurrence) -> bool {
        self.realized
            .contains(&(occurrence.schedule_id, occurrence.date))
    }

    pub fn realized_count(&self) -> usize {
        self.realized.len()
    }

    pub fn reconcile<'a, I>(&'a self, occurrences: I) -> impl Iterator<Item = Occurrence> + 'a
    where
        I: IntoIterator<Item = Occurrence>,
        I::IntoIter: 'a,
    {
        occurrences
            .into_iter()
            .filter(move |occurrence| !self.is_realized(occurrence))
    }
}

pub fn reconcile(occurrences: Vec<Occurrence>, entries: &[Entry]) -> Vec<Occurrence> {
    let reconciler = EntryReconciler::new(entries);
    reconciler.reconcile(occurrences).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScheduleKind;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn occ(schedule_id: ScheduleId, date: &str) -> Occurrence {
        Occurrence {
            schedule_id,
            date: d(date),
            kind: ScheduleKind::Expense,
            amount_cents: 1000,
            src_account_id: Some(1),
            dest_account_id: None,
        }
    }

    fn entry(schedule_id: Option<ScheduleId>, date: &str, amount: i64) -> Entry {
        Entry {
            id: 1,
            entry_date: d(date),
            name: "Rent".to_string(),
            amount_cents: amount,
            src_account_id: Some(1),
            dest_account_id: None,
            schedule_id,
            description: None,
        }
    }

    #[test]
    fn test_linked_entry_removes_matching_occurrence_only() {
        let occurrences = vec![
            occ(1, "2026-01-01"),
            occ(1, "2026-02-01"),
            occ(2, "2026-01-01"),
        ];
        let entries = vec![entry(Some(1), "2026-01-01", 1250)];

        let kept = reconcile(occurrences, &entries);
        assert_eq!(kept, vec![occ(1, "2026-02-01"), occ(2, "2026-01-01")]);
    }

    #[test]
    fn test_unlinked_or_shifted_entries_do_not_reconcile() {
        let occurrences = vec![occ(1, "2026-01-01")];
        let entries = vec![
            entry(None, "2026-01-01", 1000),
            entry(Some(1), "2026-01-02", 1000),
        ];

        let kept = reconcile(occurrences.clone(), &entries);
        assert_eq!(kept, occurrences);
    }

    #[test]
    fn test_duplicate_entries_count_once() {
        let entries = vec![
            entry(Some(1), "2026-01-01", 1000),
            entry(Some(1), "2026-01-01", 400),
        ];
        let reconciler = EntryReconciler::new(&entries);
        assert_eq!(reconciler.realized_count(), 1);
        assert!(reconciler.is_realized(&occ(1, "2026-01-01")));
    }
}
