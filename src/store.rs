//! Read access to persisted accounts, schedules, revisions and entries.

use crate::error::Result;
use crate::reconciler::EntryReconciler;
use crate::revisions::{timelines_by_schedule, RevisionTimeline};
use crate::schema::{Account, AccountId, Entry, Schedule, ScheduleId, ScheduleRevision};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The persistence collaborator. Rows come back in insertion (id) order.
///
/// Implementations report read failures as `ProjectionError::Storage`; the
/// projection code never retries.
pub trait LedgerStore: Sync {
    fn accounts(&self) -> Result<Vec<Account>>;
    fn schedules(&self) -> Result<Vec<Schedule>>;
    fn revisions(&self) -> Result<Vec<ScheduleRevision>>;
    fn entries(&self) -> Result<Vec<Entry>>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for &S {
    fn accounts(&self) -> Result<Vec<Account>> {
        (**self).accounts()
    }

    fn schedules(&self) -> Result<Vec<Schedule>> {
        (**self).schedules()
    }

    fn revisions(&self) -> Result<Vec<ScheduleRevision>> {
        (**self).revisions()
    }

    fn entries(&self) -> Result<Vec<Entry>> {
        (**self).entries()
    }
}

/// Whole ledger held in memory; doubles as the JSON interchange format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,

    #[serde(default)]
    pub schedules: Vec<Schedule>,

    #[serde(default)]
    pub revisions: Vec<ScheduleRevision>,

    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl LedgerStore for LedgerSnapshot {
    fn accounts(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.clone())
    }

    fn schedules(&self) -> Result<Vec<Schedule>> {
        Ok(self.schedules.clone())
    }

    fn revisions(&self) -> Result<Vec<ScheduleRevision>> {
        Ok(self.revisions.clone())
    }

    fn entries(&self) -> Result<Vec<Entry>> {
        Ok(self.entries.clone())
    }
}

/// One consistent read of a store, indexed for balance computation.
#[derive(Debug, Clone)]
pub struct LedgerView {
    /// Non-archived accounts ordered by name.
    accounts: Vec<Account>,
    account_index: HashMap<AccountId, usize>,
    /// Active schedules only.
    schedules: Vec<Schedule>,
    timelines: HashMap<ScheduleId, RevisionTimeline>,
    entries: Vec<Entry>,
    reconciler: EntryReconciler,
}

impl LedgerView {
    pub fn load<S: LedgerStore + ?Sized>(store: &S) -> Result<Self> {
        let accounts = store.accounts()?;
        let schedules = store.schedules()?;
        let revisions = store.revisions()?;
        let entries = store.entries()?;
        Ok(Self::from_parts(accounts, schedules, revisions, entries))
    }

    pub fn from_parts(
        accounts: Vec<Account>,
        schedules: Vec<Schedule>,
        revisions: Vec<ScheduleRevision>,
        entries: Vec<Entry>,
    ) -> Self {
        let mut accounts: Vec<Account> = accounts.into_iter().filter(|a| !a.is_archived()).collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));

        let account_index = accounts
            .iter()
            .enumerate()
            .map(|(idx, a)| (a.id, idx))
            .collect();

        let schedules: Vec<Schedule> = schedules.into_iter().filter(|s| s.is_active).collect();
        let timelines = timelines_by_schedule(&revisions);
        let reconciler = EntryReconciler::new(&entries);
        debug!(
            "Ledger view: {} active accounts, {} active schedules, {} entries ({} realized occurrences)",
            accounts.len(),
            schedules.len(),
            entries.len(),
            reconciler.realized_count()
        );

        Self {
            accounts,
            account_index,
            schedules,
            timelines,
            entries,
            reconciler,
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.account_index.get(&id).map(|&idx| &self.accounts[idx])
    }

    /// Position of the account in [`LedgerView::accounts`].
    pub fn account_position(&self, id: AccountId) -> Option<usize> {
        self.account_index.get(&id).copied()
    }

    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn timeline(&self, schedule_id: ScheduleId) -> Option<&RevisionTimeline> {
        self.timelines.get(&schedule_id)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn reconciler(&self) -> &EntryReconciler {
        &self.reconciler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectionError;
    use crate::schema::{CompoundingScheme, Frequency, ScheduleKind};
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn account(id: AccountId, name: &str, archived: bool) -> Account {
        Account {
            id,
            name: name.to_string(),
            opening_date: d("2026-01-01"),
            opening_balance_cents: 0,
            is_liability: false,
            is_interest_bearing: false,
            interest_apr_bps: 0,
            interest_compound: CompoundingScheme::Daily,
            exclude_from_dashboard: false,
            archived_at: if archived { Some(d("2026-02-01")) } else { None },
        }
    }

    struct FailingStore;

    impl LedgerStore for FailingStore {
        fn accounts(&self) -> Result<Vec<Account>> {
            Ok(Vec::new())
        }

        fn schedules(&self) -> Result<Vec<Schedule>> {
            Err(ProjectionError::Storage("schedule table unreadable".to_string()))
        }

        fn revisions(&self) -> Result<Vec<ScheduleRevision>> {
            Ok(Vec::new())
        }

        fn entries(&self) -> Result<Vec<Entry>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_view_orders_accounts_and_drops_archived() {
        let snapshot = LedgerSnapshot {
            accounts: vec![
                account(1, "Savings", false),
                account(2, "Checking", false),
                account(3, "Old Card", true),
            ],
            ..Default::default()
        };
        let view = LedgerView::load(&snapshot).unwrap();
        let names: Vec<_> = view.accounts().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Checking", "Savings"]);
        assert!(view.account(3).is_none());
        assert_eq!(view.account_position(1), Some(1));
    }

    #[test]
    fn test_view_keeps_active_schedules_only() {
        let mut schedules = Vec::new();
        for (id, active) in [(1, true), (2, false)] {
            schedules.push(Schedule {
                id,
                name: format!("s{}", id),
                kind: ScheduleKind::Income,
                amount_cents: 100,
                src_account_id: None,
                dest_account_id: Some(1),
                start_date: d("2026-01-01"),
                end_date: None,
                freq: Frequency::Monthly,
                interval: 1,
                by_month_day: None,
                by_weekday: None,
                description: None,
                is_active: active,
            });
        }
        let view = LedgerView::from_parts(Vec::new(), schedules, Vec::new(), Vec::new());
        assert_eq!(view.schedules().len(), 1);
        assert_eq!(view.schedules()[0].id, 1);
    }

    #[test]
    fn test_storage_failure_propagates() {
        let err = LedgerView::load(&FailingStore).unwrap_err();
        assert!(matches!(err, ProjectionError::Storage(_)));
        assert!(!err.is_validation());
    }
}
