//! Point-in-time account balances.
//!
//! Actual balances are the opening balance plus every recorded entry dated
//! between the account's opening date and the as-of date. Projected
//! balances add the scheduled occurrences in `[effective_from, as_of]`
//! that have not been realized as entries. Everything is recomputed from
//! the [`LedgerView`] on each call.

use crate::recurrence;
use crate::schema::{AccountId, BalanceMode, BalancePoint, Occurrence};
use crate::store::LedgerView;
use chrono::NaiveDate;
use log::debug;

/// Where projected occurrences start counting for a window beginning at
/// `from_date`.
///
/// A window that starts in the future still picks up the occurrences
/// between today and its start; the result never passes `as_of`.
pub fn projection_start_date(from_date: NaiveDate, as_of: NaiveDate, today: NaiveDate) -> NaiveDate {
    from_date.min(today).min(as_of)
}

pub struct BalanceAggregator<'a> {
    view: &'a LedgerView,
}

impl<'a> BalanceAggregator<'a> {
    pub fn new(view: &'a LedgerView) -> Self {
        Self { view }
    }

    /// Unrealized occurrences of every active schedule in the window, in
    /// schedule order then date order.
    pub fn projected_occurrences(
        &self,
        effective_from: NaiveDate,
        as_of: NaiveDate,
    ) -> impl Iterator<Item = Occurrence> + 'a {
        let view = self.view;
        view.schedules().iter().flat_map(move |schedule| {
            let occurrences = recurrence::expand(
                schedule,
                view.timeline(schedule.id),
                effective_from,
                as_of,
            );
            view.reconciler().reconcile(occurrences)
        })
    }

    /// Net movement per account, aligned with [`LedgerView::accounts`].
    pub fn deltas_as_of(
        &self,
        mode: BalanceMode,
        as_of: NaiveDate,
        effective_from: NaiveDate,
    ) -> Vec<i64> {
        let accounts = self.view.accounts();
        let mut deltas = vec![0i64; accounts.len()];

        for entry in self.view.entries() {
            if entry.entry_date > as_of {
                continue;
            }
            for (account_id, delta) in entry.deltas() {
                if let Some(idx) = self.view.account_position(account_id) {
                    if entry.entry_date >= accounts[idx].opening_date {
                        deltas[idx] += delta;
                    }
                }
            }
        }

        if mode == BalanceMode::Projected {
            let mut skipped = 0usize;
            for occurrence in self.projected_occurrences(effective_from, as_of) {
                for (account_id, delta) in occurrence.deltas() {
                    match self.view.account_position(account_id) {
                        Some(idx) => deltas[idx] += delta,
                        None => skipped += 1,
                    }
                }
            }
            if skipped > 0 {
                debug!(
                    "Skipped {} occurrence deltas for accounts outside the active set (as of {})",
                    skipped, as_of
                );
            }
        }

        deltas
    }

    /// Balances of every non-archived account, ordered by account name,
    /// optionally narrowed to one account.
    pub fn balances_as_of(
        &self,
        mode: BalanceMode,
        as_of: NaiveDate,
        effective_from: NaiveDate,
        account: Option<AccountId>,
    ) -> Vec<BalancePoint> {
        let deltas = self.deltas_as_of(mode, as_of, effective_from);
        self.view
            .accounts()
            .iter()
            .zip(deltas)
            .filter(|(a, _)| account.map_or(true, |id| a.id == id))
            .map(|(a, delta)| BalancePoint {
                account_id: a.id,
                name: a.name.clone(),
                balance_cents: a.opening_balance_cents + delta,
            })
            .collect()
    }

    pub fn actual_balances(&self, as_of: NaiveDate) -> Vec<BalancePoint> {
        self.balances_as_of(BalanceMode::Actual, as_of, as_of, None)
    }

    pub fn projected_balances(&self, effective_from: NaiveDate, as_of: NaiveDate) -> Vec<BalancePoint> {
        self.balances_as_of(BalanceMode::Projected, as_of, effective_from, None)
    }
}
