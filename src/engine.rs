use crate::aggregator::{projection_start_date, BalanceAggregator};
use crate::error::{ProjectionError, Result};
use crate::interest::InterestCarry;
use crate::query::SeriesQuery;
use crate::schema::{Account, AccountId, BalanceMode, BalancePoint, CompoundingScheme};
use crate::settings::ProjectionSettings;
use crate::store::LedgerView;
use crate::utils::{days_between, step_dates};
use chrono::NaiveDate;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Balances of one account, index-aligned with [`Series::dates`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AccountSeries {
    #[serde(rename = "id")]
    pub account_id: AccountId,
    pub name: String,
    pub is_liability: bool,
    pub is_interest_bearing: bool,
    pub interest_apr_bps: i64,
    pub interest_compound: CompoundingScheme,
    pub exclude_from_dashboard: bool,
    pub balance_cents: Vec<i64>,
}

impl AccountSeries {
    fn new(account_id: AccountId, name: &str, meta: Option<&Account>, capacity: usize) -> Self {
        Self {
            account_id,
            name: name.to_string(),
            is_liability: meta.map_or(false, |a| a.is_liability),
            is_interest_bearing: meta.map_or(false, |a| a.is_interest_bearing),
            interest_apr_bps: meta.map_or(0, |a| a.interest_apr_bps),
            interest_compound: meta.map_or(CompoundingScheme::Daily, |a| a.interest_compound),
            exclude_from_dashboard: meta.map_or(false, |a| a.exclude_from_dashboard),
            balance_cents: Vec::with_capacity(capacity),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Series {
    pub mode: BalanceMode,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub step_days: u32,
    pub dates: Vec<NaiveDate>,
    pub total_cents: Vec<i64>,
    pub accounts: Vec<AccountSeries>,
}

impl Series {
    pub fn account(&self, account_id: AccountId) -> Option<&AccountSeries> {
        self.accounts.iter().find(|a| a.account_id == account_id)
    }
}

/// Per-account state threaded from one step to the next.
#[derive(Debug, Clone, Copy)]
struct AccountTrack {
    /// Raw aggregator balance at the previous step.
    base_prev: i64,
    /// Balance including booked interest at the previous step.
    adj_prev: i64,
    carry: InterestCarry,
}

impl AccountTrack {
    fn seeded(balance_cents: i64) -> Self {
        Self {
            base_prev: balance_cents,
            adj_prev: balance_cents,
            carry: InterestCarry::new(),
        }
    }
}

/// Folds per-step balances into a [`Series`], applying interest on top of
/// the raw balances when asked to.
pub struct SeriesAccumulator {
    include_interest: bool,
    capacity: usize,
    dates: Vec<NaiveDate>,
    totals: Vec<i64>,
    accounts: Vec<AccountSeries>,
    index: HashMap<AccountId, usize>,
    tracks: HashMap<AccountId, AccountTrack>,
    prev_date: Option<NaiveDate>,
}

impl SeriesAccumulator {
    pub fn new(include_interest: bool, capacity: usize) -> Self {
        Self {
            include_interest,
            capacity,
            dates: Vec::with_capacity(capacity),
            totals: Vec::with_capacity(capacity),
            accounts: Vec::new(),
            index: HashMap::new(),
            tracks: HashMap::new(),
            prev_date: None,
        }
    }

    fn register(&mut self, point: &BalancePoint, meta: Option<&Account>) -> usize {
        let idx = self.accounts.len();
        self.index.insert(point.account_id, idx);
        self.accounts
            .push(AccountSeries::new(point.account_id, &point.name, meta, self.capacity));
        self.tracks
            .insert(point.account_id, AccountTrack::seeded(point.balance_cents));
        idx
    }

    /// Processes the balances at `date`. Warm-up steps pass `record = false`:
    /// they advance interest state without adding a point.
    ///
    /// Fails with [`ProjectionError::InterestOverflow`] when a balance or the
    /// total no longer fits in an `i64`.
    pub fn observe(
        &mut self,
        date: NaiveDate,
        balances: &[BalancePoint],
        view: &LedgerView,
        record: bool,
    ) -> Result<()> {
        if self.accounts.is_empty() {
            for point in balances {
                self.register(point, view.account(point.account_id));
            }
        }

        let days_since_prev = self.prev_date.map_or(0, |prev| days_between(prev, date));

        let mut sum = 0i64;
        for point in balances {
            let mut value = point.balance_cents;

            let idx = match self.index.get(&point.account_id) {
                Some(&idx) => idx,
                None => {
                    debug!(
                        "Account '{}' first appears on {}; backfilling {} points",
                        point.name,
                        date,
                        self.dates.len()
                    );
                    let idx = self.register(point, view.account(point.account_id));
                    if record {
                        self.accounts[idx]
                            .balance_cents
                            .extend(std::iter::repeat(0).take(self.dates.len()));
                    }
                    idx
                }
            };

            let overflow = || ProjectionError::InterestOverflow {
                account: point.name.clone(),
                date,
            };

            if self.include_interest {
                if let Some(track) = self.tracks.get_mut(&point.account_id) {
                    if self.prev_date.is_none() {
                        *track = AccountTrack::seeded(point.balance_cents);
                    } else if days_since_prev > 0 {
                        let interest = match view.account(point.account_id) {
                            Some(account)
                                if account.accrues_interest() && date >= account.opening_date =>
                            {
                                track
                                    .carry
                                    .accrue(
                                        track.adj_prev,
                                        account.interest_apr_bps,
                                        account.interest_compound,
                                        days_since_prev,
                                    )
                                    .ok_or_else(overflow)?
                            }
                            _ => 0,
                        };
                        value = point
                            .balance_cents
                            .checked_sub(track.base_prev)
                            .and_then(|movement| track.adj_prev.checked_add(movement))
                            .and_then(|adjusted| adjusted.checked_add(interest))
                            .ok_or_else(overflow)?;
                        track.base_prev = point.balance_cents;
                        track.adj_prev = value;
                    }
                }
            }

            sum = sum.checked_add(value).ok_or_else(overflow)?;
            if record {
                self.accounts[idx].balance_cents.push(value);
            }
        }

        if record {
            self.dates.push(date);
            self.totals.push(sum);
            let len = self.dates.len();
            for account in &mut self.accounts {
                if account.balance_cents.len() < len {
                    account.balance_cents.push(0);
                }
            }
        }
        self.prev_date = Some(date);
        Ok(())
    }

    pub fn finish(self, query: &SeriesQuery) -> Series {
        Series {
            mode: query.mode,
            from_date: query.from_date,
            to_date: query.to_date,
            step_days: query.step_days,
            dates: self.dates,
            total_cents: self.totals,
            accounts: self.accounts,
        }
    }
}

/// Where warm-up starts and how far apart its points are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmupPlan {
    pub start: NaiveDate,
    pub step_days: u32,
}

impl WarmupPlan {
    /// Warm-up is needed when interest is requested and an interest-bearing
    /// account opened before the series starts. The requested step is
    /// coarsened when it would produce more than `max_points` points.
    pub fn for_query(
        view: &LedgerView,
        query: &SeriesQuery,
        max_points: usize,
    ) -> Option<WarmupPlan> {
        if !query.include_interest || query.mode != BalanceMode::Projected {
            return None;
        }
        let start = view
            .accounts()
            .iter()
            .filter(|a| a.is_interest_bearing)
            .map(|a| a.opening_date)
            .min()?;
        if start >= query.from_date {
            return None;
        }

        let warm_days = days_between(start, query.from_date);
        let mut step_days = query.step_days.max(1);
        let natural_points = warm_days / step_days as i64 + 1;
        if natural_points > max_points as i64 {
            let budget = max_points.saturating_sub(1).max(1) as i64;
            step_days = ((warm_days + budget - 1) / budget).max(1) as u32;
            debug!(
                "Warm-up from {} would need {} points; coarsening step to {} days",
                start, natural_points, step_days
            );
        }
        Some(WarmupPlan { start, step_days })
    }
}

/// Builds balance series over one loaded [`LedgerView`].
pub struct SeriesBuilder<'a> {
    view: &'a LedgerView,
    settings: &'a ProjectionSettings,
    today: NaiveDate,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(view: &'a LedgerView, settings: &'a ProjectionSettings, today: NaiveDate) -> Self {
        Self {
            view,
            settings,
            today,
        }
    }

    pub fn build(&self, query: &SeriesQuery) -> Result<Series> {
        query.validate(self.settings)?;

        let aggregator = BalanceAggregator::new(self.view);
        let warmup = WarmupPlan::for_query(self.view, query, self.settings.max_warmup_points);
        // Interest needs occurrences from the warm-up start onwards.
        let projection_from = warmup.map_or(query.from_date, |w| w.start);

        let mut acc = SeriesAccumulator::new(query.include_interest, query.point_count());
        let step = |date: NaiveDate, record: bool, acc: &mut SeriesAccumulator| {
            let effective_from = projection_start_date(projection_from, date, self.today);
            let balances = aggregator.balances_as_of(query.mode, date, effective_from, None);
            acc.observe(date, &balances, self.view, record)
        };

        if let Some(plan) = warmup {
            let mut warm_points = 0usize;
            for date in step_dates(plan.start, query.from_date, plan.step_days, false) {
                step(date, false, &mut acc)?;
                warm_points += 1;
            }
            debug!(
                "Warm-up ran {} points from {} every {} days",
                warm_points, plan.start, plan.step_days
            );
        }

        for date in step_dates(query.from_date, query.to_date, query.step_days, true) {
            step(date, true, &mut acc)?;
        }

        Ok(acc.finish(query))
    }
}
