//! # Balance Projection
//!
//! Turns a ledger of accounts, recurring schedules and recorded entries into
//! point-in-time balances and balance series, actual or projected, with
//! optional compounding interest.
//!
//! ## Core Concepts
//!
//! - **Schedules**: recurring income, expenses and transfers, expanded lazily into
//!   dated occurrences with month-length clamping and weekday anchoring
//! - **Revisions**: dated amount changes that apply to every occurrence on or after their date
//! - **Reconciliation**: an entry posted for `(schedule, date)` replaces that occurrence
//! - **Actual vs projected**: actual balances count entries only; projected balances
//!   add the scheduled occurrences that have not happened yet
//! - **Interest**: daily or monthly compounding layered over a series, with the
//!   fractional remainder carried between steps
//!
//! ## Example
//!
//! ```rust,ignore
//! use balance_projection::*;
//! use chrono::NaiveDate;
//!
//! let snapshot = LedgerSnapshot::from_path("ledger.json")?;
//! let projector = BalanceProjector::new(snapshot);
//!
//! let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
//! let to = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
//! let series = projector.series(&SeriesQuery::new(BalanceMode::Projected, from, to, 7).with_interest())?;
//!
//! for (date, total) in series.dates.iter().zip(&series.total_cents) {
//!     println!("{}: {}", date, total);
//! }
//! ```

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod interest;
pub mod query;
pub mod reconciler;
pub mod recurrence;
pub mod revisions;
pub mod schema;
pub mod settings;
pub mod store;
pub mod utils;

pub use aggregator::{projection_start_date, BalanceAggregator};
pub use engine::{AccountSeries, Series, SeriesAccumulator, SeriesBuilder, WarmupPlan};
pub use error::{ProjectionError, Result};
pub use interest::{interest_for_period, interest_for_period_cents, InterestCarry};
pub use query::*;
pub use reconciler::EntryReconciler;
pub use recurrence::{expand, OccurrenceIter};
pub use revisions::RevisionTimeline;
pub use schema::*;
pub use settings::ProjectionSettings;
pub use store::{LedgerSnapshot, LedgerStore, LedgerView};

use chrono::NaiveDate;
use log::{debug, info};

/// Answers balance queries against a [`LedgerStore`].
///
/// Every query reads the store once and computes from that read; nothing is
/// cached between queries.
pub struct BalanceProjector<S: LedgerStore> {
    store: S,
    settings: ProjectionSettings,
    today: Option<NaiveDate>,
}

impl<S: LedgerStore> BalanceProjector<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            settings: ProjectionSettings::default(),
            today: None,
        }
    }

    pub fn with_settings(mut self, settings: ProjectionSettings) -> Result<Self> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    /// Pins the date used as "today" when choosing where projections start.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn settings(&self) -> &ProjectionSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Balance of every non-archived account (or just `account`), ordered by name.
    pub fn balance_as_of(
        &self,
        mode: BalanceMode,
        as_of: NaiveDate,
        account: Option<AccountId>,
    ) -> Result<Vec<BalancePoint>> {
        info!("Computing {} balance points as of {}", mode, as_of);
        let view = LedgerView::load(&self.store)?;
        let effective_from = projection_start_date(as_of, as_of, self.today());
        Ok(BalanceAggregator::new(&view).balances_as_of(mode, as_of, effective_from, account))
    }

    pub fn balances(&self, query: &BalanceQuery) -> Result<Vec<AccountBalance>> {
        info!(
            "Computing {} balances as of {} (from {})",
            query.mode, query.as_of, query.from_date
        );
        let view = LedgerView::load(&self.store)?;
        let effective_from = projection_start_date(query.from_date, query.as_of, self.today());
        debug!("Projected occurrences count from {}", effective_from);

        let deltas =
            BalanceAggregator::new(&view).deltas_as_of(query.mode, query.as_of, effective_from);
        Ok(view
            .accounts()
            .iter()
            .zip(deltas)
            .filter(|(a, _)| query.account_id.map_or(true, |id| a.id == id))
            .map(|(a, delta)| AccountBalance::new(a, delta))
            .collect())
    }

    pub fn balances_from_params(&self, params: &BalanceQueryParams) -> Result<Vec<AccountBalance>> {
        let query = BalanceQuery::try_from(params)?;
        self.balances(&query)
    }

    /// Validates `query` before touching the store, then builds the series.
    pub fn series(&self, query: &SeriesQuery) -> Result<Series> {
        query.validate(&self.settings)?;
        info!(
            "Building {} series {}..{} every {} days ({} points, interest: {})",
            query.mode,
            query.from_date,
            query.to_date,
            query.step_days,
            query.point_count(),
            query.include_interest
        );
        let view = LedgerView::load(&self.store)?;
        SeriesBuilder::new(&view, &self.settings, self.today()).build(query)
    }

    pub fn series_from_params(&self, params: &SeriesQueryParams) -> Result<Series> {
        let query = SeriesQuery::from_params(params, &self.settings)?;
        self.series(&query)
    }

    /// Every active schedule's occurrences in `[from, to]`, ordered by date
    /// then schedule name. Entries do not suppress anything here.
    pub fn occurrences(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ScheduledOccurrence>> {
        info!("Listing occurrences {}..{}", from, to);
        let view = LedgerView::load(&self.store)?;
        let mut rows: Vec<ScheduledOccurrence> = view
            .schedules()
            .iter()
            .flat_map(|schedule| {
                expand(schedule, view.timeline(schedule.id), from, to)
                    .map(move |occurrence| ScheduledOccurrence::new(schedule, occurrence))
            })
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        debug!("Listed {} occurrences", rows.len());
        Ok(rows)
    }

    pub fn occurrences_from_params(
        &self,
        params: &OccurrenceQueryParams,
    ) -> Result<Vec<ScheduledOccurrence>> {
        let (from, to) = params.window()?;
        self.occurrences(from, to)
    }
}

/// Builds a series straight from a store with default settings.
pub fn project_series<S: LedgerStore>(store: S, query: &SeriesQuery) -> Result<Series> {
    BalanceProjector::new(store).series(query)
}
