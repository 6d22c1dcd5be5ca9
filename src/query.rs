//! Handler-facing query parameters and result rows.
//!
//! Raw parameters arrive as optional strings, the way a query string
//! delivers them. Converting them into [`BalanceQuery`] or [`SeriesQuery`]
//! applies the defaults and performs every validation before any balance is
//! computed.

use crate::error::{ProjectionError, Result};
use crate::schema::{
    Account, AccountId, BalanceMode, CompoundingScheme, Occurrence, Schedule, ScheduleId,
    ScheduleKind,
};
use crate::settings::ProjectionSettings;
use crate::utils::{parse_iso_date, series_point_count};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lenient boolean flag: `1`, `true`, `yes` and `on` (any case) are true,
/// everything else is false.
pub fn parse_flag(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) => matches!(v.as_str(), "1" | "true" | "yes" | "on"),
        None => false,
    }
}

fn parse_mode(value: Option<&str>, default: BalanceMode) -> Result<BalanceMode> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v.parse(),
    }
}

fn required_date(value: Option<&str>, field: &str) -> Result<NaiveDate> {
    parse_iso_date(value.unwrap_or_default(), field)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BalanceQueryParams {
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub as_of: Option<String>,

    #[serde(default)]
    #[schemars(description = "Start of the projection window; defaults to as_of")]
    pub from_date: Option<String>,

    #[serde(default)]
    pub account_id: Option<AccountId>,
}

/// A validated point-in-time balance query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceQuery {
    pub mode: BalanceMode,
    pub as_of: NaiveDate,
    pub from_date: NaiveDate,
    pub account_id: Option<AccountId>,
}

impl BalanceQuery {
    pub fn actual(as_of: NaiveDate) -> Self {
        Self {
            mode: BalanceMode::Actual,
            as_of,
            from_date: as_of,
            account_id: None,
        }
    }

    pub fn projected(from_date: NaiveDate, as_of: NaiveDate) -> Self {
        Self {
            mode: BalanceMode::Projected,
            as_of,
            from_date,
            account_id: None,
        }
    }

    pub fn for_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

impl TryFrom<&BalanceQueryParams> for BalanceQuery {
    type Error = ProjectionError;

    fn try_from(params: &BalanceQueryParams) -> Result<Self> {
        let as_of = required_date(params.as_of.as_deref(), "as_of")?;
        let mode = parse_mode(params.mode.as_deref(), BalanceMode::Actual)?;
        let from_date = match params.from_date.as_deref().map(str::trim) {
            None | Some("") => as_of,
            Some(v) => parse_iso_date(v, "from_date")?,
        };
        Ok(Self {
            mode,
            as_of,
            from_date,
            account_id: params.account_id,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SeriesQueryParams {
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub from_date: Option<String>,

    #[serde(default)]
    pub to_date: Option<String>,

    #[serde(default)]
    pub step_days: Option<String>,

    #[serde(default)]
    pub include_interest: Option<String>,
}

/// A balance series request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub mode: BalanceMode,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub step_days: u32,
    pub include_interest: bool,
}

impl SeriesQuery {
    pub fn new(mode: BalanceMode, from_date: NaiveDate, to_date: NaiveDate, step_days: u32) -> Self {
        Self {
            mode,
            from_date,
            to_date,
            step_days,
            include_interest: false,
        }
    }

    pub fn with_interest(mut self) -> Self {
        self.include_interest = true;
        self
    }

    /// Number of recorded points, counting both ends.
    pub fn point_count(&self) -> usize {
        series_point_count(self.from_date, self.to_date, self.step_days)
    }

    pub fn validate(&self, settings: &ProjectionSettings) -> Result<()> {
        check_step_days(self.step_days as i64, settings)?;
        if self.include_interest && self.mode != BalanceMode::Projected {
            return Err(ProjectionError::InterestRequiresProjected);
        }
        if self.to_date < self.from_date {
            return Err(ProjectionError::InvalidRange {
                from: self.from_date.to_string(),
                to: self.to_date.to_string(),
            });
        }
        let points = self.point_count();
        if points > settings.max_series_points {
            return Err(ProjectionError::SeriesTooLong {
                points,
                max_points: settings.max_series_points,
            });
        }
        Ok(())
    }

    /// Parses and validates raw parameters against `settings`.
    pub fn from_params(params: &SeriesQueryParams, settings: &ProjectionSettings) -> Result<Self> {
        let mode = parse_mode(params.mode.as_deref(), BalanceMode::Projected)?;
        let from_date = required_date(params.from_date.as_deref(), "from_date")?;
        let to_date = required_date(params.to_date.as_deref(), "to_date")?;

        let step_days = match params.step_days.as_deref().map(str::trim) {
            None | Some("") => settings.default_step_days as i64,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| ProjectionError::StepDaysNotInteger(raw.to_string()))?,
        };
        check_step_days(step_days, settings)?;

        let query = Self {
            mode,
            from_date,
            to_date,
            step_days: step_days as u32,
            include_interest: parse_flag(params.include_interest.as_deref()),
        };
        query.validate(settings)?;
        Ok(query)
    }
}

fn check_step_days(value: i64, settings: &ProjectionSettings) -> Result<()> {
    if value < settings.min_step_days as i64 || value > settings.max_step_days as i64 {
        return Err(ProjectionError::StepDaysOutOfRange {
            value,
            min: settings.min_step_days,
            max: settings.max_step_days,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct OccurrenceQueryParams {
    #[serde(default)]
    pub from_date: Option<String>,

    #[serde(default)]
    pub to_date: Option<String>,
}

impl OccurrenceQueryParams {
    /// The inclusive listing window.
    pub fn window(&self) -> Result<(NaiveDate, NaiveDate)> {
        let from = required_date(self.from_date.as_deref(), "from_date")?;
        let to = required_date(self.to_date.as_deref(), "to_date")?;
        Ok((from, to))
    }
}

/// One row of a point-in-time balance query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AccountBalance {
    pub id: AccountId,
    pub name: String,
    pub opening_date: NaiveDate,
    pub opening_balance_cents: i64,
    pub delta_cents: i64,
    pub balance_cents: i64,
    pub is_liability: bool,
    pub is_interest_bearing: bool,
    pub interest_apr_bps: i64,
    pub interest_compound: CompoundingScheme,
    pub exclude_from_dashboard: bool,
}

impl AccountBalance {
    pub fn new(account: &Account, delta_cents: i64) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            opening_date: account.opening_date,
            opening_balance_cents: account.opening_balance_cents,
            delta_cents,
            balance_cents: account.opening_balance_cents + delta_cents,
            is_liability: account.is_liability,
            is_interest_bearing: account.is_interest_bearing,
            interest_apr_bps: account.interest_apr_bps,
            interest_compound: account.interest_compound,
            exclude_from_dashboard: account.exclude_from_dashboard,
        }
    }
}

/// One row of an occurrence listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ScheduledOccurrence {
    pub schedule_id: ScheduleId,
    #[serde(rename = "occ_date")]
    pub date: NaiveDate,
    pub kind: ScheduleKind,
    pub name: String,
    pub amount_cents: i64,
    pub src_account_id: Option<AccountId>,
    pub dest_account_id: Option<AccountId>,
    pub description: Option<String>,
}

impl ScheduledOccurrence {
    pub fn new(schedule: &Schedule, occurrence: Occurrence) -> Self {
        Self {
            schedule_id: occurrence.schedule_id,
            date: occurrence.date,
            kind: occurrence.kind,
            name: schedule.name.clone(),
            amount_cents: occurrence.amount_cents,
            src_account_id: occurrence.src_account_id,
            dest_account_id: occurrence.dest_account_id,
            description: schedule.description.clone(),
        }
    }
}
