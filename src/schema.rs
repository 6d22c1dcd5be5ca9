use crate::error::{ProjectionError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type AccountId = i64;
pub type ScheduleId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    #[serde(alias = "I")]
    #[schemars(description = "Money arriving in the destination account")]
    Income,

    #[serde(alias = "E")]
    #[schemars(description = "Money leaving the source account")]
    Expense,

    #[serde(alias = "T")]
    #[schemars(description = "Money moving from the source account to the destination account")]
    Transfer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[serde(alias = "D")]
    Daily,
    #[serde(alias = "W")]
    Weekly,
    #[serde(alias = "M")]
    Monthly,
    #[serde(alias = "Y")]
    Yearly,
}

/// How interest compounds on an interest-bearing account.
///
/// Codes that are neither daily nor monthly deserialize to `Unrecognized`
/// and accrue with the daily formula.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompoundingScheme {
    #[default]
    #[serde(alias = "D")]
    Daily,

    #[serde(alias = "M")]
    Monthly,

    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BalanceMode {
    #[schemars(description = "Opening balance plus recorded ledger entries only")]
    Actual,

    #[schemars(
        description = "Recorded entries plus scheduled occurrences not yet realized as entries"
    )]
    Projected,
}

impl fmt::Display for BalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceMode::Actual => write!(f, "actual"),
            BalanceMode::Projected => write!(f, "projected"),
        }
    }
}

impl FromStr for BalanceMode {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "actual" => Ok(BalanceMode::Actual),
            "projected" => Ok(BalanceMode::Projected),
            other => Err(ProjectionError::UnsupportedMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Account {
    pub id: AccountId,

    pub name: String,

    #[schemars(description = "First date on which ledger entries count towards the balance")]
    pub opening_date: NaiveDate,

    #[schemars(description = "Balance on the opening date, in minor units (cents)")]
    pub opening_balance_cents: i64,

    #[serde(default)]
    pub is_liability: bool,

    #[serde(default)]
    pub is_interest_bearing: bool,

    #[serde(default)]
    #[schemars(description = "Annual rate in basis points (1899 = 18.99%)")]
    pub interest_apr_bps: i64,

    #[serde(default)]
    pub interest_compound: CompoundingScheme,

    #[serde(default)]
    pub exclude_from_dashboard: bool,

    #[serde(default)]
    #[schemars(description = "Archived accounts are left out of every balance computation")]
    pub archived_at: Option<NaiveDate>,
}

impl Account {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn accrues_interest(&self) -> bool {
        self.is_interest_bearing && self.interest_apr_bps > 0
    }
}

fn default_interval() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Schedule {
    pub id: ScheduleId,

    pub name: String,

    pub kind: ScheduleKind,

    #[schemars(description = "Base amount in minor units, strictly positive")]
    pub amount_cents: i64,

    #[serde(default)]
    pub src_account_id: Option<AccountId>,

    #[serde(default)]
    pub dest_account_id: Option<AccountId>,

    pub start_date: NaiveDate,

    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    pub freq: Frequency,

    #[serde(default = "default_interval")]
    pub interval: u32,

    #[serde(default)]
    #[schemars(description = "Day-of-month anchor (1-31), clamped to the month length")]
    pub by_month_day: Option<u32>,

    #[serde(default)]
    #[schemars(description = "Day-of-week anchor for weekly schedules (0 = Sunday .. 6 = Saturday)")]
    pub by_weekday: Option<u32>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Schedule {
    /// Checks the invariants the CRUD layer is expected to enforce.
    pub fn validate(&self) -> Result<()> {
        let fail = |details: String| ProjectionError::ValidationError {
            entity: format!("schedule #{} '{}'", self.id, self.name),
            details,
        };

        if self.amount_cents <= 0 {
            return Err(fail(format!(
                "amount_cents must be > 0 (got {})",
                self.amount_cents
            )));
        }
        if self.interval < 1 {
            return Err(fail("interval must be >= 1".to_string()));
        }
        if let Some(dom) = self.by_month_day {
            if !(1..=31).contains(&dom) {
                return Err(fail(format!("by_month_day must be 1..31 (got {})", dom)));
            }
        }
        if let Some(dow) = self.by_weekday {
            if dow > 6 {
                return Err(fail(format!("by_weekday must be 0..6 (got {})", dow)));
            }
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(fail(format!(
                    "end_date {} is before start_date {}",
                    end, self.start_date
                )));
            }
        }

        match (self.kind, self.src_account_id, self.dest_account_id) {
            (ScheduleKind::Income, None, Some(_)) => Ok(()),
            (ScheduleKind::Income, _, _) => Err(fail(
                "income schedules require dest_account_id and must not set src_account_id"
                    .to_string(),
            )),
            (ScheduleKind::Expense, Some(_), None) => Ok(()),
            (ScheduleKind::Expense, _, _) => Err(fail(
                "expense schedules require src_account_id and must not set dest_account_id"
                    .to_string(),
            )),
            (ScheduleKind::Transfer, Some(src), Some(dest)) if src != dest => Ok(()),
            (ScheduleKind::Transfer, _, _) => Err(fail(
                "transfer schedules require distinct src_account_id and dest_account_id"
                    .to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ScheduleRevision {
    pub id: i64,
    pub schedule_id: ScheduleId,

    #[schemars(description = "Occurrences on or after this date use the replacement amount")]
    pub effective_date: NaiveDate,

    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Entry {
    pub id: i64,

    pub entry_date: NaiveDate,

    pub name: String,

    pub amount_cents: i64,

    #[serde(default)]
    pub src_account_id: Option<AccountId>,

    #[serde(default)]
    pub dest_account_id: Option<AccountId>,

    #[serde(default)]
    #[schemars(description = "Schedule whose occurrence on entry_date this entry realizes")]
    pub schedule_id: Option<ScheduleId>,

    #[serde(default)]
    pub description: Option<String>,
}

impl Entry {
    pub fn deltas(&self) -> impl Iterator<Item = (AccountId, i64)> {
        signed_deltas(self.src_account_id, self.dest_account_id, self.amount_cents)
    }
}

/// One concrete dated event produced from a schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Occurrence {
    pub schedule_id: ScheduleId,
    pub date: NaiveDate,
    pub kind: ScheduleKind,
    pub amount_cents: i64,
    pub src_account_id: Option<AccountId>,
    pub dest_account_id: Option<AccountId>,
}

impl Occurrence {
    pub fn deltas(&self) -> impl Iterator<Item = (AccountId, i64)> {
        signed_deltas(self.src_account_id, self.dest_account_id, self.amount_cents)
    }
}

/// The source account loses the amount, the destination gains it.
fn signed_deltas(
    src: Option<AccountId>,
    dest: Option<AccountId>,
    amount_cents: i64,
) -> impl Iterator<Item = (AccountId, i64)> {
    src.map(|id| (id, -amount_cents))
        .into_iter()
        .chain(dest.map(|id| (id, amount_cents)))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalancePoint {
    pub account_id: AccountId,
    pub name: String,
    pub balance_cents: i64,
}
