use crate::error::{ProjectionError, Result};
use crate::schema::{CompoundingScheme, Entry, ScheduleRevision};
use crate::store::LedgerSnapshot;
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

impl LedgerSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: LedgerSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        debug!(
            "Loaded ledger snapshot: {} accounts, {} schedules, {} revisions, {} entries",
            snapshot.accounts.len(),
            snapshot.schedules.len(),
            snapshot.revisions.len(),
            snapshot.entries.len()
        );
        Ok(snapshot)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(LedgerSnapshot)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    /// Enforces the row invariants the CRUD layer normally guarantees.
    ///
    /// References from schedules and entries to missing accounts are not
    /// errors: deleted accounts must not make historical data unreadable.
    pub fn validate(&self) -> Result<()> {
        let mut account_ids = HashSet::new();
        for account in &self.accounts {
            if !account_ids.insert(account.id) {
                return Err(invalid(
                    format!("account #{}", account.id),
                    "duplicate id".to_string(),
                ));
            }
            if account.name.trim().is_empty() {
                return Err(invalid(
                    format!("account #{}", account.id),
                    "name is required".to_string(),
                ));
            }
            if account.interest_apr_bps < 0 {
                return Err(invalid(
                    format!("account '{}'", account.name),
                    format!(
                        "interest_apr_bps must be >= 0 (got {})",
                        account.interest_apr_bps
                    ),
                ));
            }
            if account.is_interest_bearing
                && account.interest_compound == CompoundingScheme::Unrecognized
            {
                warn!(
                    "Account '{}' has an unrecognized compounding scheme; daily compounding will be used",
                    account.name
                );
            }
        }

        let mut schedule_ids = HashSet::new();
        for schedule in &self.schedules {
            if !schedule_ids.insert(schedule.id) {
                return Err(invalid(
                    format!("schedule #{}", schedule.id),
                    "duplicate id".to_string(),
                ));
            }
            schedule.validate()?;
        }

        for revision in &self.revisions {
            validate_revision(revision, &schedule_ids)?;
        }

        for entry in &self.entries {
            validate_entry(entry)?;
        }

        Ok(())
    }
}

fn invalid(entity: String, details: String) -> ProjectionError {
    ProjectionError::ValidationError { entity, details }
}

fn validate_revision(revision: &ScheduleRevision, schedule_ids: &HashSet<i64>) -> Result<()> {
    let entity = format!("revision #{}", revision.id);
    if !schedule_ids.contains(&revision.schedule_id) {
        return Err(invalid(
            entity,
            format!("unknown schedule_id {}", revision.schedule_id),
        ));
    }
    if revision.amount_cents <= 0 {
        return Err(invalid(
            entity,
            format!("amount_cents must be > 0 (got {})", revision.amount_cents),
        ));
    }
    Ok(())
}

fn validate_entry(entry: &Entry) -> Result<()> {
    let entity = format!("entry #{} '{}'", entry.id, entry.name);
    if entry.amount_cents <= 0 {
        return Err(invalid(
            entity,
            format!("amount_cents must be > 0 (got {})", entry.amount_cents),
        ));
    }
    match (entry.src_account_id, entry.dest_account_id) {
        (None, None) => Err(invalid(
            entity,
            "must set src_account_id and/or dest_account_id".to_string(),
        )),
        (Some(src), Some(dest)) if src == dest => Err(invalid(
            entity,
            "src_account_id and dest_account_id must differ".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "accounts": [
            {"id": 1, "name": "Checking", "opening_date": "2026-01-01", "opening_balance_cents": 10000},
            {"id": 2, "name": "Card", "opening_date": "2026-01-01", "opening_balance_cents": -5000,
             "is_liability": true, "is_interest_bearing": true, "interest_apr_bps": 1899,
             "interest_compound": "M"}
        ],
        "schedules": [
            {"id": 1, "name": "Paycheck", "kind": "income", "amount_cents": 2000,
             "dest_account_id": 1, "start_date": "2026-01-01", "freq": "monthly"}
        ],
        "revisions": [
            {"id": 1, "schedule_id": 1, "effective_date": "2026-03-01", "amount_cents": 2500}
        ],
        "entries": [
            {"id": 1, "entry_date": "2026-01-01", "name": "Paycheck", "amount_cents": 2000,
             "dest_account_id": 1, "schedule_id": 1}
        ]
    }"#;

    #[test]
    fn test_load_snapshot_from_json() {
        let snapshot = LedgerSnapshot::from_json_str(SNAPSHOT).unwrap();
        assert_eq!(snapshot.accounts.len(), 2);
        assert_eq!(
            snapshot.accounts[1].interest_compound,
            CompoundingScheme::Monthly
        );
        assert_eq!(snapshot.schedules[0].interval, 1);
        assert_eq!(snapshot.entries[0].schedule_id, Some(1));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let snapshot = LedgerSnapshot::from_json_str("{}").unwrap();
        assert!(snapshot.accounts.is_empty());
        assert!(snapshot.entries.is_empty());
    }

    #[test]
    fn test_rejects_revision_for_unknown_schedule() {
        let json = r#"{
            "revisions": [{"id": 1, "schedule_id": 9, "effective_date": "2026-03-01", "amount_cents": 2500}]
        }"#;
        let err = LedgerSnapshot::from_json_str(json).unwrap_err();
        assert!(matches!(err, ProjectionError::ValidationError { .. }));
    }

    #[test]
    fn test_rejects_entry_without_accounts() {
        let json = r#"{
            "entries": [{"id": 1, "entry_date": "2026-01-01", "name": "Nowhere", "amount_cents": 10}]
        }"#;
        assert!(LedgerSnapshot::from_json_str(json).is_err());
    }

    #[test]
    fn test_malformed_json_is_a_serialization_error() {
        let err = LedgerSnapshot::from_json_str("{\"accounts\": [").unwrap_err();
        assert!(matches!(err, ProjectionError::SerializationError(_)));
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = LedgerSnapshot::schema_as_json().unwrap();
        assert!(schema_json.contains("accounts"));
        assert!(schema_json.contains("opening_balance_cents"));
        assert!(schema_json.contains("effective_date"));
    }

    #[test]
    fn test_round_trip_through_file() {
        let snapshot = LedgerSnapshot::from_json_str(SNAPSHOT).unwrap();
        let path = std::env::temp_dir().join(format!(
            "balance-projection-snapshot-{}.json",
            std::process::id()
        ));
        fs::write(&path, snapshot.to_json_pretty().unwrap()).unwrap();
        let reloaded = LedgerSnapshot::from_path(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(reloaded.accounts, snapshot.accounts);
        assert_eq!(reloaded.schedules, snapshot.schedules);
    }
}
