//! Amount revisions for a single schedule.
//!
//! A revision replaces the schedule's amount from its effective date
//! onwards. For an occurrence on date `D` the revision with the latest
//! effective date `<= D` applies; without one the base amount applies.
//! When several revisions share an effective date, the one that appears
//! last in storage order (the most recently created) wins.

use crate::schema::{Schedule, ScheduleId, ScheduleRevision};
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevisionTimeline {
    /// (effective_date, amount), sorted by date; ties keep storage order.
    steps: Vec<(NaiveDate, i64)>,
}

impl RevisionTimeline {
    pub fn new<'a, I>(revisions: I) -> Self
    where
        I: IntoIterator<Item = &'a ScheduleRevision>,
    {
        let mut steps: Vec<(NaiveDate, i64)> = revisions
            .into_iter()
            .map(|r| (r.effective_date, r.amount_cents))
            .collect();
        // Stable sort keeps insertion order among equal effective dates.
        steps.sort_by_key(|(date, _)| *date);
        Self { steps }
    }

    /// Amount in effect on `date`, or `None` if no revision is effective yet.
    pub fn amount_on(&self, date: NaiveDate) -> Option<i64> {
        let idx = self.steps.partition_point(|(effective, _)| *effective <= date);
        idx.checked_sub(1).map(|i| self.steps[i].1)
    }

    pub fn resolve(&self, base_amount_cents: i64, date: NaiveDate) -> i64 {
        self.amount_on(date).unwrap_or(base_amount_cents)
    }
}

/// Groups revisions by schedule, preserving storage order within each group.
pub fn timelines_by_schedule(revisions: &[ScheduleRevision]) -> HashMap<ScheduleId, RevisionTimeline> {
    let mut grouped: HashMap<ScheduleId, Vec<&ScheduleRevision>> = HashMap::new();
    for revision in revisions {
        grouped.entry(revision.schedule_id).or_default().push(revision);
    }
    grouped
        .into_iter()
        .map(|(id, revs)| (id, RevisionTimeline::new(revs)))
        .collect()
}

/// Amount of `schedule` on `date` given its revisions.
pub fn resolve(schedule: &Schedule, timeline: Option<&RevisionTimeline>, date: NaiveDate) -> i64 {
    match timeline {
        Some(timeline) => timeline.resolve(schedule.amount_cents, date),
        None => schedule.amount_cents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rev(id: i64, schedule_id: ScheduleId, date: &str, amount: i64) -> ScheduleRevision {
        ScheduleRevision {
            id,
            schedule_id,
            effective_date: d(date),
            amount_cents: amount,
        }
    }

    #[test]
    fn test_base_amount_before_any_revision() {
        let revs = vec![rev(1, 7, "2026-03-01", 2500)];
        let timeline = RevisionTimeline::new(&revs);
        assert_eq!(timeline.resolve(2000, d("2026-02-28")), 2000);
        assert_eq!(timeline.resolve(2000, d("2026-03-01")), 2500);
        assert_eq!(timeline.resolve(2000, d("2027-01-01")), 2500);
    }

    #[test]
    fn test_latest_qualifying_revision_wins() {
        let revs = vec![
            rev(1, 7, "2026-06-01", 3000),
            rev(2, 7, "2026-03-01", 2500),
            rev(3, 7, "2026-09-01", 3500),
        ];
        let timeline = RevisionTimeline::new(&revs);
        assert_eq!(timeline.resolve(2000, d("2026-01-15")), 2000);
        assert_eq!(timeline.resolve(2000, d("2026-04-15")), 2500);
        assert_eq!(timeline.resolve(2000, d("2026-06-01")), 3000);
        assert_eq!(timeline.resolve(2000, d("2026-08-31")), 3000);
        assert_eq!(timeline.resolve(2000, d("2026-12-01")), 3500);
    }

    #[test]
    fn test_same_effective_date_most_recent_insertion_wins() {
        let revs = vec![
            rev(10, 7, "2026-03-01", 2500),
            rev(11, 7, "2026-03-01", 2700),
            rev(12, 7, "2026-03-01", 2600),
        ];
        let timeline = RevisionTimeline::new(&revs);
        assert_eq!(timeline.resolve(2000, d("2026-03-01")), 2600);
        assert_eq!(timeline.resolve(2000, d("2026-05-01")), 2600);
    }

    #[test]
    fn test_grouping_keeps_schedules_apart() {
        let revs = vec![
            rev(1, 1, "2026-01-10", 111),
            rev(2, 2, "2026-01-10", 222),
            rev(3, 1, "2026-02-10", 333),
        ];
        let timelines = timelines_by_schedule(&revs);
        assert_eq!(timelines.len(), 2);
        assert_eq!(timelines[&1].amount_on(d("2026-01-10")), Some(111));
        assert_eq!(timelines[&1].amount_on(d("2026-02-10")), Some(333));
        assert_eq!(timelines[&2].amount_on(d("2026-02-10")), Some(222));
        assert_eq!(timelines[&2].amount_on(d("2026-01-09")), None);
    }
}
