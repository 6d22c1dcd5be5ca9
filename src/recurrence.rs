//! Expansion of a recurring schedule into dated occurrences.
//!
//! Stepping starts at the schedule's anchor date and advances by the
//! schedule's frequency and interval. Monthly and yearly steps land on the
//! target day-of-month, clamped to the length of the month they land in.
//! The walk is an explicit iterator bounded by the window end (or the
//! schedule's end date, whichever comes first).

use crate::revisions::{self, RevisionTimeline};
use crate::schema::{Frequency, Occurrence, Schedule};
use crate::utils::{
    add_days, clamped_date, date_from_month_index, days_between, month_index, months_between,
};
use chrono::{Datelike, NaiveDate};

/// First date the schedule's pattern aligns to.
///
/// Weekly schedules with a weekday anchor move forward (inclusive) to the
/// next matching weekday; everything else starts on the start date.
pub fn anchor_date(schedule: &Schedule) -> NaiveDate {
    match (schedule.freq, schedule.by_weekday) {
        (Frequency::Weekly, Some(weekday)) => {
            let current = schedule.start_date.weekday().num_days_from_sunday() as i64;
            let shift = (weekday as i64 - current).rem_euclid(7);
            add_days(schedule.start_date, shift).unwrap_or(schedule.start_date)
        }
        _ => schedule.start_date,
    }
}

pub fn target_day_of_month(schedule: &Schedule) -> u32 {
    schedule
        .by_month_day
        .unwrap_or_else(|| schedule.start_date.day())
}

fn interval(schedule: &Schedule) -> i64 {
    schedule.interval.max(1) as i64
}

/// The occurrence after `current`, or `None` past the representable range.
pub fn next_occurrence_date(schedule: &Schedule, dom: u32, current: NaiveDate) -> Option<NaiveDate> {
    let interval = interval(schedule);
    match schedule.freq {
        Frequency::Daily => add_days(current, interval),
        Frequency::Weekly => add_days(current, 7 * interval),
        Frequency::Monthly => date_from_month_index(month_index(current) + interval, dom),
        Frequency::Yearly => {
            let year = i32::try_from(current.year() as i64 + interval).ok()?;
            clamped_date(year, schedule.start_date.month(), dom)
        }
    }
}

/// Jumps over whole steps that end before `window_start`.
///
/// The result is exactly the date the step function would reach after the
/// skipped steps, and never later than the first occurrence on or after
/// `window_start`.
fn fast_forward(schedule: &Schedule, dom: u32, anchor: NaiveDate, window_start: NaiveDate) -> Option<NaiveDate> {
    if anchor >= window_start {
        return Some(anchor);
    }
    let interval = interval(schedule);
    match schedule.freq {
        Frequency::Daily | Frequency::Weekly => {
            let step = if schedule.freq == Frequency::Weekly {
                7 * interval
            } else {
                interval
            };
            let skipped = days_between(anchor, window_start) / step;
            add_days(anchor, skipped * step)
        }
        Frequency::Monthly => {
            let skipped = months_between(anchor, window_start) / interval;
            if skipped == 0 {
                return Some(anchor);
            }
            date_from_month_index(month_index(anchor) + skipped * interval, dom)
        }
        Frequency::Yearly => {
            let skipped = (window_start.year() - anchor.year()) as i64 / interval;
            if skipped == 0 {
                return Some(anchor);
            }
            let year = i32::try_from(anchor.year() as i64 + skipped * interval).ok()?;
            clamped_date(year, schedule.start_date.month(), dom)
        }
    }
}

/// Lazy, ascending sequence of a schedule's occurrences inside a window.
///
/// Clone before consuming to replay the walk from the same point.
#[derive(Debug, Clone)]
pub struct OccurrenceIter<'a> {
    schedule: &'a Schedule,
    timeline: Option<&'a RevisionTimeline>,
    window_start: NaiveDate,
    cutoff: NaiveDate,
    dom: u32,
    next: Option<NaiveDate>,
}

impl<'a> Iterator for OccurrenceIter<'a> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        loop {
            let current = self.next?;
            if current > self.cutoff {
                self.next = None;
                return None;
            }
            self.next = next_occurrence_date(self.schedule, self.dom, current);
            if current >= self.window_start {
                return Some(Occurrence {
                    schedule_id: self.schedule.id,
                    date: current,
                    kind: self.schedule.kind,
                    amount_cents: revisions::resolve(self.schedule, self.timeline, current),
                    src_account_id: self.schedule.src_account_id,
                    dest_account_id: self.schedule.dest_account_id,
                });
            }
        }
    }
}

/// Occurrences of `schedule` dated in `[window_start, window_end]` and not
/// after the schedule's end date. Inactive schedules yield nothing.
pub fn expand<'a>(
    schedule: &'a Schedule,
    timeline: Option<&'a RevisionTimeline>,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> OccurrenceIter<'a> {
    let cutoff = match schedule.end_date {
        Some(end) if end < window_end => end,
        _ => window_end,
    };
    let dom = target_day_of_month(schedule);
    let next = if schedule.is_active {
        fast_forward(schedule, dom, anchor_date(schedule), window_start)
    } else {
        None
    };

    OccurrenceIter {
        schedule,
        timeline,
        window_start,
        cutoff,
        dom,
        next,
    }
}
