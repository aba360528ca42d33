//! Daily trigger computation in a named timezone.
//!
//! The schedule loop sleeps until the next computed firing instant and
//! recomputes after each firing, so daylight-saving shifts are absorbed
//! without drift. Fall-back days repeat the configured hour; the trigger
//! fires on the earliest occurrence. Spring-forward days can erase it
//! entirely; the firing shifts past the gap. Either way the trigger fires
//! exactly once per calendar day.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

/// A recurring daily wall-clock trigger.
#[derive(Debug, Clone)]
pub struct DailyTrigger {
    hour: u32,
    minute: u32,
    tz: Tz,
}

impl DailyTrigger {
    /// Build a trigger for `hour:minute` local time in `timezone`.
    ///
    /// Fails on an out-of-range time or an unknown IANA timezone name.
    /// This is the only fatal scheduling path — everything after
    /// construction recomputes from the clock and cannot fail.
    pub fn new(hour: u32, minute: u32, timezone: &str) -> Result<Self> {
        if hour > 23 {
            return Err(anyhow!("Trigger hour out of range: {hour}"));
        }
        if minute > 59 {
            return Err(anyhow!("Trigger minute out of range: {minute}"));
        }
        let tz: Tz = timezone
            .parse()
            .map_err(|_| anyhow!("Unknown timezone: {timezone}"))?;

        Ok(Self { hour, minute, tz })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// The first firing instant strictly after `after`.
    pub fn next_fire(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = after.with_timezone(&self.tz).date_naive();
        loop {
            if let Some(fire) = self.fire_instant_on(date) {
                if fire > after {
                    return fire;
                }
            }
            date += Duration::days(1);
        }
    }

    /// The UTC instant at which this trigger fires on `date`, if the
    /// configured wall-clock time maps to an instant that day.
    fn fire_instant_on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        match self
            .tz
            .with_ymd_and_hms(date.year(), date.month(), date.day(), self.hour, self.minute, 0)
        {
            LocalResult::Single(local) => Some(local.with_timezone(&Utc)),
            // Fall-back repeats the hour — fire on the first occurrence.
            LocalResult::Ambiguous(first, _second) => Some(first.with_timezone(&Utc)),
            // Spring-forward erased the configured time — shift past the gap.
            // 30-minute steps cover zones with half-hour transitions.
            LocalResult::None => {
                let mut shifted = date.and_hms_opt(self.hour, self.minute, 0)? + Duration::minutes(30);
                for _ in 0..6 {
                    match self.tz.from_local_datetime(&shifted) {
                        LocalResult::Single(local) => return Some(local.with_timezone(&Utc)),
                        LocalResult::Ambiguous(first, _) => return Some(first.with_timezone(&Utc)),
                        LocalResult::None => shifted += Duration::minutes(30),
                    }
                }
                None
            }
        }
    }
}

impl fmt::Display for DailyTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02} {}", self.hour, self.minute, self.tz)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
