//! # Reporting Calendar
//!
//! Maps UTC timestamps onto the shop's calendar days and months.
//!
//! ## Timezone Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stored:    created_at in UTC                                          │
//! │  Reported:  one FIXED offset from configuration (default UTC+07:00)    │
//! │                                                                         │
//! │  daily_summary("2024-03-10") at UTC+07:00                              │
//! │                                                                         │
//! │      local   2024-03-10 00:00 ─────────────── 2024-03-11 00:00         │
//! │      UTC     2024-03-09 17:00 ─────────────── 2024-03-10 17:00         │
//! │                    [start                          end)                 │
//! │                                                                         │
//! │  The server's own zone is never consulted.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here reads the clock: callers pass `now` in.

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate, NaiveTime, Offset, Utc};

use crate::error::ValidationError;
use crate::DEFAULT_UTC_OFFSET_MINUTES;

/// Largest offset accepted, in minutes (UTC±14:00).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

// =============================================================================
// Reporting Timezone
// =============================================================================

/// The fixed UTC offset used to bucket transactions into days and months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingTimezone {
    offset: FixedOffset,
}

impl ReportingTimezone {
    /// Builds a timezone from an offset in minutes east of UTC.
    ///
    /// ## Example
    /// ```rust
    /// use kopi_core::calendar::ReportingTimezone;
    ///
    /// let wib = ReportingTimezone::from_offset_minutes(420).unwrap();
    /// assert_eq!(wib.offset_minutes(), 420);
    /// assert!(ReportingTimezone::from_offset_minutes(15 * 60).is_err());
    /// ```
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, ValidationError> {
        if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ValidationError::OutOfRange {
                field: "utc_offset_minutes".to_string(),
                min: -(MAX_UTC_OFFSET_MINUTES as i64),
                max: MAX_UTC_OFFSET_MINUTES as i64,
            });
        }

        let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: "utc_offset_minutes".to_string(),
                reason: "not a valid UTC offset".to_string(),
            }
        })?;

        Ok(ReportingTimezone { offset })
    }

    /// UTC itself.
    pub fn utc() -> Self {
        ReportingTimezone { offset: Utc.fix() }
    }

    /// Offset in minutes east of UTC.
    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Half-open UTC range `[start, end)` covering local calendar day `date`.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let local_midnight = date.and_time(NaiveTime::MIN);
        let shift = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        let start = (local_midnight - shift).and_utc();
        (start, start + Duration::days(1))
    }

    /// The local calendar date of a UTC instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// `HH:MM:SS` wall-clock time of a UTC instant.
    pub fn local_time_string(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format("%H:%M:%S").to_string()
    }

    /// Today's local date given the current instant.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_date(now)
    }

    /// SQLite date-function modifier that shifts UTC into this zone,
    /// e.g. `+420 minutes`.
    pub fn sqlite_modifier(&self) -> String {
        format!("{:+} minutes", self.offset_minutes())
    }
}

impl Default for ReportingTimezone {
    fn default() -> Self {
        Self::from_offset_minutes(DEFAULT_UTC_OFFSET_MINUTES).unwrap_or_else(|_| Self::utc())
    }
}

// =============================================================================
// Retention Policy
// =============================================================================

/// How long committed transactions are kept before the background sweep
/// deletes them. Reports silently lose anything older.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    window_months: u32,
}

impl RetentionPolicy {
    /// ## Errors
    /// A zero-month window would delete everything on the next sweep.
    pub fn new(window_months: u32) -> Result<Self, ValidationError> {
        if window_months == 0 {
            return Err(ValidationError::MustBePositive {
                field: "window_months".to_string(),
            });
        }
        Ok(RetentionPolicy { window_months })
    }

    pub fn window_months(&self) -> u32 {
        self.window_months
    }

    /// Transactions created strictly before this instant are expired.
    ///
    /// Month arithmetic clamps to the end of shorter months, so the cutoff
    /// for 2024-04-30 with a 2-month window is 2024-02-29 at the same time.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_months(Months::new(self.window_months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        RetentionPolicy {
            window_months: crate::DEFAULT_RETENTION_MONTHS,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
