use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Offset, Utc};

/// UTC+09:00. Every reminder time and quiet-hours boundary is read in this zone.
pub const HOME_UTC_OFFSET_MINUTES: i32 = 9 * 60;

/// The fixed civil timezone all reminder arithmetic is done in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilZone {
    offset: FixedOffset,
}

impl CivilZone {
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    pub fn home() -> Self {
        Self::from_offset_minutes(HOME_UTC_OFFSET_MINUTES).unwrap_or_else(Self::utc)
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Resolve a wall-clock timestamp in this zone to an absolute instant.
    pub fn to_utc(&self, civil: NaiveDateTime) -> DateTime<Utc> {
        let shift = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        (civil - shift).and_utc()
    }

    pub fn to_civil(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }
}

impl Default for CivilZone {
    fn default() -> Self {
        Self::home()
    }
}

/// Daily quiet-hours range `[start, end)`. Wraps midnight when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl QuietHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    // start == end is an empty window
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start == self.end {
            return false;
        }
        if self.wraps_midnight() {
            time >= self.start || time < self.end
        } else {
            time >= self.start && time < self.end
        }
    }

    /// Move a civil timestamp that lands inside the window to the window's end.
    ///
    /// The end is applied on the same civil date; if that yields a time-of-day
    /// earlier than the original, the date advances by one day first. Timestamps
    /// outside the window are returned unchanged.
    pub fn push_out(&self, civil: NaiveDateTime) -> NaiveDateTime {
        let time = civil.time();
        if !self.contains(time) {
            return civil;
        }

        let mut date = civil.date();
        if self.end < time {
            date = date.succ_opt().unwrap_or(date);
        }
        date.and_time(self.end)
    }
}
