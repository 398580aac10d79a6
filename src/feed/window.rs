use chrono::{DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Coarse time range selector exposed to dashboard consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    #[default]
    Week,
    Month,
}

impl Period {
    /// Exact, case-sensitive keyword match. Anything else falls back to `Week`.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "today" => Self::Today,
            "month" => Self::Month,
            _ => Self::Week,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Human phrase used in log lines ("updated this week").
    pub fn describe(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "this week",
            Self::Month => "this month",
        }
    }
}

/// Resolved time window in a reference timezone.
///
/// `end` is only set for `Period::Today`; the other periods are open-ended.
#[derive(Debug, Clone)]
pub struct TimeWindow<Tz: TimeZone> {
    pub period: Period,
    pub start: DateTime<Tz>,
    pub end: Option<DateTime<Tz>>,
}

impl<Tz: TimeZone> TimeWindow<Tz> {
    pub fn resolve(period: Period, now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();

        let (start, end) = match period {
            Period::Today => (
                local_wall_clock(&tz, today, 1),
                Some(local_wall_clock(&tz, today, 23)),
            ),
            Period::Week => {
                let start = now
                    .clone()
                    .checked_sub_days(Days::new(7))
                    .unwrap_or_else(|| now.clone() - Duration::days(7));
                (start, None)
            }
            Period::Month => {
                let first = today.with_day(1).unwrap_or(today);
                (local_wall_clock(&tz, first, 0), None)
            }
        };

        Self { period, start, end }
    }

    /// Window membership shared by the repository and run filters.
    ///
    /// The instant is converted into the window's timezone; it must not be
    /// before `start` and, when the window is bounded, not after `end`.
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        let local = instant.with_timezone(&self.start.timezone());
        if local < self.start {
            return false;
        }
        match &self.end {
            Some(end) => local <= *end,
            None => true,
        }
    }
}

/// `date` at `hour`:00:00 local time.
///
/// Ambiguous wall-clock times resolve to the earlier instant; times skipped by
/// a DST transition move forward to the first valid instant after the gap.
fn local_wall_clock<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> DateTime<Tz> {
    let naive = date.and_hms_opt(hour, 0, 0).unwrap_or_default();
    resolve_local(tz, naive)
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // DST gaps are at most a few hours wide; probe forward minute by minute.
            (1..=4 * 60)
                .find_map(|minutes| {
                    tz.from_local_datetime(&(naive + Duration::minutes(minutes)))
                        .earliest()
                })
                .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        }
    }
}
