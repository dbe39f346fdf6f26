// Posting cadence: hour / weekday / ISO-week histograms and burst windows.
//
// Burst detection is a greedy leftmost scan over sorted timestamps. It is not
// an optimal clustering; downstream consumers compare burst counts across
// runs, so the exact scan rules below must stay stable.

use chrono::{DateTime, Datelike, Duration, SecondsFormat, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::message::ContentItem;

/// Minimum posts inside one window to count as a burst.
pub const BURST_MIN_POSTS: usize = 5;

/// Width of the burst window, in hours.
pub const BURST_WINDOW_HOURS: i64 = 2;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A run of at least `BURST_MIN_POSTS` posts within one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekCount {
    pub week: String,
    pub count: u32,
}

/// Histogram counts for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineBuckets {
    /// Index = hour of day (UTC), always 24 entries.
    pub per_hour: Vec<u32>,
    /// Monday first, always 7 entries.
    pub per_day_of_week: Vec<DayCount>,
    /// ISO weeks (`YYYY-Www`) in ascending order; only weeks with posts.
    pub per_week: Vec<WeekCount>,
}

impl Default for TimelineBuckets {
    fn default() -> Self {
        Self {
            per_hour: vec![0; 24],
            per_day_of_week: WEEKDAYS
                .iter()
                .map(|d| DayCount {
                    day: weekday_key(*d).to_string(),
                    count: 0,
                })
                .collect(),
            per_week: Vec::new(),
        }
    }
}

impl TimelineBuckets {
    pub fn total(&self) -> u32 {
        self.per_hour.iter().sum()
    }
}

/// Cadence statistics for a set of posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub buckets: TimelineBuckets,
    pub burst_periods: Vec<BurstPeriod>,
    pub avg_posts_per_day: f64,
    pub last_seen_active: Option<DateTime<Utc>>,
    pub total_messages: usize,
}

impl Timeline {
    /// The zero-valued result for an empty channel.
    pub fn empty() -> Self {
        Self {
            buckets: TimelineBuckets::default(),
            burst_periods: Vec::new(),
            avg_posts_per_day: 0.0,
            last_seen_active: None,
            total_messages: 0,
        }
    }

    /// JSON shape of the `posting_cadence` artifact.
    pub fn cadence_json(&self) -> serde_json::Value {
        serde_json::json!({
            "per_hour": self.buckets.per_hour,
            "per_day_of_week": self.buckets.per_day_of_week,
            "per_week": self.buckets.per_week,
            "avg_posts_per_day": self.avg_posts_per_day,
            "burst_periods": self.burst_periods.iter().map(|b| serde_json::json!({
                "start": b.start.to_rfc3339_opts(SecondsFormat::Secs, true),
                "end": b.end.to_rfc3339_opts(SecondsFormat::Secs, true),
                "count": b.count,
            })).collect::<Vec<_>>(),
        })
    }
}

fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

/// ISO week key, e.g. `2024-W09`. Uses the ISO year, which can differ from
/// the calendar year around January 1st.
pub fn iso_week_key(ts: &DateTime<Utc>) -> String {
    let week = ts.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Build hour / weekday / week histograms.
pub fn bucket_timestamps(timestamps: &[DateTime<Utc>]) -> TimelineBuckets {
    let mut buckets = TimelineBuckets::default();
    let mut weeks: std::collections::BTreeMap<String, u32> = std::collections::BTreeMap::new();

    for ts in timestamps {
        buckets.per_hour[ts.hour() as usize] += 1;
        let dow = ts.weekday().num_days_from_monday() as usize;
        buckets.per_day_of_week[dow].count += 1;
        *weeks.entry(iso_week_key(ts)).or_insert(0) += 1;
    }

    buckets.per_week = weeks
        .into_iter()
        .map(|(week, count)| WeekCount { week, count })
        .collect();
    buckets
}

/// Greedy leftmost burst scan over ascending timestamps.
///
/// From position `i`, extend `j` while `t[j] - t[i] <= window`. A window of
/// `BURST_MIN_POSTS` or more is emitted and the scan resumes at `j`;
/// otherwise the scan moves to `i + 1`.
pub fn detect_bursts(sorted: &[DateTime<Utc>]) -> Vec<BurstPeriod> {
    let window = Duration::hours(BURST_WINDOW_HOURS);
    let mut bursts = Vec::new();
    let mut i = 0;

    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] - sorted[i] <= window {
            j += 1;
        }
        let count = j - i;
        if count >= BURST_MIN_POSTS {
            bursts.push(BurstPeriod {
                start: sorted[i],
                end: sorted[j - 1],
                count,
            });
            i = j;
        } else {
            i += 1;
        }
    }

    bursts
}

/// Posts per day over the observed span, rounded to 2 decimals.
///
/// Spans shorter than a day count as one day. With fewer than two posts the
/// raw count is returned.
pub fn average_posts_per_day(sorted: &[DateTime<Utc>]) -> f64 {
    let n = sorted.len();
    if n < 2 {
        return n as f64;
    }
    let span_secs = (sorted[n - 1] - sorted[0]).num_seconds() as f64;
    let span_days = (span_secs / 86_400.0).max(1.0);
    round_to(n as f64 / span_days, 2)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Run the full cadence analysis over a batch of items.
pub fn analyze(items: &[ContentItem]) -> Timeline {
    if items.is_empty() {
        return Timeline::empty();
    }

    let mut timestamps: Vec<DateTime<Utc>> = items.iter().map(|i| i.timestamp).collect();
    timestamps.sort();

    Timeline {
        buckets: bucket_timestamps(&timestamps),
        burst_periods: detect_bursts(&timestamps),
        avg_posts_per_day: average_posts_per_day(&timestamps),
        last_seen_active: timestamps.last().copied(),
        total_messages: timestamps.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, 0).unwrap()
    }

    #[test]
    fn window_edge_is_inclusive() {
        // Five posts, last one exactly two hours after the first.
        let ts = vec![at(10, 0), at(10, 30), at(11, 0), at(11, 30), at(12, 0)];
        let bursts = detect_bursts(&ts);
        assert_eq!(bursts.len(), 1);
        assert_eq!(bursts[0].count, 5);
        assert_eq!(bursts[0].end, at(12, 0));
    }

    #[test]
    fn one_minute_past_window_is_not_a_burst() {
        let ts = vec![at(10, 0), at(10, 30), at(11, 0), at(11, 30), at(12, 1)];
        assert!(detect_bursts(&ts).is_empty());
    }

    #[test]
    fn scan_advances_by_one_on_miss() {
        // The 09:00 window holds a single post; the burst starts at 11:10.
        let ts = vec![
            at(9, 0),
            at(11, 10),
            at(11, 20),
            at(11, 30),
            at(11, 40),
            at(11, 50),
        ];
        let bursts = detect_bursts(&ts);
        assert_eq!(bursts.len(), 1);
        assert_eq!(bursts[0].start, at(11, 10));
        assert_eq!(bursts[0].count, 5);
    }

    #[test]
    fn iso_week_uses_iso_year() {
        // 2021-01-03 is a Sunday belonging to ISO week 53 of 2020.
        let ts = Utc.with_ymd_and_hms(2021, 1, 3, 8, 0, 0).unwrap();
        assert_eq!(iso_week_key(&ts), "2020-W53");
    }

    #[test]
    fn average_uses_at_least_one_day() {
        let ts = vec![at(1, 0), at(2, 0), at(3, 0)];
        assert_eq!(average_posts_per_day(&ts), 3.0);
        assert_eq!(average_posts_per_day(&ts[..1]), 1.0);
        assert_eq!(average_posts_per_day(&[]), 0.0);
    }

    #[test]
    fn empty_input_is_zero_valued() {
        let timeline = analyze(&[]);
        assert_eq!(timeline.total_messages, 0);
        assert_eq!(timeline.buckets.total(), 0);
        assert_eq!(timeline.buckets.per_hour.len(), 24);
        assert_eq!(timeline.buckets.per_day_of_week.len(), 7);
        assert!(timeline.last_seen_active.is_none());
    }
}
