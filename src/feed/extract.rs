use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};
use thiserror::Error;

use super::parser::ItemNode;

/// Layout of an RSS `pubDate` once the weekday prefix has been split off.
const PUB_DATE_LAYOUT: &str = "%d %b %Y %H:%M:%S %z";

/// Naive layouts accepted for window bounds, tried in order.
const NAIVE_TIMESTAMP_LAYOUTS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts accepted for window bounds besides RFC 3339.
const OFFSET_TIMESTAMP_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// A `pubDate` that does not match the expected RFC 822 layout.
///
/// Recovered locally: the item carrying it is dropped.
#[derive(Debug, Error)]
pub enum DateParseError {
    #[error("missing weekday prefix in {0:?}")]
    MissingWeekday(String),

    #[error("unknown weekday {weekday:?} in {input:?}")]
    UnknownWeekday { weekday: String, input: String },

    #[error("invalid date {input:?}: {source}")]
    Layout {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("leap second in {0:?}")]
    LeapSecond(String),
}

/// A window bound that is not an ISO-8601 timestamp.
#[derive(Debug, Error)]
#[error("invalid ISO-8601 timestamp: {0:?}")]
pub struct TimestampError(pub String);

/// Conversion of a timestamp into UTC.
///
/// Values with an offset are shifted to UTC. Naive values are taken to
/// already be UTC wall-clock time and are only relabelled.
pub trait IntoUtc {
    fn into_utc(self) -> DateTime<Utc>;
}

impl IntoUtc for DateTime<Utc> {
    fn into_utc(self) -> DateTime<Utc> {
        self
    }
}

impl IntoUtc for DateTime<FixedOffset> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

impl IntoUtc for NaiveDateTime {
    fn into_utc(self) -> DateTime<Utc> {
        self.and_utc()
    }
}

/// Inclusive `[start, end]` range in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: impl IntoUtc, end: impl IntoUtc) -> Self {
        Self {
            start: start.into_utc(),
            end: end.into_utc(),
        }
    }

    /// Builds a window from two ISO-8601 strings, see [`parse_timestamp`].
    pub fn parse(start: &str, end: &str) -> Result<Self, TimestampError> {
        Ok(Self::new(parse_timestamp(start)?, parse_timestamp(end)?))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// True when `start <= at <= end`. A reversed window contains nothing.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// A normalized article extracted from one feed item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleRecord {
    pub url: Option<String>,
    pub publication_time: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

/// Parses an ISO-8601 timestamp into UTC.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, `2024-01-01T00:00:00+02:00`),
/// the same with a space separator, offset-less date-times
/// (`2024-01-01T00:00:00`) and bare dates (`2024-01-01`, midnight).
/// Offset-less values are read as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.into_utc());
    }
    for layout in OFFSET_TIMESTAMP_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(s, layout) {
            return Ok(dt.into_utc());
        }
    }
    for layout in NAIVE_TIMESTAMP_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Ok(naive.into_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).into_utc());
    }

    Err(TimestampError(input.to_string()))
}

/// Parses an RSS `pubDate` (`Mon, 02 Jan 2006 15:04:05 GMT`) into UTC.
///
/// Every literal `GMT` is rewritten to `+0000` before parsing. This is a
/// compatibility shim for that one abbreviation, not general timezone-name
/// support. A trailing `Z` offset is read as `+0000` too. The weekday must be
/// a valid three-letter name but is not checked against the date itself.
/// Second `60` is rejected.
pub fn parse_pub_date(raw: &str) -> Result<DateTime<Utc>, DateParseError> {
    let mut normalized = raw.trim().replace("GMT", "+0000");
    if let Some(stripped) = normalized.strip_suffix(" Z") {
        normalized = format!("{} +0000", stripped);
    }

    let (weekday, rest) = normalized
        .split_once(',')
        .ok_or_else(|| DateParseError::MissingWeekday(raw.to_string()))?;

    let weekday = weekday.trim();
    if weekday.len() != 3 || weekday.parse::<Weekday>().is_err() {
        return Err(DateParseError::UnknownWeekday {
            weekday: weekday.to_string(),
            input: raw.to_string(),
        });
    }

    let parsed = DateTime::parse_from_str(rest.trim_start(), PUB_DATE_LAYOUT).map_err(|source| {
        DateParseError::Layout {
            input: raw.to_string(),
            source,
        }
    })?;

    // chrono encodes `:60` as an extra second of nanoseconds.
    if parsed.nanosecond() >= 1_000_000_000 {
        return Err(DateParseError::LeapSecond(raw.to_string()));
    }
    Ok(parsed.into_utc())
}

/// Extracts article records from feed items, keeping only those inside `window`.
///
/// Per item, in source order:
/// - `url` is the trimmed link text, if a link element exists;
/// - a date element that parses and falls inside the window sets
///   `publication_time`; one that falls outside, or fails to parse, drops
///   the item;
/// - an item with no date element is kept with `publication_time` unset;
/// - `tags` are the trimmed category texts.
pub fn extract<I>(items: I, window: &TimeWindow) -> Vec<ArticleRecord>
where
    I: IntoIterator<Item = ItemNode>,
{
    items
        .into_iter()
        .filter_map(|item| extract_one(item, window))
        .collect()
}

fn extract_one(item: ItemNode, window: &TimeWindow) -> Option<ArticleRecord> {
    let url = item.link.map(|link| link.trim().to_string());

    let publication_time = match item.pub_date {
        Some(raw) => match parse_pub_date(&raw) {
            Ok(published) if window.contains(published) => Some(published),
            Ok(published) => {
                tracing::debug!(
                    url = url.as_deref().unwrap_or_default(),
                    published = %published,
                    "Item outside time window, skipping"
                );
                return None;
            }
            Err(e) => {
                tracing::debug!(
                    url = url.as_deref().unwrap_or_default(),
                    error = %e,
                    "Unparseable pubDate, skipping item"
                );
                return None;
            }
        },
        None => None,
    };

    let tags = item
        .categories
        .iter()
        .map(|tag| tag.trim().to_string())
        .collect();

    Some(ArticleRecord {
        url,
        publication_time,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn jan_window() -> TimeWindow {
        TimeWindow::new(utc(2024, 1, 1, 0), utc(2024, 1, 2, 0))
    }

    fn item(link: &str, pub_date: Option<&str>, categories: &[&str]) -> ItemNode {
        ItemNode {
            link: Some(link.to_string()),
            pub_date: pub_date.map(str::to_string),
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_pub_date_gmt() {
        let parsed = parse_pub_date("Mon, 01 Jan 2024 00:00:00 GMT").unwrap();
        assert_eq!(parsed, utc(2024, 1, 1, 0));
    }

    #[test]
    fn test_pub_date_numeric_offset_is_normalized() {
        let parsed = parse_pub_date("Mon, 01 Jan 2024 02:00:00 +0200").unwrap();
        assert_eq!(parsed, utc(2024, 1, 1, 0));
    }

    #[test]
    fn test_pub_date_surrounding_whitespace() {
        let parsed = parse_pub_date("\n   Tue, 02 Jan 2024 00:00:00 GMT  \n").unwrap();
        assert_eq!(parsed, utc(2024, 1, 2, 0));
    }

    #[test]
    fn test_pub_date_trailing_z_is_utc() {
        let parsed = parse_pub_date("Mon, 01 Jan 2024 00:00:00 Z").unwrap();
        assert_eq!(parsed, utc(2024, 1, 1, 0));
    }

    #[test]
    fn test_pub_date_rejects_leap_second() {
        assert!(matches!(
            parse_pub_date("Sun, 31 Dec 2023 23:59:60 GMT"),
            Err(DateParseError::LeapSecond(_))
        ));
    }

    #[test]
    fn test_leap_second_item_is_dropped() {
        let window = TimeWindow::new(utc(2023, 12, 31, 0), utc(2024, 1, 2, 0));
        let records = extract(
            vec![item("a", Some("Sun, 31 Dec 2023 23:59:60 GMT"), &[])],
            &window,
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_pub_date_rejects_garbage() {
        assert!(matches!(
            parse_pub_date("not-a-date"),
            Err(DateParseError::MissingWeekday(_))
        ));
        assert!(matches!(
            parse_pub_date("Xyz, 01 Jan 2024 00:00:00 GMT"),
            Err(DateParseError::UnknownWeekday { .. })
        ));
        assert!(matches!(
            parse_pub_date("2024-01-01T00:00:00Z"),
            Err(DateParseError::MissingWeekday(_))
        ));
    }

    #[test]
    fn test_pub_date_rejects_other_zone_names() {
        assert!(matches!(
            parse_pub_date("Mon, 01 Jan 2024 00:00:00 EST"),
            Err(DateParseError::Layout { .. })
        ));
    }

    #[test]
    fn test_timestamp_variants() {
        let expected = utc(2024, 1, 1, 0);
        assert_eq!(parse_timestamp("2024-01-01T00:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01T00:00:00+00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01T02:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01 00:00:00+00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01T00:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01 00:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01T00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_naive_bound_is_reinterpreted_not_shifted() {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let window = TimeWindow::new(naive, naive);
        assert_eq!(window.start(), utc(2024, 1, 1, 12));
    }

    #[test]
    fn test_two_item_example() {
        let items = vec![
            item(
                "http://example.com/article1",
                Some("Mon, 01 Jan 2024 00:00:00 GMT"),
                &["Tech"],
            ),
            item(
                "http://example.com/article2",
                Some("Tue, 02 Jan 2024 00:00:00 GMT"),
                &[],
            ),
        ];

        let records = extract(items, &jan_window());
        assert_eq!(
            records,
            vec![
                ArticleRecord {
                    url: Some("http://example.com/article1".into()),
                    publication_time: Some(utc(2024, 1, 1, 0)),
                    tags: vec!["Tech".into()],
                },
                ArticleRecord {
                    url: Some("http://example.com/article2".into()),
                    publication_time: Some(utc(2024, 1, 2, 0)),
                    tags: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = jan_window();
        assert!(window.contains(window.start()));
        assert!(window.contains(window.end()));
        assert!(!window.contains(window.end() + chrono::Duration::seconds(1)));
        assert!(!window.contains(window.start() - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_out_of_window_item_dropped() {
        let items = vec![item(
            "http://example.com/late",
            Some("Wed, 03 Jan 2024 00:00:00 GMT"),
            &["Tech"],
        )];
        assert!(extract(items, &jan_window()).is_empty());
    }

    #[test]
    fn test_unparseable_date_dropped() {
        let items = vec![item("http://example.com/bad", Some("not-a-date"), &[])];
        assert!(extract(items, &jan_window()).is_empty());
    }

    #[test]
    fn test_empty_date_element_dropped() {
        let items = vec![item("http://example.com/empty", Some(""), &[])];
        assert!(extract(items, &jan_window()).is_empty());
    }

    #[test]
    fn test_missing_date_kept_unfiltered() {
        let items = vec![item("http://example.com/undated", None, &["x"])];
        let records = extract(items, &jan_window());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].publication_time, None);
        assert_eq!(records[0].tags, vec!["x"]);
    }

    #[test]
    fn test_missing_link_leaves_url_unset() {
        let items = vec![ItemNode {
            link: None,
            pub_date: None,
            categories: vec![],
        }];
        let records = extract(items, &jan_window());
        assert_eq!(records, vec![ArticleRecord::default()]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let items = vec![item("  http://example.com/a\n", None, &[" Tech ", "\nRust"])];
        let records = extract(items, &jan_window());
        assert_eq!(records[0].url.as_deref(), Some("http://example.com/a"));
        assert_eq!(records[0].tags, vec!["Tech", "Rust"]);
    }

    #[test]
    fn test_filtering_preserves_order() {
        let items = vec![
            item("a", Some("Mon, 01 Jan 2024 00:00:00 GMT"), &[]),
            item("b", Some("not-a-date"), &[]),
            item("c", None, &[]),
            item("d", Some("Wed, 03 Jan 2024 00:00:00 GMT"), &[]),
            item("e", Some("Mon, 01 Jan 2024 12:00:00 GMT"), &[]),
        ];
        let urls: Vec<_> = extract(items, &jan_window())
            .into_iter()
            .filter_map(|r| r.url)
            .collect();
        assert_eq!(urls, vec!["a", "c", "e"]);
    }

    proptest! {
        #[test]
        fn prop_in_window_items_keep_every_tag(
            tags in proptest::collection::vec("[A-Za-z]{1,8}", 0..6),
            hour in 0u32..24,
        ) {
            let pub_date = utc(2024, 1, 1, hour).format("%a, %d %b %Y %H:%M:%S GMT").to_string();
            let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();
            let records = extract(vec![item("u", Some(pub_date.as_str()), &tag_refs)], &jan_window());
            prop_assert_eq!(records.len(), 1);
            prop_assert_eq!(&records[0].tags, &tags);
        }

        #[test]
        fn prop_undated_items_ignore_window(start_h in 0u32..24, end_h in 0u32..24) {
            let window = TimeWindow::new(utc(2020, 6, 1, start_h), utc(2020, 6, 1, end_h));
            let records = extract(vec![item("u", None, &[])], &window);
            prop_assert_eq!(records.len(), 1);
            prop_assert!(records[0].publication_time.is_none());
        }
    }
}
