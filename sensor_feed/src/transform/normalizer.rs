//! Turns an untrusted record array into per-metric, time-ordered series.
//!
//! Normalization never fails. Anything it cannot use is dropped at the
//! narrowest possible scope:
//!
//! - a payload that is not an array yields no series;
//! - a record that is not an object, or whose timestamp does not parse, is
//!   dropped for every metric;
//! - a metric value that is missing, non-numeric or non-finite is dropped for
//!   that metric only.
//!
//! The output contains one [`Series`] per requested metric that kept at least
//! one point, in the caller's metric order.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexSet;
use serde_json::{Map, Value};

use crate::{
    models::{
        RawPayload,
        point::{Point, Series},
    },
    transform::timestamp::parse_timestamp,
};

/// Record field holding the reading's timestamp.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Normalizes `raw` into series for each of `metrics`.
///
/// `reference_date` anchors bare `HH:MM` timestamps; it is never read from the
/// clock, so the same inputs always give the same output.
pub fn normalize(
    raw: &RawPayload,
    metrics: &IndexSet<String>,
    reference_date: NaiveDate,
) -> Vec<Series> {
    let Some(records) = raw.as_array() else {
        return Vec::new();
    };

    let stamped: Vec<(DateTime<Utc>, &Map<String, Value>)> = records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|record| {
            let timestamp = record
                .get(TIMESTAMP_FIELD)
                .and_then(Value::as_str)
                .and_then(|raw| parse_timestamp(raw, reference_date))?;
            Some((timestamp, record))
        })
        .collect();

    metrics
        .iter()
        .filter_map(|metric| {
            let points: Vec<Point> = stamped
                .iter()
                .filter_map(|(timestamp, record)| {
                    let value = record.get(metric.as_str()).and_then(coerce_value)?;
                    Some(Point {
                        timestamp: *timestamp,
                        value,
                    })
                })
                .collect();

            (!points.is_empty()).then(|| Series::from_points(metric.as_str(), points))
        })
        .collect()
}

/// Reads a metric value as a finite `f64`.
///
/// JSON numbers and numeric strings (surrounding whitespace allowed) are
/// accepted. `NaN`, infinities, booleans, nulls and nested values are not.
pub fn coerce_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn metrics(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 23).unwrap()
    }

    fn pairs(series: &Series) -> Vec<(DateTime<Utc>, f64)> {
        series.points().iter().map(|p| (p.timestamp, p.value)).collect()
    }

    #[test]
    fn mixed_records_split_into_per_metric_series() {
        let raw = json!([
            {"timestamp": "2025-01-01T00:00:00Z", "temperature": "22.5"},
            {"timestamp": "2025-01-01T01:00:00Z", "temperature": 21.9, "humidity": 60}
        ]);

        let series = normalize(&raw, &metrics(&["temperature", "humidity"]), reference());

        let h0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let h1 = Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].metric(), "temperature");
        assert_eq!(pairs(&series[0]), vec![(h0, 22.5), (h1, 21.9)]);
        assert_eq!(series[1].metric(), "humidity");
        assert_eq!(pairs(&series[1]), vec![(h1, 60.0)]);
    }

    #[test]
    fn non_array_and_empty_payloads_yield_nothing() {
        let wanted = metrics(&["temperature"]);
        for raw in [
            json!([]),
            json!({"temperature": 20.0}),
            json!(null),
            json!("[]"),
            json!(42),
        ] {
            assert!(normalize(&raw, &wanted, reference()).is_empty(), "{raw}");
        }
    }

    #[test]
    fn bad_timestamps_drop_the_whole_record() {
        let raw = json!([
            {"timestamp": "not a time", "temperature": 1.0, "humidity": 10},
            {"timestamp": 1735689600, "temperature": 2.0, "humidity": 20},
            {"temperature": 3.0, "humidity": 30},
            {"timestamp": "08:15", "temperature": 4.0, "humidity": 40}
        ]);

        let series = normalize(&raw, &metrics(&["temperature", "humidity"]), reference());

        let at = Utc.with_ymd_and_hms(2025, 10, 23, 8, 15, 0).unwrap();
        assert_eq!(pairs(&series[0]), vec![(at, 4.0)]);
        assert_eq!(pairs(&series[1]), vec![(at, 40.0)]);
    }

    #[test]
    fn bad_values_drop_only_their_metric() {
        let raw = json!([
            {"timestamp": "10:00", "temperature": "warm", "humidity": 55},
            {"timestamp": "11:00", "temperature": null, "humidity": " 56.5 "},
            {"timestamp": "12:00", "temperature": "NaN", "humidity": true},
            {"timestamp": "13:00", "temperature": "inf", "humidity": [57]},
            {"timestamp": "14:00", "temperature": 19.5}
        ]);

        let series = normalize(&raw, &metrics(&["temperature", "humidity"]), reference());

        let temps: Vec<f64> = series[0].points().iter().map(|p| p.value).collect();
        let humid: Vec<f64> = series[1].points().iter().map(|p| p.value).collect();
        assert_eq!(temps, vec![19.5]);
        assert_eq!(humid, vec![55.0, 56.5]);
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let raw = json!([
            "12:00",
            [1, 2, 3],
            null,
            {"timestamp": "12:00", "temperature": 20}
        ]);
        let series = normalize(&raw, &metrics(&["temperature"]), reference());
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].len(), 1);
    }

    #[test]
    fn metrics_without_points_are_omitted() {
        let raw = json!([{"timestamp": "12:00", "temperature": 20.25}]);
        let series = normalize(
            &raw,
            &metrics(&["humidity", "temperature", "battery"]),
            reference(),
        );
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].metric(), "temperature");
    }

    #[test]
    fn out_of_order_records_are_sorted_and_ties_keep_input_order() {
        let raw = json!([
            {"timestamp": "2025-01-01T03:00:00Z", "temperature": 3.0},
            {"timestamp": "2025-01-01T01:00:00Z", "temperature": 1.0},
            {"timestamp": "2025-01-01T03:00:00Z", "temperature": 3.5},
            {"timestamp": "2025-01-01T02:00:00+01:00", "temperature": 0.5}
        ]);

        let series = normalize(&raw, &metrics(&["temperature"]), reference());

        let values: Vec<f64> = series[0].points().iter().map(|p| p.value).collect();
        // 02:00+01:00 is the same instant as 01:00Z, so it stays after it.
        assert_eq!(values, vec![1.0, 0.5, 3.0, 3.5]);
    }

    #[test]
    fn mixed_formats_share_one_timeline() {
        let raw = json!([
            {"timestamp": "2025-10-23T09:30:00Z", "temperature": 2.0},
            {"timestamp": "09:00", "temperature": 1.0}
        ]);
        let series = normalize(&raw, &metrics(&["temperature"]), reference());
        let values: Vec<f64> = series[0].points().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn coercion_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_value(&json!(21)), Some(21.0));
        assert_eq!(coerce_value(&json!(-3.25)), Some(-3.25));
        assert_eq!(coerce_value(&json!("1e2")), Some(100.0));
        assert_eq!(coerce_value(&json!("  7 ")), Some(7.0));
        assert_eq!(coerce_value(&json!("")), None);
        assert_eq!(coerce_value(&json!("-inf")), None);
        assert_eq!(coerce_value(&json!(false)), None);
        assert_eq!(coerce_value(&json!({"value": 1})), None);
    }

    fn record() -> impl Strategy<Value = Value> {
        (
            0u32..24,
            0u32..60,
            prop::option::of(-40.0f64..60.0),
            prop::option::of(0.0f64..100.0),
            any::<bool>(),
        )
            .prop_map(|(hour, minute, temperature, humidity, iso)| {
                let timestamp = if iso {
                    format!("2025-10-23T{hour:02}:{minute:02}:00Z")
                } else {
                    format!("{hour:02}:{minute:02}")
                };
                let mut record = json!({ "timestamp": timestamp });
                if let Some(t) = temperature {
                    record["temperature"] = json!(t);
                }
                if let Some(h) = humidity {
                    record["humidity"] = json!(h.to_string());
                }
                record
            })
    }

    proptest! {
        #[test]
        fn every_series_is_sorted(records in prop::collection::vec(record(), 0..40)) {
            let raw = Value::Array(records);
            let series = normalize(&raw, &metrics(&["temperature", "humidity"]), reference());
            for s in &series {
                prop_assert!(!s.is_empty());
                prop_assert!(s.points().windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            }
        }

        #[test]
        fn normalization_is_deterministic(records in prop::collection::vec(record(), 0..40)) {
            let raw = Value::Array(records);
            let wanted = metrics(&["temperature", "humidity"]);
            let first = serde_json::to_vec(&normalize(&raw, &wanted, reference())).unwrap();
            let second = serde_json::to_vec(&normalize(&raw, &wanted, reference())).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn point_counts_match_valid_fields(records in prop::collection::vec(record(), 0..40)) {
            let expected_temps = records.iter().filter(|r| r.get("temperature").is_some()).count();
            let raw = Value::Array(records);
            let series = normalize(&raw, &metrics(&["temperature"]), reference());
            let got = series.first().map(Series::len).unwrap_or(0);
            prop_assert_eq!(got, expected_temps);
        }
    }
}
