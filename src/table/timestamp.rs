//! 時刻・数値フィールドの正規化

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// ソート可能な正規形式（タイムゾーンなし）
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// 時刻文字列を解析する。オフセット付きの値はUTCに変換する
pub fn parse_timestamp(field: &str) -> Option<NaiveDateTime> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(field) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(field, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(field, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// 正規形式の文字列に変換
pub fn canonical_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(CANONICAL_FORMAT).to_string()
}

/// 有限の数値のみ受け付ける
pub fn parse_value(field: &str) -> Option<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(field: &str) -> Option<String> {
        parse_timestamp(field).map(|ts| canonical_timestamp(&ts))
    }

    #[test]
    fn test_accepts_common_shapes() {
        let expected = Some("2020-01-01T00:01:00".to_string());
        assert_eq!(canon("2020-01-01T00:01"), expected);
        assert_eq!(canon("2020-01-01T00:01:00"), expected);
        assert_eq!(canon("2020-01-01 00:01:00.000"), expected);
        assert_eq!(canon("2020/01/01 00:01"), expected);
        assert_eq!(canon("01/01/2020 00:01:00"), expected);
        assert_eq!(canon(" 2020-01-01T00:01 "), expected);
    }

    #[test]
    fn test_offsets_are_converted_to_utc() {
        assert_eq!(
            canon("2020-01-01T09:01:00+09:00"),
            Some("2020-01-01T00:01:00".to_string())
        );
        assert_eq!(
            canon("2020-01-01T00:01:00Z"),
            Some("2020-01-01T00:01:00".to_string())
        );
    }

    #[test]
    fn test_bare_dates_are_midnight() {
        assert_eq!(canon("2020-03-04"), Some("2020-03-04T00:00:00".to_string()));
    }

    #[test]
    fn test_rejects_non_timestamps() {
        assert_eq!(canon("timestamp"), None);
        assert_eq!(canon(""), None);
        assert_eq!(canon("2020-13-01T00:00"), None);
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("5"), Some(5.0));
        assert_eq!(parse_value(" 7.25 "), Some(7.25));
        assert_eq!(parse_value("-1e3"), Some(-1000.0));
        assert_eq!(parse_value("bad"), None);
        assert_eq!(parse_value("NaN"), None);
        assert_eq!(parse_value("inf"), None);
        assert_eq!(parse_value(""), None);
    }
}
