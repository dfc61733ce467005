//! Decade labels for photo dates.

use std::sync::OnceLock;

use regex::Regex;

/// Label used when no year can be read from a date.
pub const UNKNOWN_ERA: &str = "unknown";

const DECADE_LABELS: [(u32, &str); 9] = [
    (1940, "1940s"),
    (1950, "1950s"),
    (1960, "1960s"),
    (1970, "1970s"),
    (1980, "1980s"),
    (1990, "1990s"),
    (2000, "2000s"),
    (2010, "2010s"),
    (2020, "2020s"),
];

/// Map an ISO-8601 or partial date string to a decade label.
///
/// The year is the first run of exactly four digits between word boundaries, so
/// `"1985-06-15"` and `"June 1985"` both give `"1980s"`. Decades outside
/// the table still get a `"{decade}s"` label.
///
/// ```
/// use memorybridge_core::era::era_from_date;
///
/// assert_eq!(era_from_date("1985-06-15"), "1980s");
/// assert_eq!(era_from_date("2003"), "2000s");
/// assert_eq!(era_from_date(""), "unknown");
/// assert_eq!(era_from_date("bad-date"), "unknown");
/// ```
pub fn era_from_date(date: &str) -> String {
    if date.is_empty() {
        return UNKNOWN_ERA.to_string();
    }

    let Some(year) = first_year(date).and_then(|digits| digits.parse::<u32>().ok()) else {
        return UNKNOWN_ERA.to_string();
    };

    let decade = (year / 10) * 10;
    DECADE_LABELS
        .iter()
        .find(|(d, _)| *d == decade)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("{}s", decade))
}

/// Find the first run of exactly four digits bounded by word boundaries.
fn first_year(date: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let year = RE.get_or_init(|| Regex::new(r"\b(\d{4})\b").expect("Invalid year regex"));
    year
        .captures(date)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_iso_date() {
        assert_eq!(era_from_date("1985-06-15"), "1980s");
    }

    #[test]
    fn test_year_only() {
        assert_eq!(era_from_date("2003"), "2000s");
    }

    #[test]
    fn test_empty_is_unknown() {
        assert_eq!(era_from_date(""), "unknown");
    }

    #[test]
    fn test_no_digits_is_unknown() {
        assert_eq!(era_from_date("bad-date"), "unknown");
    }

    #[test]
    fn test_year_inside_text() {
        assert_eq!(era_from_date("summer of 1962, lake house"), "1960s");
        assert_eq!(era_from_date("circa 1948?"), "1940s");
    }

    #[test]
    fn test_decade_outside_table() {
        assert_eq!(era_from_date("1925-01-01"), "1920s");
        assert_eq!(era_from_date("2031"), "2030s");
    }

    #[test]
    fn test_longer_digit_runs_are_not_years() {
        assert_eq!(era_from_date("19850615"), "unknown");
        assert_eq!(era_from_date("12345 and 1990"), "1990s");
    }

    #[test]
    fn test_digits_glued_to_letters_are_not_years() {
        assert_eq!(era_from_date("img1985"), "unknown");
        assert_eq!(era_from_date("photo_1985"), "unknown");
    }

    #[test]
    fn test_short_runs_skipped() {
        assert_eq!(era_from_date("06/15/85"), "unknown");
        assert_eq!(era_from_date("15/06/1985"), "1980s");
    }

    #[test]
    fn test_first_year_picks_first_bounded_match() {
        assert_eq!(first_year("1962-1975"), Some("1962"));
        assert_eq!(first_year("photo_1985 then 1991"), Some("1991"));
        assert_eq!(first_year("19850615"), None);
        assert_eq!(first_year("no year here"), None);
    }

    #[test]
    fn test_non_ascii_text_around_year() {
        assert_eq!(era_from_date("été 1977 à Paris"), "1970s");
    }
}
