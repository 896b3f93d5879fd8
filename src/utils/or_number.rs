use chrono::NaiveDate;

const PREFIX: &str = "OR-";

/// Official receipt number: `OR-YYYYMMDD-NNNNN`, sequence restarting each day.
pub fn format_or_number(date: NaiveDate, sequence: u32) -> String {
    format!("{PREFIX}{}-{sequence:05}", date.format("%Y%m%d"))
}

/// Prefix shared by every receipt issued on `date`.
pub fn or_prefix(date: NaiveDate) -> String {
    format!("{PREFIX}{}-", date.format("%Y%m%d"))
}

/// Sequence part of a receipt number, `None` when the number is malformed.
pub fn parse_sequence(or_number: &str) -> Option<u32> {
    let rest = or_number.strip_prefix(PREFIX)?;
    let (date, seq) = rest.split_once('-')?;
    if date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    seq.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_or_number() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();
        assert_eq!(format_or_number(date, 1), "OR-20250903-00001");
        assert_eq!(format_or_number(date, 12345), "OR-20250903-12345");
        assert!(format_or_number(date, 7).starts_with(&or_prefix(date)));
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("OR-20250903-00042"), Some(42));
        assert_eq!(parse_sequence("OR-2025093-00042"), None);
        assert_eq!(parse_sequence("INV-20250903-00042"), None);
        assert_eq!(parse_sequence("OR-20250903-abc"), None);
    }
}
