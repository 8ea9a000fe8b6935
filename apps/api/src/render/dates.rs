use chrono::NaiveDate;

/// Formats a `YYYY-MM` value as `"<Month> <year>"`. Empty stays empty; anything
/// unparseable is returned verbatim.
pub fn format_date(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    match NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d") {
        Ok(date) => date.format("%B %Y").to_string(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_year() {
        assert_eq!(format_date("2023-05"), "May 2023");
        assert_eq!(format_date("2019-12"), "December 2019");
    }

    #[test]
    fn test_empty() {
        assert_eq!(format_date(""), "");
    }

    #[test]
    fn test_unparseable_passes_through() {
        assert_eq!(format_date("2023-13"), "2023-13");
        assert_eq!(format_date("soon"), "soon");
    }
}
