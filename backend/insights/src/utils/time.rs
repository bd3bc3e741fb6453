use chrono::{Local, NaiveDate};

/// The comparison key for today's rows, formatted with the configured
/// pattern. Matching is exact string equality, so a run delayed past
/// midnight reports zero attempts by design.
pub fn reference_date(format: &str) -> String {
    Local::now().format(format).to_string()
}

/// Presentation date used in storage keys, subjects, and the email
/// body (dd-mm-YYYY).
pub fn display_date() -> String {
    Local::now().format("%d-%m-%Y").to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_date_shape() {
        let date = display_date();
        assert_eq!(date.len(), 10);
        assert_eq!(date.as_bytes()[2], b'-');
        assert_eq!(date.as_bytes()[5], b'-');
    }

    #[test]
    fn reference_date_follows_pattern() {
        let formatted = reference_date("%Y");
        assert_eq!(formatted.len(), 4);
        assert!(formatted.chars().all(|c| c.is_ascii_digit()));
    }
}
