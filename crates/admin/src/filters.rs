//! Askama filters shared by the admin templates.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use catalog_core::OrderStatus;

/// Year for the layout footer.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Badge color suffix for a table badge cell.
///
/// Usage in templates: `<span class="badge badge-{{ cell.text|badge_tone }}">`
#[askama::filter_fn]
pub fn badge_tone(
    value: impl Display,
    _env: &dyn askama::Values,
) -> askama::Result<&'static str> {
    Ok(tone(&value.to_string()))
}

/// Order statuses get their workflow color; other badges are neutral.
fn tone(text: &str) -> &'static str {
    match text.to_ascii_lowercase().parse::<OrderStatus>() {
        Ok(OrderStatus::Pending) => "warning",
        Ok(OrderStatus::Processing) => "primary",
        Ok(OrderStatus::Completed) => "success",
        Ok(OrderStatus::Declined) => "danger",
        Err(_) => "gray",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_tone_follows_order_status() {
        assert_eq!(tone("Pending"), "warning");
        assert_eq!(tone("processing"), "primary");
        assert_eq!(tone("Completed"), "success");
        assert_eq!(tone("Declined"), "danger");
        assert_eq!(tone("Downloadable"), "gray");
    }
}
