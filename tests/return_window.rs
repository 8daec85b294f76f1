use chrono::{Duration, TimeZone, Utc};
use storefront_api::lifecycle::{ReturnWindow, eligibility::DEFAULT_RETURN_WINDOW_HOURS};

#[test]
fn default_window_is_seven_days() {
    assert_eq!(DEFAULT_RETURN_WINDOW_HOURS, 168);
    assert_eq!(ReturnWindow::default().duration(), Duration::days(7));
}

#[test]
fn undelivered_orders_are_never_eligible() {
    let window = ReturnWindow::default();
    assert!(!window.is_open(None, Utc::now()));
}

#[test]
fn window_is_inclusive_at_the_boundary() {
    let window = ReturnWindow::hours(24).unwrap();
    let delivered = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    assert!(window.is_open(Some(delivered), delivered));
    assert!(window.is_open(Some(delivered), delivered + Duration::hours(24)));
    assert!(!window.is_open(
        Some(delivered),
        delivered + Duration::hours(24) + Duration::seconds(1)
    ));
    assert_eq!(window.closes_at(delivered), Some(delivered + Duration::hours(24)));
}

#[test]
fn delivery_in_the_future_is_not_eligible() {
    let window = ReturnWindow::default();
    let now = Utc::now();
    assert!(!window.is_open(Some(now + Duration::minutes(5)), now));
}

#[test]
fn negative_hours_collapse_to_an_empty_window() {
    let window = ReturnWindow::hours(-3).unwrap();
    let delivered = Utc::now();
    assert_eq!(window.duration(), Duration::zero());
    assert!(window.is_open(Some(delivered), delivered));
    assert!(!window.is_open(Some(delivered), delivered + Duration::seconds(1)));
}

#[test]
fn oversized_window_is_rejected_instead_of_panicking() {
    assert_eq!(ReturnWindow::hours(i64::MAX), None);
    assert!(ReturnWindow::hours(24 * 365 * 100).is_some());
}

#[test]
fn close_time_past_the_calendar_is_none() {
    let window = ReturnWindow::hours(24 * 365 * 1_000_000).unwrap();
    let delivered = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    assert_eq!(window.closes_at(delivered), None);
    assert!(window.is_open(Some(delivered), delivered + Duration::days(365)));
}
