use storefront_api::config::AppConfig;

// Single test in this binary: it mutates process-wide environment variables.
#[test]
fn return_window_hours_are_validated() {
    unsafe {
        std::env::set_var("DATABASE_URL", "postgres://localhost/storefront_test");
        std::env::set_var("RETURN_WINDOW_HOURS", i64::MAX.to_string());
    }
    let err = AppConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("RETURN_WINDOW_HOURS is out of range"));

    unsafe { std::env::set_var("RETURN_WINDOW_HOURS", "soon") };
    let err = AppConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("whole number of hours"));

    unsafe { std::env::set_var("RETURN_WINDOW_HOURS", "24") };
    let config = AppConfig::from_env().unwrap();
    assert_eq!(config.return_window.duration().num_hours(), 24);
}
