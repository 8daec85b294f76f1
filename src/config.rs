use std::env;

use crate::lifecycle::{ReturnWindow, eligibility::DEFAULT_RETURN_WINDOW_HOURS};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub return_window: ReturnWindow,
    pub payment_redirect_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let return_window_hours = match env::var("RETURN_WINDOW_HOURS") {
            Ok(raw) => raw.parse::<i64>().map_err(|e| {
                anyhow::anyhow!("RETURN_WINDOW_HOURS must be a whole number of hours: {e}")
            })?,
            Err(_) => DEFAULT_RETURN_WINDOW_HOURS,
        };
        let return_window = ReturnWindow::hours(return_window_hours).ok_or_else(|| {
            anyhow::anyhow!("RETURN_WINDOW_HOURS is out of range: {return_window_hours}")
        })?;
        let payment_redirect_url = env::var("PAYMENT_REDIRECT_URL")
            .unwrap_or_else(|_| "https://payments.example.com/checkout".to_string());
        Ok(Self {
            port,
            database_url,
            host,
            return_window,
            payment_redirect_url,
        })
    }
}
