use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
    lifecycle::ReturnWindow,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub return_window: ReturnWindow,
    pub payment_redirect_url: String,
}

impl AppState {
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        Self {
            orm: orm_from_pool(&pool),
            pool,
            return_window: config.return_window,
            payment_redirect_url: config.payment_redirect_url.clone(),
        }
    }
}
