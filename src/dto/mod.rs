pub mod addresses;
pub mod auth;
pub mod orders;
pub mod products;
pub mod returns;
