pub mod address_service;
pub mod admin_service;
pub mod auth_service;
pub mod lifecycle_service;
pub mod mapping;
pub mod order_service;
pub mod product_service;
pub mod return_service;
