pub mod order_items;
pub mod order_tracking;
pub mod orders;
pub mod products;
pub mod return_requests;
pub mod shipping_addresses;
pub mod users;

pub use order_items::Entity as OrderItems;
pub use order_tracking::Entity as OrderTracking;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use return_requests::Entity as ReturnRequests;
pub use shipping_addresses::Entity as ShippingAddresses;
pub use users::Entity as Users;
