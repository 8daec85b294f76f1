use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{lifecycle::AddressType, models::ShippingAddress};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressRequest {
    pub full_name: String,
    pub phone_number: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub address_type: Option<AddressType>,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressRequest {
    /// Name of the first blank required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("full_name", &self.full_name),
            ("phone_number", &self.phone_number),
            ("address_line", &self.address_line),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddressList {
    pub items: Vec<ShippingAddress>,
}
