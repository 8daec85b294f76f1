//! Order and return-request lifecycle rules shared by the backend services and
//! the client-side controller.

pub mod eligibility;
pub mod status;
pub mod transition;

pub use eligibility::ReturnWindow;
pub use status::{AddressType, OrderStatus, PaymentStatus, RefundStatus, ReturnStatus};
pub use transition::{
    Action, Current, DenialReason, Effect, EntityKind, ReturnAction, Verdict, can_transition,
    next_state, settle_refund,
};
