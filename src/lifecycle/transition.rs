use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::status::{OrderStatus, RefundStatus, ReturnStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Order,
    ReturnRequest,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Order => f.write_str("order"),
            EntityKind::ReturnRequest => f.write_str("return request"),
        }
    }
}

/// Actions an admin can request on a return request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReturnAction {
    Approve,
    Reject,
    MarkPicked,
    InitiateRefund,
}

impl ReturnAction {
    pub const ALL: [ReturnAction; 4] = [
        ReturnAction::Approve,
        ReturnAction::Reject,
        ReturnAction::MarkPicked,
        ReturnAction::InitiateRefund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnAction::Approve => "approve",
            ReturnAction::Reject => "reject",
            ReturnAction::MarkPicked => "mark_picked",
            ReturnAction::InitiateRefund => "initiate_refund",
        }
    }
}

/// Lifecycle snapshot of a single entity, as far as the rule table cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Current {
    Order(OrderStatus),
    Return {
        status: ReturnStatus,
        refund: RefundStatus,
    },
}

impl Current {
    pub fn kind(&self) -> EntityKind {
        match self {
            Current::Order(_) => EntityKind::Order,
            Current::Return { .. } => EntityKind::ReturnRequest,
        }
    }

    /// The snapshot after `effects` have been applied. Effects that do not touch
    /// the snapshot's entity are ignored.
    pub fn apply(self, effects: &[Effect]) -> Current {
        effects.iter().fold(self, |state, effect| match (state, *effect) {
            (Current::Order(_), Effect::SetOrderStatus(next)) => Current::Order(next),
            (Current::Return { refund, .. }, Effect::SetReturnStatus(next)) => Current::Return {
                status: next,
                refund,
            },
            (Current::Return { status, .. }, Effect::SetRefundStatus(next)) => Current::Return {
                status,
                refund: next,
            },
            (state, _) => state,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "entity", content = "action")]
pub enum Action {
    Order(OrderStatus),
    Return(ReturnAction),
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Order(status) => status.as_str(),
            Action::Return(action) => action.as_str(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenialReason {
    #[error("{entity} is in terminal state `{status}`")]
    Terminal {
        entity: EntityKind,
        status: &'static str,
    },

    #[error("{entity} cannot go from `{from}` to `{to}`")]
    NotAllowed {
        entity: EntityKind,
        from: &'static str,
        to: &'static str,
    },

    #[error("refund is already in progress")]
    RefundInProgress,

    #[error("refund has already succeeded")]
    RefundAlreadySucceeded,

    #[error("`{action}` does not apply to a {entity}")]
    WrongEntity {
        entity: EntityKind,
        action: &'static str,
    },

    #[error("a transition for this {entity} is still in flight")]
    InFlight { entity: EntityKind },
}

/// Backend side effects implied by an allowed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    SetOrderStatus(OrderStatus),
    AppendTracking(OrderStatus),
    StampShippedAt,
    StampDeliveredAt,
    RestockItems,
    SetReturnStatus(ReturnStatus),
    SetRefundStatus(RefundStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: Option<DenialReason>,
    pub effects: Vec<Effect>,
}

impl Verdict {
    fn allow(effects: Vec<Effect>) -> Self {
        Self {
            allowed: true,
            reason: None,
            effects,
        }
    }

    fn deny(reason: DenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            effects: Vec::new(),
        }
    }

    pub fn into_result(self) -> Result<Vec<Effect>, DenialReason> {
        match self.reason {
            Some(reason) => Err(reason),
            None => Ok(self.effects),
        }
    }
}

pub fn can_transition(current: Current, action: Action) -> Verdict {
    match (current, action) {
        (Current::Order(from), Action::Order(to)) => order_verdict(from, to),
        (Current::Return { status, refund }, Action::Return(action)) => {
            return_verdict(status, refund, action)
        }
        (current, action) => Verdict::deny(DenialReason::WrongEntity {
            entity: current.kind(),
            action: action.as_str(),
        }),
    }
}

/// Validates `action` against `current` and returns the resulting snapshot.
pub fn next_state(current: Current, action: Action) -> Result<Current, DenialReason> {
    let effects = can_transition(current, action).into_result()?;
    Ok(current.apply(&effects))
}

fn order_verdict(from: OrderStatus, to: OrderStatus) -> Verdict {
    use OrderStatus::*;

    if from.is_terminal() {
        return Verdict::deny(DenialReason::Terminal {
            entity: EntityKind::Order,
            status: from.as_str(),
        });
    }

    let allowed = matches!(
        (from, to),
        (Pending, Processing)
            | (Pending, Cancelled)
            | (Processing, Shipped)
            | (Processing, Cancelled)
            | (Shipped, Delivered)
    );
    if !allowed {
        return Verdict::deny(DenialReason::NotAllowed {
            entity: EntityKind::Order,
            from: from.as_str(),
            to: to.as_str(),
        });
    }

    let mut effects = vec![Effect::SetOrderStatus(to), Effect::AppendTracking(to)];
    match to {
        Shipped => effects.push(Effect::StampShippedAt),
        Delivered => effects.push(Effect::StampDeliveredAt),
        Cancelled => effects.push(Effect::RestockItems),
        Pending | Processing => {}
    }
    Verdict::allow(effects)
}

fn return_verdict(status: ReturnStatus, refund: RefundStatus, action: ReturnAction) -> Verdict {
    // A succeeded refund blocks re-initiation no matter where the status sits.
    if action == ReturnAction::InitiateRefund && refund == RefundStatus::Succeeded {
        return Verdict::deny(DenialReason::RefundAlreadySucceeded);
    }

    if status.is_terminal() {
        return Verdict::deny(DenialReason::Terminal {
            entity: EntityKind::ReturnRequest,
            status: status.as_str(),
        });
    }

    match (status, action) {
        (ReturnStatus::Requested, ReturnAction::Approve) => {
            Verdict::allow(vec![Effect::SetReturnStatus(ReturnStatus::Approved)])
        }
        (ReturnStatus::Requested, ReturnAction::Reject) => {
            Verdict::allow(vec![Effect::SetReturnStatus(ReturnStatus::Rejected)])
        }
        (ReturnStatus::Approved, ReturnAction::MarkPicked) => {
            Verdict::allow(vec![Effect::SetReturnStatus(ReturnStatus::Picked)])
        }
        (ReturnStatus::Picked, ReturnAction::InitiateRefund) => {
            if refund == RefundStatus::Initiated {
                Verdict::deny(DenialReason::RefundInProgress)
            } else {
                Verdict::allow(vec![Effect::SetRefundStatus(RefundStatus::Initiated)])
            }
        }
        (status, action) => Verdict::deny(DenialReason::NotAllowed {
            entity: EntityKind::ReturnRequest,
            from: status.as_str(),
            to: action.as_str(),
        }),
    }
}

/// Completes an initiated refund. Only the backend settles refunds; this is not
/// a requestable action.
pub fn settle_refund(current: Current, succeeded: bool) -> Result<Vec<Effect>, DenialReason> {
    match current {
        Current::Return {
            status: ReturnStatus::Picked,
            refund: RefundStatus::Initiated,
        } => {
            if succeeded {
                Ok(vec![
                    Effect::SetReturnStatus(ReturnStatus::Refunded),
                    Effect::SetRefundStatus(RefundStatus::Succeeded),
                ])
            } else {
                Ok(vec![Effect::SetRefundStatus(RefundStatus::Failed)])
            }
        }
        Current::Return { status, .. } if status.is_terminal() => Err(DenialReason::Terminal {
            entity: EntityKind::ReturnRequest,
            status: status.as_str(),
        }),
        Current::Return { refund, .. } => Err(DenialReason::NotAllowed {
            entity: EntityKind::ReturnRequest,
            from: refund.as_str(),
            to: if succeeded { "succeeded" } else { "failed" },
        }),
        Current::Order(_) => Err(DenialReason::WrongEntity {
            entity: EntityKind::Order,
            action: "settle_refund",
        }),
    }
}
