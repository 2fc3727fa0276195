//! Operation types dispatched through the traced service pipeline.

use tracklog_core::ArgList;

/// A call that can be traced: it knows its operation name and how to render
/// its arguments.
pub trait TracedCall {
    fn operation_name(&self) -> &str;

    fn args(&self) -> ArgList;
}

/// Operation names of the order service.
pub mod operation_names {
    pub const GET_ORDER: &str = "get_order";
    pub const PLACE_ORDER: &str = "place_order";
    pub const CANCEL_ORDER: &str = "cancel_order";
}

/// Typed order operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOperation {
    Get {
        order_id: u64,
    },
    Place {
        item: String,
        quantity: u32,
        coupon: Option<String>,
    },
    Cancel {
        order_id: u64,
    },
}

impl TracedCall for OrderOperation {
    fn operation_name(&self) -> &str {
        match self {
            Self::Get { .. } => operation_names::GET_ORDER,
            Self::Place { .. } => operation_names::PLACE_ORDER,
            Self::Cancel { .. } => operation_names::CANCEL_ORDER,
        }
    }

    fn args(&self) -> ArgList {
        match self {
            Self::Get { order_id } | Self::Cancel { order_id } => ArgList::new().arg(order_id),
            Self::Place {
                item,
                quantity,
                coupon,
            } => ArgList::new()
                .arg(item)
                .arg(quantity)
                .opt(coupon.as_ref().map(|c| c as &dyn std::fmt::Display)),
        }
    }
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Order {
    pub id: u64,
    pub item: String,
    pub quantity: u32,
    pub coupon: Option<String>,
}

/// Successful response from the order service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderResponse {
    Order(Order),
    Cancelled { order_id: u64 },
}

/// Errors returned by the order service.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("order {order_id} not found")]
    NotFound { order_id: u64 },
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
