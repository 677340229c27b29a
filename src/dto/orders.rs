use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::checkout::CustomerInfo;
use crate::models::{Order, OrderLine};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[serde(flatten)]
    pub customer: CustomerInfo,
    #[serde(default)]
    pub shipping_fee: i64,
    #[serde(default)]
    pub discount_amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    pub admin_note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub paid_revenue: i64,
    pub recent_orders: Vec<Order>,
}
