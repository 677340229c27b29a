//! Order construction and the order status lifecycle.
//!
//! [`build_order`] turns a cart into an immutable order draft without
//! touching any storage; the service layer commits the draft, the stock
//! decrements, and the cart clear in one transaction, or nothing at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    cart::{Cart, Catalog},
    error::{AppError, AppResult},
    models::Product,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::Validation(format!(
                "invalid order status: {other}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(AppError::Validation(format!(
                "invalid payment status: {other}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

/// Contact details collected at checkout. All four address fields are
/// required; `notes` is free text from the customer.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CustomerInfo {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerInfo {
    pub fn validate(&self) -> AppResult<()> {
        let required = [
            ("customer_name", &self.customer_name),
            ("customer_email", &self.customer_email),
            ("customer_phone", &self.customer_phone),
            ("customer_address", &self.customer_address),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

/// Charges applied on top of the line subtotal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Charges {
    pub shipping_fee: i64,
    pub discount_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineDraft {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_price: i64,
    pub quantity: i32,
    pub total_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub order_number: String,
    pub lines: Vec<OrderLineDraft>,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
    /// (product id, quantity) pairs to subtract from stock; managed
    /// products only.
    pub stock_decrements: Vec<(Uuid, i32)>,
}

/// Build the immutable snapshot of an order from the cart's current
/// contents. Fails without side effects: a cart with no resolvable lines,
/// a blank contact field, or any managed product short on stock aborts the
/// whole build.
pub fn build_order(
    cart: &Cart,
    catalog: &Catalog,
    customer: &CustomerInfo,
    charges: Charges,
    at: DateTime<Utc>,
) -> AppResult<OrderDraft> {
    let resolved: Vec<(&Product, i32)> = cart
        .lines()
        .iter()
        .filter_map(|line| catalog.sellable(line.product_id).map(|p| (p, line.quantity)))
        .collect();
    if resolved.is_empty() {
        return Err(AppError::Validation("cart is empty".into()));
    }
    customer.validate()?;

    let mut lines = Vec::with_capacity(resolved.len());
    let mut stock_decrements = Vec::new();
    let mut subtotal = 0i64;
    for (product, quantity) in resolved {
        if product.manage_stock && product.stock_quantity < quantity {
            return Err(AppError::Stock {
                product: product.name.clone(),
            });
        }
        let price = product.current_price();
        let total_price = price * i64::from(quantity);
        subtotal += total_price;
        lines.push(OrderLineDraft {
            product_id: product.id,
            product_name: product.name.clone(),
            product_price: price,
            quantity,
            total_price,
        });
        if product.manage_stock {
            stock_decrements.push((product.id, quantity));
        }
    }

    Ok(OrderDraft {
        order_number: order_number(at, Uuid::new_v4()),
        lines,
        subtotal,
        shipping_fee: charges.shipping_fee,
        discount_amount: charges.discount_amount,
        total_amount: subtotal + charges.shipping_fee - charges.discount_amount,
        stock_decrements,
    })
}

/// Customer-facing order number: `ORD` + second-resolution timestamp plus
/// a short random suffix so two checkouts in the same second cannot
/// collide.
pub fn order_number(at: DateTime<Utc>, entropy: Uuid) -> String {
    let suffix = entropy.simple().to_string();
    format!("ORD{}{}", at.format("%Y%m%d%H%M%S"), &suffix[..6])
}

/// Lifecycle timestamps to write when entering a status. Re-entering the
/// same status stamps it again with the newer time; no transition is
/// otherwise restricted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusStamps {
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

pub fn transition_stamps(status: OrderStatus, now: DateTime<Utc>) -> StatusStamps {
    let mut stamps = StatusStamps::default();
    match status {
        OrderStatus::Confirmed => stamps.confirmed_at = Some(now),
        OrderStatus::Shipped => stamps.shipped_at = Some(now),
        OrderStatus::Delivered => stamps.delivered_at = Some(now),
        OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Cancelled => {}
    }
    stamps
}

/// Append an operator note below whatever notes are already there.
pub fn append_admin_note(existing: Option<&str>, note: &str) -> String {
    match existing {
        Some(prev) if !prev.trim().is_empty() => format!("{prev}\n{note}"),
        _ => note.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{self, Cart};
    use chrono::TimeZone;

    fn product(name: &str, price: i64, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
            price,
            sale_price: None,
            stock_quantity: stock,
            manage_stock: true,
            is_active: true,
            is_featured: false,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            customer_name: "An Nguyen".into(),
            customer_email: "an@example.com".into(),
            customer_phone: "0900000000".into(),
            customer_address: "1 Main St".into(),
            notes: None,
        }
    }

    #[test]
    fn empty_cart_is_rejected() {
        let err = build_order(
            &Cart::new(),
            &Catalog::new([]),
            &customer(),
            Charges::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn cart_with_only_dangling_lines_counts_as_empty() {
        let p = product("Gone", 1000, 5);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        cart::add_item(&mut cart, &catalog, p.id, 1).unwrap();

        let err = build_order(
            &cart,
            &Catalog::new([]),
            &customer(),
            Charges::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn blank_contact_field_is_rejected() {
        let p = product("Mug", 1000, 5);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        cart::add_item(&mut cart, &catalog, p.id, 1).unwrap();

        let mut info = customer();
        info.customer_phone = "   ".into();
        let err = build_order(&cart, &catalog, &info, Charges::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn stock_shortfall_aborts_the_whole_build() {
        let ok = product("Plenty", 1000, 10);
        let short = product("Scarce", 2000, 1);
        let catalog = Catalog::new([ok.clone(), short.clone()]);
        let mut cart = Cart::new();
        cart::add_item(&mut cart, &catalog, ok.id, 2).unwrap();
        cart::update_item(&mut cart, short.id, 5); // bypasses the add-time check

        let err = build_order(&cart, &catalog, &customer(), Charges::default(), Utc::now())
            .unwrap_err();
        match err {
            AppError::Stock { product: name } => assert_eq!(name, "Scarce"),
            other => panic!("expected stock error, got {other:?}"),
        }
    }

    #[test]
    fn totals_follow_the_invariants() {
        let p = product("Widget", 25000, 5);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        cart::add_item(&mut cart, &catalog, p.id, 3).unwrap();

        let draft =
            build_order(&cart, &catalog, &customer(), Charges::default(), Utc::now()).unwrap();
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.lines[0].product_price, 25000);
        assert_eq!(draft.lines[0].total_price, 75000);
        assert_eq!(draft.subtotal, 75000);
        assert_eq!(draft.total_amount, 75000);
        assert_eq!(draft.stock_decrements, vec![(p.id, 3)]);
    }

    #[test]
    fn charges_enter_the_total_but_not_the_subtotal() {
        let p = product("Widget", 10000, 5);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        cart::add_item(&mut cart, &catalog, p.id, 1).unwrap();

        let charges = Charges {
            shipping_fee: 3000,
            discount_amount: 500,
        };
        let draft = build_order(&cart, &catalog, &customer(), charges, Utc::now()).unwrap();
        assert_eq!(draft.subtotal, 10000);
        assert_eq!(draft.shipping_fee, 3000);
        assert_eq!(draft.discount_amount, 500);
        assert_eq!(draft.total_amount, 12500);
    }

    #[test]
    fn sale_price_is_snapshotted_into_lines() {
        let mut p = product("Deal", 2000, 5);
        p.sale_price = Some(1500);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        cart::add_item(&mut cart, &catalog, p.id, 2).unwrap();

        let draft =
            build_order(&cart, &catalog, &customer(), Charges::default(), Utc::now()).unwrap();
        assert_eq!(draft.lines[0].product_price, 1500);
        assert_eq!(draft.lines[0].total_price, 3000);
    }

    #[test]
    fn unmanaged_products_skip_stock_decrements() {
        let mut digital = product("E-book", 500, 0);
        digital.manage_stock = false;
        let physical = product("Mug", 1000, 5);
        let catalog = Catalog::new([digital.clone(), physical.clone()]);
        let mut cart = Cart::new();
        cart::add_item(&mut cart, &catalog, digital.id, 3).unwrap();
        cart::add_item(&mut cart, &catalog, physical.id, 1).unwrap();

        let draft =
            build_order(&cart, &catalog, &customer(), Charges::default(), Utc::now()).unwrap();
        assert_eq!(draft.stock_decrements, vec![(physical.id, 1)]);
        assert_eq!(draft.lines.len(), 2);
    }

    #[test]
    fn order_number_shape() {
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 14, 30, 5).unwrap();
        let n = order_number(at, Uuid::new_v4());
        assert!(n.starts_with("ORD20250309143005"));
        assert_eq!(n.len(), "ORD20250309143005".len() + 6);

        // same second, different entropy, no collision
        let other = order_number(at, Uuid::new_v4());
        assert_ne!(n, other);
    }

    #[test]
    fn status_parsing_round_trips() {
        for s in [
            "pending",
            "confirmed",
            "processing",
            "shipped",
            "delivered",
            "cancelled",
        ] {
            assert_eq!(OrderStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(matches!(
            OrderStatus::parse("paid"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn reentering_a_status_restamps_its_timestamp() {
        let first = Utc.with_ymd_and_hms(2025, 3, 9, 10, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 3, 9, 11, 0, 0).unwrap();
        let a = transition_stamps(OrderStatus::Shipped, first);
        let b = transition_stamps(OrderStatus::Shipped, second);
        assert_eq!(a.shipped_at, Some(first));
        assert_eq!(b.shipped_at, Some(second));
        assert!(a.confirmed_at.is_none() && a.delivered_at.is_none());
    }

    #[test]
    fn cancelled_stamps_nothing() {
        let stamps = transition_stamps(OrderStatus::Cancelled, Utc::now());
        assert_eq!(stamps, StatusStamps::default());
    }

    #[test]
    fn admin_notes_append() {
        assert_eq!(append_admin_note(None, "called customer"), "called customer");
        assert_eq!(
            append_admin_note(Some("first"), "second"),
            "first\nsecond"
        );
        assert_eq!(append_admin_note(Some("   "), "note"), "note");
    }
}
