//! Session cart state and its read-side view.
//!
//! Everything here is synchronous and I/O-free: the HTTP layer loads the
//! cart and the relevant slice of the catalog, calls in, and persists
//! whatever comes back.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Product,
};

/// One product/quantity pairing inside a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A visitor's cart: product id mapped to desired quantity, kept in
/// insertion order. Quantities are always positive; mutations that would
/// drop a line to zero or below remove it instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from stored lines, preserving their order.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn quantity(&self, product_id: Uuid) -> Option<i32> {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map(|line| line.quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// The read side of one store's product data, resolved up front by the
/// caller. The cart code itself never queries anything.
#[derive(Debug, Default)]
pub struct Catalog {
    by_id: HashMap<Uuid, Product>,
}

impl Catalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            by_id: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn product(&self, product_id: Uuid) -> Option<&Product> {
        self.by_id.get(&product_id)
    }

    /// Resolve an id to a sellable product; deactivated products are
    /// indistinguishable from missing ones.
    pub fn sellable(&self, product_id: Uuid) -> Option<&Product> {
        self.product(product_id).filter(|p| p.is_active)
    }
}

/// Add `quantity` of a product, merging into an existing line when the
/// product is already in the cart. Stock is checked but not touched; it is
/// only decremented at checkout.
pub fn add_item(
    cart: &mut Cart,
    catalog: &Catalog,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".into(),
        ));
    }
    let product = catalog.sellable(product_id).ok_or(AppError::NotFound)?;
    if product.manage_stock && product.stock_quantity < quantity {
        return Err(AppError::Stock {
            product: product.name.clone(),
        });
    }
    match cart
        .lines
        .iter_mut()
        .find(|line| line.product_id == product_id)
    {
        Some(line) => line.quantity += quantity,
        None => cart.lines.push(CartLine {
            product_id,
            quantity,
        }),
    }
    Ok(())
}

/// Set a line to `quantity`; anything at or below zero removes the line.
/// Removing an absent id is a no-op, not an error.
pub fn update_item(cart: &mut Cart, product_id: Uuid, quantity: i32) {
    if quantity > 0 {
        match cart
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) => line.quantity = quantity,
            None => cart.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
    } else {
        cart.lines.retain(|line| line.product_id != product_id);
    }
}

/// Idempotent removal.
pub fn remove_item(cart: &mut Cart, product_id: Uuid) {
    cart.lines.retain(|line| line.product_id != product_id);
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartViewLine {
    pub product: Product,
    pub quantity: i32,
    pub line_total: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub lines: Vec<CartViewLine>,
    pub grand_total: i64,
    pub item_count: i64,
}

/// Resolve every line against the catalog, in cart order. Lines whose
/// product is gone or deactivated are dropped from the view; the stored
/// cart keeps them and they resurface if the product comes back.
pub fn cart_view(cart: &Cart, catalog: &Catalog) -> CartView {
    let mut lines = Vec::new();
    let mut grand_total = 0i64;
    let mut item_count = 0i64;
    for line in cart.lines() {
        let Some(product) = catalog.sellable(line.product_id) else {
            continue;
        };
        let line_total = product.current_price() * i64::from(line.quantity);
        grand_total += line_total;
        item_count += i64::from(line.quantity);
        lines.push(CartViewLine {
            product: product.clone(),
            quantity: line.quantity,
            line_total,
        });
    }
    CartView {
        lines,
        grand_total,
        item_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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

    #[test]
    fn add_accumulates_quantities() {
        let p = product("Mug", 1000, 50);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        add_item(&mut cart, &catalog, p.id, 2).unwrap();
        add_item(&mut cart, &catalog, p.id, 3).unwrap();
        assert_eq!(cart.quantity(p.id), Some(5));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn add_rejects_non_positive_quantity() {
        let p = product("Mug", 1000, 50);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        let err = add_item(&mut cart, &catalog, p.id, 0).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = add_item(&mut cart, &catalog, p.id, -4).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn add_rejects_unknown_product() {
        let catalog = Catalog::new([]);
        let mut cart = Cart::new();
        let err = add_item(&mut cart, &catalog, Uuid::new_v4(), 1).unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn add_treats_inactive_product_as_missing() {
        let mut p = product("Mug", 1000, 50);
        p.is_active = false;
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        let err = add_item(&mut cart, &catalog, p.id, 1).unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn add_checks_stock_for_managed_products() {
        let p = product("Mug", 1000, 2);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        let err = add_item(&mut cart, &catalog, p.id, 3).unwrap_err();
        assert!(matches!(err, AppError::Stock { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn add_ignores_stock_for_unmanaged_products() {
        let mut p = product("E-book", 500, 0);
        p.manage_stock = false;
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        add_item(&mut cart, &catalog, p.id, 10).unwrap();
        assert_eq!(cart.quantity(p.id), Some(10));
    }

    #[test]
    fn update_to_zero_removes_the_line() {
        let p = product("Mug", 1000, 50);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        add_item(&mut cart, &catalog, p.id, 4).unwrap();
        update_item(&mut cart, p.id, 0);
        assert_eq!(cart.quantity(p.id), None);
        update_item(&mut cart, p.id, -1);
        assert!(cart.is_empty());
    }

    #[test]
    fn update_sets_or_inserts_positive_quantities() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        update_item(&mut cart, id, 7);
        assert_eq!(cart.quantity(id), Some(7));
        update_item(&mut cart, id, 2);
        assert_eq!(cart.quantity(id), Some(2));
    }

    #[test]
    fn remove_is_idempotent() {
        let p = product("Mug", 1000, 50);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        add_item(&mut cart, &catalog, p.id, 1).unwrap();
        remove_item(&mut cart, p.id);
        let after_first = cart.clone();
        remove_item(&mut cart, p.id);
        assert_eq!(cart, after_first);
        assert!(cart.is_empty());
    }

    #[test]
    fn view_totals_and_ordering() {
        let a = product("Alpha", 25000, 5);
        let b = product("Beta", 400, 5);
        let catalog = Catalog::new([a.clone(), b.clone()]);
        let mut cart = Cart::new();
        add_item(&mut cart, &catalog, a.id, 3).unwrap();
        add_item(&mut cart, &catalog, b.id, 2).unwrap();

        let view = cart_view(&cart, &catalog);
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[0].product.id, a.id);
        assert_eq!(view.lines[0].line_total, 75000);
        assert_eq!(view.lines[1].line_total, 800);
        assert_eq!(view.grand_total, 75800);
        assert_eq!(view.item_count, 5);
    }

    #[test]
    fn view_uses_sale_price_only_when_lower() {
        let mut on_sale = product("Sale", 1000, 5);
        on_sale.sale_price = Some(750);
        let mut bad_sale = product("NoSale", 1000, 5);
        bad_sale.sale_price = Some(1200);
        let catalog = Catalog::new([on_sale.clone(), bad_sale.clone()]);
        let mut cart = Cart::new();
        add_item(&mut cart, &catalog, on_sale.id, 1).unwrap();
        add_item(&mut cart, &catalog, bad_sale.id, 1).unwrap();

        let view = cart_view(&cart, &catalog);
        assert_eq!(view.lines[0].line_total, 750);
        assert_eq!(view.lines[1].line_total, 1000);
        assert_eq!(view.grand_total, 1750);
    }

    #[test]
    fn view_drops_dangling_lines_but_cart_keeps_them() {
        let p = product("Mug", 1000, 50);
        let catalog = Catalog::new([p.clone()]);
        let mut cart = Cart::new();
        add_item(&mut cart, &catalog, p.id, 2).unwrap();

        // Product disappears from the catalog afterwards.
        let empty = Catalog::new([]);
        let view = cart_view(&cart, &empty);
        assert!(view.lines.is_empty());
        assert_eq!(view.grand_total, 0);
        assert_eq!(cart.quantity(p.id), Some(2));
    }
}
