//! Wire shapes of the storefront JSON API.

use foodcmp_core::{ItemResult, ProviderId};
use serde::{Deserialize, Serialize};

/// Body of `GET /search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<WireItem>,
}

/// One menu item as the storefront reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct WireItem {
    pub restaurant_name: String,
    pub item_name: String,
    pub price: f64,
    #[serde(default)]
    pub final_price: Option<f64>,
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    #[serde(default)]
    pub coupon: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
}

impl WireItem {
    #[must_use]
    pub fn into_item(self, provider: ProviderId) -> ItemResult {
        let mut item = ItemResult::new(provider, self.restaurant_name, self.item_name, self.price);
        item.final_price = self.final_price;
        item.discount_percentage = self.discount_percentage;
        item.coupon_applied = self.coupon;
        item.rating = self.rating;
        item.url = self.url;
        item
    }
}

/// Body of `GET /cart`.
#[derive(Debug, Clone, Deserialize)]
pub struct CartResponse {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    pub restaurant_name: String,
    pub item_name: String,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl CartLine {
    /// Matches on restaurant and item name, ignoring case and outer
    /// whitespace.
    #[must_use]
    pub fn is_for(&self, item: &ItemResult) -> bool {
        same_name(&self.restaurant_name, &item.restaurant_name)
            && same_name(&self.item_name, &item.item_name)
            && self.quantity.is_none_or(|q| q > 0)
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Body of `POST /cart/items` and `DELETE /cart/items`.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemBody<'a> {
    pub restaurant_name: &'a str,
    pub item_name: &'a str,
    pub price: f64,
    pub quantity: u32,
}

impl<'a> CartItemBody<'a> {
    #[must_use]
    pub fn for_item(item: &'a ItemResult) -> Self {
        Self {
            restaurant_name: &item.restaurant_name,
            item_name: &item.item_name,
            price: item.effective_price(),
            quantity: 1,
        }
    }
}
