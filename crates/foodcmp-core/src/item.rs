use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::{SearchRequest, MAX_RATING};

/// Identifier of a delivery provider.
///
/// The known providers get their own variants; anything else is carried as
/// [`ProviderId::Other`] so new providers can be registered without touching
/// this type. Build ids through `From<&str>`/`From<String>`: an
/// [`OtherProvider`] can never hold a known provider's name, so every id
/// survives a serialization round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderId {
    Swiggy,
    Zomato,
    Other(OtherProvider),
}

/// Name of a provider without a dedicated [`ProviderId`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OtherProvider(String);

impl OtherProvider {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ProviderId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            ProviderId::Swiggy => "swiggy",
            ProviderId::Zomato => "zomato",
            ProviderId::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for ProviderId {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "swiggy" => ProviderId::Swiggy,
            "zomato" => ProviderId::Zomato,
            _ => ProviderId::Other(OtherProvider(s)),
        }
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        ProviderId::from(s.to_owned())
    }
}

impl From<ProviderId> for String {
    fn from(id: ProviderId) -> Self {
        id.as_str().to_owned()
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One matching menu item captured from a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub provider: ProviderId,
    pub restaurant_name: String,
    pub item_name: String,
    /// Listed price before any discount.
    pub item_price: f64,
    /// Price after discounts and coupons, if the provider reported one.
    pub final_price: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub coupon_applied: Option<String>,
    pub rating: Option<f64>,
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ItemResult {
    /// Creates an item with only the required fields set, captured now.
    #[must_use]
    pub fn new(
        provider: ProviderId,
        restaurant_name: impl Into<String>,
        item_name: impl Into<String>,
        item_price: f64,
    ) -> Self {
        Self {
            provider,
            restaurant_name: restaurant_name.into(),
            item_name: item_name.into(),
            item_price,
            final_price: None,
            discount_percentage: None,
            coupon_applied: None,
            rating: None,
            url: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_final_price(mut self, final_price: f64) -> Self {
        self.final_price = Some(final_price);
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    #[must_use]
    pub fn with_coupon(mut self, coupon: impl Into<String>) -> Self {
        self.coupon_applied = Some(coupon.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The price a customer would actually pay: the final price when known,
    /// otherwise the listed price.
    #[must_use]
    pub fn effective_price(&self) -> f64 {
        self.final_price.unwrap_or(self.item_price)
    }

    /// Returns `true` if this item passes the rating and price filters of
    /// `request`.
    #[must_use]
    pub fn matches(&self, request: &SearchRequest) -> bool {
        request.accepts_rating(self.rating) && request.accepts_price(self.effective_price())
    }

    /// Normalizes provider-reported values before the item is accepted into a
    /// report.
    ///
    /// - a final price above the listed price is clamped to the listed price
    /// - a rating outside `0..=5` is dropped
    /// - a missing discount percentage is derived from the two prices
    ///
    /// Returns `None` for items whose prices are not usable numbers.
    #[must_use]
    pub fn normalized(mut self) -> Option<Self> {
        if !self.item_price.is_finite() || self.item_price < 0.0 {
            return None;
        }
        match self.final_price {
            Some(p) if !p.is_finite() || p < 0.0 => return None,
            Some(p) if p > self.item_price => self.final_price = Some(self.item_price),
            _ => {}
        }
        self.rating = self
            .rating
            .filter(|r| r.is_finite() && (0.0..=MAX_RATING).contains(r));
        if self.discount_percentage.is_none() {
            self.discount_percentage = self.computed_discount();
        }
        Some(self)
    }

    fn computed_discount(&self) -> Option<f64> {
        let final_price = self.final_price?;
        if self.item_price <= 0.0 {
            return None;
        }
        let pct = (self.item_price - final_price) / self.item_price * 100.0;
        Some((pct * 100.0).round() / 100.0)
    }

    /// Identity used to collapse duplicate captures of the same offer.
    ///
    /// The capture timestamp is not part of the key.
    #[must_use]
    pub fn dedup_key(&self) -> (ProviderId, String, String, u64) {
        (
            self.provider.clone(),
            self.restaurant_name.to_lowercase(),
            self.item_name.to_lowercase(),
            self.effective_price().to_bits(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RawSearchRequest;

    fn item(price: f64) -> ItemResult {
        ItemResult::new(ProviderId::Swiggy, "Pizza Hut", "Margherita", price)
    }

    #[test]
    fn provider_id_round_trips_known_and_custom_names() {
        assert_eq!(ProviderId::from("Swiggy"), ProviderId::Swiggy);
        assert_eq!(ProviderId::from("zomato"), ProviderId::Zomato);
        assert_eq!(
            ProviderId::from("magicpin"),
            ProviderId::Other(OtherProvider("magicpin".to_string()))
        );

        let json = serde_json::to_string(&ProviderId::Zomato).unwrap();
        assert_eq!(json, "\"zomato\"");
        let back: ProviderId = serde_json::from_str("\"eatsure\"").unwrap();
        assert_eq!(back.to_string(), "eatsure");
    }

    #[test]
    fn known_names_never_become_other() {
        for name in ["Swiggy", " zomato", "ZOMATO", "magicpin", "EatSure"] {
            let id = ProviderId::from(name.trim());
            if let ProviderId::Other(other) = &id {
                assert_ne!(other.as_str().to_lowercase(), "swiggy");
                assert_ne!(other.as_str().to_lowercase(), "zomato");
            }
            let json = serde_json::to_string(&id).unwrap();
            let back: ProviderId = serde_json::from_str(&json).unwrap();
            assert_eq!(back, id, "{name}");
        }
    }

    #[test]
    fn effective_price_prefers_final_price() {
        assert_eq!(item(300.0).effective_price(), 300.0);
        assert_eq!(item(300.0).with_final_price(240.0).effective_price(), 240.0);
    }

    #[test]
    fn normalized_derives_discount_percentage() {
        let n = item(300.0).with_final_price(200.0).normalized().unwrap();
        assert_eq!(n.discount_percentage, Some(33.33));
    }

    #[test]
    fn normalized_keeps_reported_discount() {
        let mut i = item(300.0).with_final_price(200.0);
        i.discount_percentage = Some(30.0);
        assert_eq!(i.normalized().unwrap().discount_percentage, Some(30.0));
    }

    #[test]
    fn normalized_clamps_final_price_to_listed_price() {
        let n = item(100.0).with_final_price(150.0).normalized().unwrap();
        assert_eq!(n.final_price, Some(100.0));
        assert_eq!(n.discount_percentage, Some(0.0));
    }

    #[test]
    fn normalized_drops_out_of_range_rating() {
        let n = item(100.0).with_rating(7.5).normalized().unwrap();
        assert!(n.rating.is_none());
    }

    #[test]
    fn normalized_rejects_unusable_price() {
        assert!(item(f64::NAN).normalized().is_none());
        assert!(item(-5.0).normalized().is_none());
        assert!(item(10.0).with_final_price(-1.0).normalized().is_none());
    }

    #[test]
    fn matches_uses_effective_price_for_bounds() {
        let mut raw = RawSearchRequest::new(["pizza"]);
        raw.price_max = Some(250.0);
        let req = raw.validate().unwrap();

        assert!(!item(300.0).matches(&req));
        assert!(item(300.0).with_final_price(240.0).matches(&req));
        assert!(!item(200.0).with_rating(2.0).matches(&req));
    }

    #[test]
    fn dedup_key_ignores_timestamp_and_case() {
        let a = item(100.0);
        let mut b = item(100.0);
        b.restaurant_name = "PIZZA HUT".to_string();
        b.timestamp = a.timestamp + chrono::Duration::seconds(5);
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_ne!(a.dedup_key(), item(101.0).dedup_key());
    }
}
