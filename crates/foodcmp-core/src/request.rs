//! Validated search criteria for one comparison run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RequestError};

pub const DEFAULT_MIN_RATING: f64 = 3.8;
pub const DEFAULT_MAX_RESULTS_PER_PROVIDER: u32 = 5;
pub const MAX_RATING: f64 = 5.0;

/// User-supplied search criteria before validation.
///
/// This is the shape accepted from config files and the CLI. Turn it into a
/// [`SearchRequest`] with [`RawSearchRequest::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSearchRequest {
    pub food_items: Vec<String>,
    #[serde(default = "default_min_rating")]
    pub min_rating: f64,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default = "default_max_results")]
    pub max_results_per_provider: u32,
    #[serde(default)]
    pub location: Option<String>,
}

fn default_min_rating() -> f64 {
    DEFAULT_MIN_RATING
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS_PER_PROVIDER
}

impl RawSearchRequest {
    /// Creates a raw request for `food_items` with default filters.
    #[must_use]
    pub fn new<I, S>(food_items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            food_items: food_items.into_iter().map(Into::into).collect(),
            min_rating: DEFAULT_MIN_RATING,
            price_min: None,
            price_max: None,
            max_results_per_provider: DEFAULT_MAX_RESULTS_PER_PROVIDER,
            location: None,
        }
    }

    /// Validates the raw criteria and freezes them into a [`SearchRequest`].
    ///
    /// Food items are trimmed and blank entries dropped. A blank location is
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if no food item remains, the rating is outside
    /// `0..=5`, a price bound is negative or not finite, the floor exceeds the
    /// ceiling, or the per-provider cap is zero.
    pub fn validate(self) -> Result<SearchRequest, RequestError> {
        let food_items: Vec<String> = self
            .food_items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        if food_items.is_empty() {
            return Err(RequestError::EmptyQuery);
        }

        if !self.min_rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.min_rating) {
            return Err(RequestError::InvalidRating(self.min_rating));
        }

        for (field, bound) in [("price_min", self.price_min), ("price_max", self.price_max)] {
            if let Some(value) = bound {
                if !value.is_finite() || value < 0.0 {
                    return Err(RequestError::InvalidPrice { field, value });
                }
            }
        }

        if let (Some(floor), Some(ceiling)) = (self.price_min, self.price_max) {
            if floor > ceiling {
                return Err(RequestError::InvertedPriceBounds { floor, ceiling });
            }
        }

        if self.max_results_per_provider == 0 {
            return Err(RequestError::ZeroMaxResults);
        }

        let location = self
            .location
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty());

        Ok(SearchRequest {
            food_items,
            min_rating: self.min_rating,
            price_min: self.price_min,
            price_max: self.price_max,
            max_results_per_provider: self.max_results_per_provider,
            location,
        })
    }
}

/// Immutable, validated search criteria.
///
/// Deserializing goes through [`RawSearchRequest::validate`], so a
/// `SearchRequest` value always satisfies its invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSearchRequest")]
pub struct SearchRequest {
    food_items: Vec<String>,
    min_rating: f64,
    price_min: Option<f64>,
    price_max: Option<f64>,
    max_results_per_provider: u32,
    location: Option<String>,
}

impl TryFrom<RawSearchRequest> for SearchRequest {
    type Error = RequestError;

    fn try_from(raw: RawSearchRequest) -> Result<Self, Self::Error> {
        raw.validate()
    }
}

impl SearchRequest {
    #[must_use]
    pub fn food_items(&self) -> &[String] {
        &self.food_items
    }

    #[must_use]
    pub fn min_rating(&self) -> f64 {
        self.min_rating
    }

    #[must_use]
    pub fn price_min(&self) -> Option<f64> {
        self.price_min
    }

    #[must_use]
    pub fn price_max(&self) -> Option<f64> {
        self.price_max
    }

    #[must_use]
    pub fn max_results_per_provider(&self) -> usize {
        usize::try_from(self.max_results_per_provider).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns `true` if a rating passes the minimum-rating filter.
    ///
    /// An unknown rating passes; only a known rating below the minimum is
    /// rejected.
    #[must_use]
    pub fn accepts_rating(&self, rating: Option<f64>) -> bool {
        rating.is_none_or(|r| r >= self.min_rating)
    }

    /// Returns `true` if `price` lies within the configured bounds.
    #[must_use]
    pub fn accepts_price(&self, price: f64) -> bool {
        self.price_min.is_none_or(|floor| price >= floor)
            && self.price_max.is_none_or(|ceiling| price <= ceiling)
    }
}

/// Load a search request from a JSON or YAML file.
///
/// Files ending in `.json` are parsed as JSON; anything else as YAML (which
/// also accepts JSON documents).
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed, or if the
/// parsed request fails validation.
pub fn load_request(path: &Path) -> Result<SearchRequest, ConfigError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: display.clone(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let raw: RawSearchRequest = if is_json {
        serde_json::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: display.clone(),
            reason: e.to_string(),
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: display.clone(),
            reason: e.to_string(),
        })?
    };

    raw.validate().map_err(|source| ConfigError::Request {
        path: display,
        source,
    })
}

#[cfg(test)]
#[path = "request_test.rs"]
mod tests;
