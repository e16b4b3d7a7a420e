//! In-memory provider used by the orchestrator integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use foodcmp_core::{ItemResult, ProviderId, SearchRequest};
use foodcmp_orchestrator::{IdempotencyToken, Provider, ProviderError, Readiness};

/// How the stub answers one `add_item_to_cart` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddBehavior {
    Apply,
    Fail,
    /// The line lands in the cart but the caller sees an error.
    ApplyThenFail,
}

/// How the stub answers one `verify_cart_contains` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyBehavior {
    Answer(bool),
    Error,
}

#[derive(Debug, Clone)]
struct CartLine {
    restaurant_name: String,
    item_name: String,
    token: IdempotencyToken,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub initialize: AtomicU32,
    pub search: AtomicU32,
    pub add: AtomicU32,
    pub verify: AtomicU32,
    pub remove: AtomicU32,
}

impl Calls {
    pub fn total(&self) -> u32 {
        self.initialize.load(Ordering::SeqCst)
            + self.search.load(Ordering::SeqCst)
            + self.add.load(Ordering::SeqCst)
            + self.verify.load(Ordering::SeqCst)
            + self.remove.load(Ordering::SeqCst)
    }
}

/// Scriptable provider with a real in-memory cart.
///
/// Adds are deduplicated by token: an add whose token already has a line in
/// the cart is a no-op. Verify reads the cart unless a scripted answer is
/// queued.
pub struct StubProvider {
    id: ProviderId,
    readiness: Readiness,
    search_delay: Duration,
    items: Vec<ItemResult>,
    search_error: Option<ProviderError>,
    add_script: Mutex<VecDeque<AddBehavior>>,
    add_default: AddBehavior,
    add_delay: Duration,
    verify_script: Mutex<VecDeque<VerifyBehavior>>,
    verify_fixed: Option<bool>,
    remove_failures: AtomicU32,
    cart: Mutex<Vec<CartLine>>,
    tokens: Mutex<Vec<IdempotencyToken>>,
    pub calls: Calls,
}

impl StubProvider {
    pub fn new(id: impl Into<ProviderId>) -> Self {
        Self {
            id: id.into(),
            readiness: Readiness::Ready,
            search_delay: Duration::ZERO,
            items: Vec::new(),
            search_error: None,
            add_script: Mutex::new(VecDeque::new()),
            add_default: AddBehavior::Apply,
            add_delay: Duration::ZERO,
            verify_script: Mutex::new(VecDeque::new()),
            verify_fixed: None,
            remove_failures: AtomicU32::new(0),
            cart: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
            calls: Calls::default(),
        }
    }

    pub fn with_items(mut self, items: Vec<ItemResult>) -> Self {
        self.items = items;
        self
    }

    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = delay;
        self
    }

    pub fn unavailable(mut self, reason: &str) -> Self {
        self.readiness = Readiness::Unavailable(reason.to_string());
        self
    }

    pub fn failing_search(mut self, error: ProviderError) -> Self {
        self.search_error = Some(error);
        self
    }

    pub fn with_add_script(self, script: impl IntoIterator<Item = AddBehavior>) -> Self {
        *self.add_script.lock().unwrap() = script.into_iter().collect();
        self
    }

    pub fn with_add_default(mut self, behavior: AddBehavior) -> Self {
        self.add_default = behavior;
        self
    }

    /// Every add sleeps this long before answering.
    pub fn with_add_delay(mut self, delay: Duration) -> Self {
        self.add_delay = delay;
        self
    }

    pub fn with_verify_script(self, script: impl IntoIterator<Item = bool>) -> Self {
        self.with_verify_behaviors(script.into_iter().map(VerifyBehavior::Answer))
    }

    pub fn with_verify_behaviors(self, script: impl IntoIterator<Item = VerifyBehavior>) -> Self {
        *self.verify_script.lock().unwrap() = script.into_iter().collect();
        self
    }

    /// The next `count` removes error without touching the cart.
    pub fn failing_removes(self, count: u32) -> Self {
        self.remove_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn verify_always(mut self, answer: bool) -> Self {
        self.verify_fixed = Some(answer);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn cart_len(&self) -> usize {
        self.cart.lock().unwrap().len()
    }

    pub fn cart_contains(&self, item: &ItemResult) -> bool {
        self.cart
            .lock()
            .unwrap()
            .iter()
            .any(|line| same_item(line, item))
    }

    /// Every token seen by `add_item_to_cart`, in call order.
    pub fn tokens(&self) -> Vec<IdempotencyToken> {
        self.tokens.lock().unwrap().clone()
    }

    fn apply(&self, item: &ItemResult, token: &IdempotencyToken) {
        let mut cart = self.cart.lock().unwrap();
        if !cart.iter().any(|line| line.token == *token) {
            cart.push(CartLine {
                restaurant_name: item.restaurant_name.clone(),
                item_name: item.item_name.clone(),
                token: *token,
            });
        }
    }
}

fn same_item(line: &CartLine, item: &ItemResult) -> bool {
    line.restaurant_name == item.restaurant_name && line.item_name == item.item_name
}

#[async_trait]
impl Provider for StubProvider {
    fn id(&self) -> ProviderId {
        self.id.clone()
    }

    async fn initialize(&self) -> Readiness {
        self.calls.initialize.fetch_add(1, Ordering::SeqCst);
        self.readiness.clone()
    }

    async fn search_items(&self, _request: &SearchRequest) -> Result<Vec<ItemResult>, ProviderError> {
        self.calls.search.fetch_add(1, Ordering::SeqCst);
        if !self.search_delay.is_zero() {
            tokio::time::sleep(self.search_delay).await;
        }
        match &self.search_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.items.clone()),
        }
    }

    async fn add_item_to_cart(
        &self,
        item: &ItemResult,
        token: &IdempotencyToken,
    ) -> Result<(), ProviderError> {
        self.calls.add.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(*token);
        if !self.add_delay.is_zero() {
            tokio::time::sleep(self.add_delay).await;
        }
        let behavior = self
            .add_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.add_default);
        match behavior {
            AddBehavior::Apply => {
                self.apply(item, token);
                Ok(())
            }
            AddBehavior::Fail => Err(ProviderError::Transport("connection reset".to_string())),
            AddBehavior::ApplyThenFail => {
                self.apply(item, token);
                Err(ProviderError::Transport("response lost".to_string()))
            }
        }
    }

    async fn verify_cart_contains(&self, item: &ItemResult) -> Result<bool, ProviderError> {
        self.calls.verify.fetch_add(1, Ordering::SeqCst);
        if let Some(answer) = self.verify_fixed {
            return Ok(answer);
        }
        let scripted = self.verify_script.lock().unwrap().pop_front();
        match scripted {
            Some(VerifyBehavior::Answer(answer)) => Ok(answer),
            Some(VerifyBehavior::Error) => {
                Err(ProviderError::Transport("cart read timed out upstream".to_string()))
            }
            None => Ok(self.cart_contains(item)),
        }
    }

    async fn remove_item_from_cart(&self, item: &ItemResult) -> Result<(), ProviderError> {
        self.calls.remove.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .remove_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ProviderError::Transport("cart service unavailable".to_string()));
        }
        self.cart
            .lock()
            .unwrap()
            .retain(|line| !same_item(line, item));
        Ok(())
    }
}

pub fn item(provider: ProviderId, name: &str, price: f64, rating: f64) -> ItemResult {
    ItemResult::new(provider, "Test Kitchen", name, price).with_rating(rating)
}

pub fn as_providers(stubs: &[Arc<StubProvider>]) -> Vec<Arc<dyn Provider>> {
    stubs
        .iter()
        .map(|s| Arc::clone(s) as Arc<dyn Provider>)
        .collect()
}
