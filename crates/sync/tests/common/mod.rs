//! Fakes and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::RwLock;
use zahra_core::currency::{Currency, ExchangeRateSnapshot, RateBook};
use zahra_core::routing::{Account, RoutingPolicy};
use zahra_core::validation::{LineItemInput, PaymentMethod, SalePayload};
use zahra_shared::types::{AccountId, ActionId, CompanyId, CurrencyCode, ExchangeOperator, UserId};
use zahra_sync::{
    CacheInvalidator, Connectivity, CreatedResource, FeedbackQueue, OfflineQueue,
    OpendalQueueStore, RemoteCall, RemoteError, RemoteProcedures, ReplayCoordinator,
    TransactionReplayHandler, TransactionSubmitter,
};

/// How the fake remote answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Accept,
    RejectAll,
    Unreachable,
}

/// Records every call and answers according to its mode.
pub struct ScriptedRemote {
    mode: Mutex<Mode>,
    rejected_keys: Mutex<HashSet<String>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self {
            mode: Mutex::new(Mode::Accept),
            rejected_keys: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Rejects calls carrying `id` as their idempotency key.
    pub fn reject(&self, id: ActionId) {
        self.rejected_keys.lock().unwrap().insert(id.to_string());
    }

    pub fn accept_all(&self) {
        self.rejected_keys.lock().unwrap().clear();
        self.set_mode(Mode::Accept);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Idempotency keys of all calls, in call order.
    pub fn keys(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.idempotency_key().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl RemoteProcedures for ScriptedRemote {
    async fn invoke(&self, call: RemoteCall) -> Result<CreatedResource, RemoteError> {
        self.calls.lock().unwrap().push(call.clone());
        let mode = *self.mode.lock().unwrap();

        let rejected = call
            .idempotency_key()
            .is_some_and(|key| self.rejected_keys.lock().unwrap().contains(key));

        match mode {
            Mode::Unreachable => Err(RemoteError::Transport("connection refused".to_string())),
            Mode::RejectAll => Err(RemoteError::Rejected {
                code: Some("P0001".to_string()),
                message: "Insufficient stock".to_string(),
            }),
            Mode::Accept if rejected => Err(RemoteError::Rejected {
                code: Some("P0001".to_string()),
                message: "Insufficient stock".to_string(),
            }),
            Mode::Accept => Ok(CreatedResource {
                id: Some(format!("inv-{}", self.calls.lock().unwrap().len())),
                number: None,
                total: None,
            }),
        }
    }
}

/// Counts invalidation signals.
#[derive(Default)]
pub struct CountingInvalidator {
    count: AtomicUsize,
}

impl CountingInvalidator {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl CacheInvalidator for CountingInvalidator {
    fn invalidate_all(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn code(s: &str) -> CurrencyCode {
    s.parse().unwrap()
}

fn account(code: &str, currency: Option<&str>, parent: Option<AccountId>) -> Account {
    Account {
        id: AccountId::new(),
        code: code.to_string(),
        name: format!("Cash Box {code}"),
        account_type: "asset".to_string(),
        currency_code: currency.map(self::code),
        parent_id: parent,
        is_system: false,
        balance: Decimal::ZERO,
    }
}

/// Chart of accounts with a cash box (base) and its USD and YER sub-accounts.
pub struct Chart {
    pub accounts: Vec<Account>,
    pub cash_box: AccountId,
    pub usd_box: AccountId,
    pub yer_box: AccountId,
}

pub fn chart() -> Chart {
    let cash = account("1010", None, None);
    let usd = account("101001", Some("USD"), Some(cash.id));
    let yer = account("101002", Some("YER"), Some(cash.id));
    Chart {
        cash_box: cash.id,
        usd_box: usd.id,
        yer_box: yer.id,
        accounts: vec![cash, usd, yer],
    }
}

/// USD at 3.75 (multiply) and YER at 430 (divide), effective 2026-01-01.
pub fn rate_book() -> RateBook {
    let mut book = RateBook::new();
    book.register_currency(Currency::new(code("USD"), ExchangeOperator::Multiply));
    book.register_currency(Currency::new(code("YER"), ExchangeOperator::Divide));

    let created_at = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
    for (currency, rate) in [("USD", dec!(3.75)), ("YER", dec!(430))] {
        book.record(ExchangeRateSnapshot {
            currency_code: code(currency),
            rate_to_base: rate,
            effective_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            created_at,
        })
        .unwrap();
    }
    book
}

pub fn sale(currency: Option<&str>, treasury: Option<AccountId>) -> SalePayload {
    SalePayload {
        company_id: CompanyId::new(),
        user_id: UserId::new(),
        party_id: None,
        items: vec![LineItemInput {
            product_id: Some("p1".to_string()),
            quantity: Some(dec!(2)),
            unit_price: Some(dec!(50)),
            cost_price: None,
        }],
        payment_method: Some(PaymentMethod::Cash),
        treasury_account_id: treasury,
        currency: currency.map(code),
        exchange_rate: None,
        notes: None,
    }
}

/// Everything wired together over an in-memory queue.
pub struct Harness {
    pub remote: Arc<ScriptedRemote>,
    pub queue: Arc<OfflineQueue>,
    pub connectivity: Arc<Connectivity>,
    pub rates: Arc<RwLock<RateBook>>,
    pub submitter: Arc<TransactionSubmitter>,
    pub feedback: Arc<FeedbackQueue>,
    pub invalidator: Arc<CountingInvalidator>,
    pub coordinator: Arc<ReplayCoordinator>,
    pub chart: Chart,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(RoutingPolicy::FallbackToParent)
    }

    pub fn with_policy(policy: RoutingPolicy) -> Self {
        let store = Arc::new(OpendalQueueStore::memory().unwrap());
        Self::with_queue(Arc::new(OfflineQueue::new(store)), policy)
    }

    pub fn with_queue(queue: Arc<OfflineQueue>, policy: RoutingPolicy) -> Self {
        let remote = Arc::new(ScriptedRemote::new());
        let connectivity = Arc::new(Connectivity::new(true));
        let rates = Arc::new(RwLock::new(rate_book()));
        let submitter = Arc::new(TransactionSubmitter::new(
            remote.clone(),
            queue.clone(),
            connectivity.clone(),
            rates.clone(),
            policy,
        ));
        let feedback = Arc::new(FeedbackQueue::new());
        let invalidator = Arc::new(CountingInvalidator::default());
        let coordinator = Arc::new(
            Arc::new(TransactionReplayHandler::new(submitter.clone())).register(
                ReplayCoordinator::new(queue.clone(), feedback.clone(), invalidator.clone()),
            ),
        );

        Self {
            remote,
            queue,
            connectivity,
            rates,
            submitter,
            feedback,
            invalidator,
            coordinator,
            chart: chart(),
        }
    }
}
