//! The single submission path for sales, purchases, their returns, and
//! payment vouchers.
//!
//! Online submissions and replayed actions go through the same steps:
//! 1. Validate the payload
//! 2. Route the treasury account to its currency sub-account
//! 3. Freeze the exchange rate snapshot
//! 4. Invoke the remote procedure with the action's idempotency key
//!
//! When the device is offline, or the procedure cannot be reached, the
//! prepared action is queued instead. The rate and account are fixed at
//! capture time, so a replay posts exactly what the user saw.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use zahra_core::currency::{RateBook, convert_to_base, round_money};
use zahra_core::rejection::UserFacingError;
use zahra_core::routing::{Account, RoutingError, RoutingPolicy, resolve_treasury_account};
use zahra_core::validation::{
    LineItemInput, PaymentMethod, PaymentPayload, PurchasePayload, SalePayload, ValidationError,
    ValidationErrors, assert_valid, validate_payment_payload, validate_purchase_payload,
    validate_purchase_return_payload, validate_sale_payload, validate_sale_return_payload,
};
use zahra_shared::types::{AccountId, ActionId, CurrencyCode, ExchangeOperator};

use crate::connectivity::Connectivity;
use crate::gateway::{CreatedResource, RemoteCall, RemoteError, RemoteProcedures};
use crate::queue::{ActionType, OfflineQueue, QueueError, QueuedAction};
use crate::replay::{ActionHandler, ReplayCoordinator, ReplayError};

/// Submission errors. Each one maps to a message the user can act on.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The payload has user-correctable mistakes.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The selected treasury account cannot receive the posting.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// No rate snapshot exists for a foreign-currency transaction.
    #[error("No exchange rate recorded for {0}")]
    MissingRate(CurrencyCode),

    /// The remote procedure refused the transaction.
    #[error("{0}")]
    Rejected(UserFacingError),

    /// The remote procedure could not be reached during replay.
    #[error("{0}")]
    Unreachable(UserFacingError),

    /// The offline queue could not be written.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A queued payload could not be encoded or decoded.
    #[error("invalid queued payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl SubmitError {
    /// Returns the error code for user-facing messages.
    #[must_use]
    pub fn error_code(&self) -> &str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Routing(e) => e.error_code(),
            Self::MissingRate(_) => "MISSING_EXCHANGE_RATE",
            Self::Rejected(e) | Self::Unreachable(e) => &e.code,
            Self::Queue(e) => e.error_code(),
            Self::Payload(_) => "INVALID_PAYLOAD",
        }
    }

    fn from_remote(err: &RemoteError) -> Self {
        if err.is_transient() {
            Self::Unreachable(err.to_user_facing())
        } else {
            Self::Rejected(err.to_user_facing())
        }
    }
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The remote procedure accepted the transaction.
    Posted {
        /// Idempotency key used.
        action_id: ActionId,
        /// Created record.
        resource: CreatedResource,
        /// Transaction total in the base currency.
        base_total: Decimal,
    },
    /// The transaction was captured for replay on reconnect.
    Queued {
        /// Idempotency key of the queued action.
        action_id: ActionId,
        /// Transaction total in the base currency.
        base_total: Decimal,
    },
}

impl SubmitOutcome {
    /// Idempotency key of the submission.
    #[must_use]
    pub fn action_id(&self) -> ActionId {
        match self {
            Self::Posted { action_id, .. } | Self::Queued { action_id, .. } => *action_id,
        }
    }
}

/// A sale with its account routed and rate frozen, as stored in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedSale {
    /// The sale, with the routed account, currency, and rate filled in.
    pub sale: SalePayload,
    /// Operator of the frozen rate.
    pub exchange_operator: ExchangeOperator,
    /// Total in the base currency.
    pub base_total: Decimal,
}

/// A purchase with its account routed and rate frozen, as stored in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedPurchase {
    /// The purchase, with the routed account, currency, and rate filled in.
    pub purchase: PurchasePayload,
    /// Operator of the frozen rate.
    pub exchange_operator: ExchangeOperator,
    /// Total in the base currency.
    pub base_total: Decimal,
}

/// A voucher with its rate frozen and base amount fixed, as stored in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedPayment {
    /// The voucher, with currency and rate filled in.
    pub payment: PaymentPayload,
    /// Operator of the frozen rate.
    pub exchange_operator: ExchangeOperator,
    /// Amount in the base currency.
    pub base_total: Decimal,
}

/// Rate and operator frozen for one transaction.
struct FrozenRate {
    currency: CurrencyCode,
    rate: Decimal,
    operator: ExchangeOperator,
}

/// Submits transactions, online or through the offline queue.
pub struct TransactionSubmitter {
    remote: Arc<dyn RemoteProcedures>,
    queue: Arc<OfflineQueue>,
    connectivity: Arc<Connectivity>,
    rates: Arc<RwLock<RateBook>>,
    policy: RoutingPolicy,
}

impl TransactionSubmitter {
    /// Creates a submitter.
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteProcedures>,
        queue: Arc<OfflineQueue>,
        connectivity: Arc<Connectivity>,
        rates: Arc<RwLock<RateBook>>,
        policy: RoutingPolicy,
    ) -> Self {
        Self {
            remote,
            queue,
            connectivity,
            rates,
            policy,
        }
    }

    /// Validates, routes, and submits a sales invoice.
    ///
    /// `accounts` is the company's chart of accounts, used to route the
    /// selected treasury account to its currency sub-account.
    pub async fn submit_sale(
        &self,
        sale: SalePayload,
        accounts: &[Account],
    ) -> Result<SubmitOutcome, SubmitError> {
        self.submit_sale_as(ActionType::CreateInvoice, sale, accounts)
            .await
    }

    /// Validates and submits a sales return.
    pub async fn submit_sale_return(
        &self,
        sale: SalePayload,
        accounts: &[Account],
    ) -> Result<SubmitOutcome, SubmitError> {
        self.submit_sale_as(ActionType::CreateSaleReturn, sale, accounts)
            .await
    }

    /// Validates, routes, and submits a purchase invoice.
    pub async fn submit_purchase(
        &self,
        purchase: PurchasePayload,
        accounts: &[Account],
    ) -> Result<SubmitOutcome, SubmitError> {
        self.submit_purchase_as(ActionType::CreatePurchase, purchase, accounts)
            .await
    }

    /// Validates and submits a purchase return.
    pub async fn submit_purchase_return(
        &self,
        purchase: PurchasePayload,
        accounts: &[Account],
    ) -> Result<SubmitOutcome, SubmitError> {
        self.submit_purchase_as(ActionType::CreatePurchaseReturn, purchase, accounts)
            .await
    }

    /// Validates and submits a receipt or payment voucher.
    ///
    /// The voucher posts its base amount and keeps the entered amount as
    /// the foreign amount.
    pub async fn submit_payment(
        &self,
        payment: PaymentPayload,
    ) -> Result<SubmitOutcome, SubmitError> {
        assert_valid(validate_payment_payload(&payment))?;

        let prepared = self.prepare_payment(payment).await?;
        let call = payment_call(&prepared);
        let base_total = prepared.base_total;
        let action = QueuedAction::new(ActionType::CreatePayment, serde_json::to_value(&prepared)?);

        self.dispatch(action, call, base_total).await
    }

    /// Resubmits a queued action with its original idempotency key.
    ///
    /// The frozen payload is validated again before the call. Never
    /// re-queues: a failure is reported to the caller so the action stays
    /// where it is.
    pub async fn replay(&self, action: &QueuedAction) -> Result<CreatedResource, SubmitError> {
        let action_type = action.action_type;
        let call = match action_type {
            ActionType::CreateInvoice | ActionType::CreateSaleReturn => {
                let prepared: PreparedSale = serde_json::from_value(action.payload.clone())?;
                assert_valid(sale_errors(action_type, &prepared.sale))?;
                sale_call(action_type, &prepared.sale)
            }
            ActionType::CreatePurchase | ActionType::CreatePurchaseReturn => {
                let prepared: PreparedPurchase = serde_json::from_value(action.payload.clone())?;
                assert_valid(purchase_errors(action_type, &prepared.purchase))?;
                purchase_call(action_type, &prepared)
            }
            ActionType::CreatePayment => {
                let prepared: PreparedPayment = serde_json::from_value(action.payload.clone())?;
                assert_valid(validate_payment_payload(&prepared.payment))?;
                payment_call(&prepared)
            }
        };

        self.remote
            .invoke(call.with_idempotency_key(action.id))
            .await
            .map_err(|e| SubmitError::from_remote(&e))
    }

    async fn submit_sale_as(
        &self,
        action_type: ActionType,
        sale: SalePayload,
        accounts: &[Account],
    ) -> Result<SubmitOutcome, SubmitError> {
        assert_valid(sale_errors(action_type, &sale))?;

        let prepared = self.prepare_sale(sale, accounts).await?;
        let call = sale_call(action_type, &prepared.sale);
        let base_total = prepared.base_total;
        let action = QueuedAction::new(action_type, serde_json::to_value(&prepared)?);

        self.dispatch(action, call, base_total).await
    }

    async fn submit_purchase_as(
        &self,
        action_type: ActionType,
        purchase: PurchasePayload,
        accounts: &[Account],
    ) -> Result<SubmitOutcome, SubmitError> {
        assert_valid(purchase_errors(action_type, &purchase))?;

        let prepared = self.prepare_purchase(purchase, accounts).await?;
        let call = purchase_call(action_type, &prepared);
        let base_total = prepared.base_total;
        let action = QueuedAction::new(action_type, serde_json::to_value(&prepared)?);

        self.dispatch(action, call, base_total).await
    }

    async fn prepare_sale(
        &self,
        mut sale: SalePayload,
        accounts: &[Account],
    ) -> Result<PreparedSale, SubmitError> {
        let frozen = self.freeze_rate(sale.currency.as_ref(), sale.exchange_rate).await?;
        sale.treasury_account_id =
            self.route(sale.treasury_account_id, &frozen.currency, accounts)?;

        let total: Decimal = sale.items.iter().map(LineItemInput::line_total).sum();
        let base_total = convert_to_base(round_money(total), frozen.rate, frozen.operator);

        sale.currency = Some(frozen.currency);
        sale.exchange_rate = Some(frozen.rate);
        Ok(PreparedSale {
            sale,
            exchange_operator: frozen.operator,
            base_total,
        })
    }

    async fn prepare_purchase(
        &self,
        mut purchase: PurchasePayload,
        accounts: &[Account],
    ) -> Result<PreparedPurchase, SubmitError> {
        let frozen = self
            .freeze_rate(purchase.currency.as_ref(), purchase.exchange_rate)
            .await?;
        purchase.treasury_account_id =
            self.route(purchase.treasury_account_id, &frozen.currency, accounts)?;

        let total: Decimal = purchase
            .items
            .iter()
            .map(|item| item.quantity.unwrap_or_default() * item.cost_price.unwrap_or_default())
            .sum();
        let base_total = convert_to_base(round_money(total), frozen.rate, frozen.operator);

        purchase.currency = Some(frozen.currency);
        purchase.exchange_rate = Some(frozen.rate);
        Ok(PreparedPurchase {
            purchase,
            exchange_operator: frozen.operator,
            base_total,
        })
    }

    async fn prepare_payment(
        &self,
        mut payment: PaymentPayload,
    ) -> Result<PreparedPayment, SubmitError> {
        let frozen = self
            .freeze_rate(payment.currency.as_ref(), payment.exchange_rate)
            .await?;

        let amount = round_money(payment.amount.unwrap_or_default());
        let base_total = convert_to_base(amount, frozen.rate, frozen.operator);

        payment.amount = Some(amount);
        payment.currency = Some(frozen.currency);
        payment.exchange_rate = Some(frozen.rate);
        Ok(PreparedPayment {
            payment,
            exchange_operator: frozen.operator,
            base_total,
        })
    }

    /// Uses the rate already on the payload, or the latest snapshot.
    async fn freeze_rate(
        &self,
        currency: Option<&CurrencyCode>,
        explicit_rate: Option<Decimal>,
    ) -> Result<FrozenRate, SubmitError> {
        let currency = currency.cloned().unwrap_or_default();
        let rates = self.rates.read().await;

        if currency.is_base() {
            return Ok(FrozenRate {
                currency,
                rate: Decimal::ONE,
                operator: ExchangeOperator::Multiply,
            });
        }

        let operator = rates.operator_for(&currency);
        if let Some(rate) = explicit_rate.filter(|r| *r > Decimal::ZERO) {
            return Ok(FrozenRate {
                currency,
                rate,
                operator,
            });
        }

        let quote = rates
            .quote(&currency)
            .ok_or_else(|| SubmitError::MissingRate(currency.clone()))?;
        Ok(FrozenRate {
            currency,
            rate: quote.rate,
            operator: quote.operator,
        })
    }

    fn route(
        &self,
        selected: Option<AccountId>,
        currency: &CurrencyCode,
        accounts: &[Account],
    ) -> Result<Option<AccountId>, SubmitError> {
        let Some(selected) = selected else {
            return Ok(None);
        };
        let account = resolve_treasury_account(accounts, &selected, Some(currency), self.policy)?;
        Ok(Some(account.id))
    }

    async fn dispatch(
        &self,
        action: QueuedAction,
        call: RemoteCall,
        base_total: Decimal,
    ) -> Result<SubmitOutcome, SubmitError> {
        let action_id = action.id;

        if !self.connectivity.is_online() {
            self.queue.enqueue(action).await?;
            return Ok(SubmitOutcome::Queued {
                action_id,
                base_total,
            });
        }

        match self.remote.invoke(call.with_idempotency_key(action_id)).await {
            Ok(resource) => {
                info!(
                    %action_id,
                    action_type = %action.action_type,
                    resource_id = ?resource.id,
                    %base_total,
                    "transaction posted"
                );
                Ok(SubmitOutcome::Posted {
                    action_id,
                    resource,
                    base_total,
                })
            }
            Err(err) if err.is_transient() => {
                warn!(%action_id, error = %err, "remote unreachable, queueing transaction");
                self.queue.enqueue(action).await?;
                Ok(SubmitOutcome::Queued {
                    action_id,
                    base_total,
                })
            }
            Err(err) => Err(SubmitError::Rejected(err.to_user_facing())),
        }
    }
}

fn sale_errors(action_type: ActionType, sale: &SalePayload) -> Vec<ValidationError> {
    if action_type == ActionType::CreateSaleReturn {
        validate_sale_return_payload(sale)
    } else {
        validate_sale_payload(sale)
    }
}

fn purchase_errors(action_type: ActionType, purchase: &PurchasePayload) -> Vec<ValidationError> {
    if action_type == ActionType::CreatePurchaseReturn {
        validate_purchase_return_payload(purchase)
    } else {
        validate_purchase_payload(purchase)
    }
}

/// Returns settle against the original invoice, so they carry no payment
/// method or treasury account.
fn sale_call(action_type: ActionType, sale: &SalePayload) -> RemoteCall {
    let items: Vec<Value> = sale
        .items
        .iter()
        .map(|item| {
            json!({
                "product_id": item.product_id,
                "quantity": item.quantity,
                "unit_price": item.price(),
            })
        })
        .collect();

    let mut call = RemoteCall::new(action_type.procedure())
        .param("p_company_id", sale.company_id.to_string())
        .param("p_user_id", sale.user_id.to_string())
        .param("p_party_id", sale.party_id.map(|id| id.to_string()))
        .param("p_items", items)
        .param("p_notes", sale.notes.clone())
        .param("p_currency", currency_param(sale.currency.as_ref()))
        .param("p_exchange_rate", json!(sale.exchange_rate.unwrap_or(Decimal::ONE)));

    if action_type == ActionType::CreateInvoice {
        call = call
            .param("p_payment_method", sale.payment_method.map(PaymentMethod::as_str))
            .param(
                "p_treasury_account_id",
                sale.treasury_account_id.map(|id| id.to_string()),
            );
    }
    call
}

/// Purchase lines carry their unit cost converted to the base currency.
fn purchase_call(action_type: ActionType, prepared: &PreparedPurchase) -> RemoteCall {
    let purchase = &prepared.purchase;
    let rate = purchase.exchange_rate.unwrap_or(Decimal::ONE);

    let items: Vec<Value> = purchase
        .items
        .iter()
        .map(|item| {
            json!({
                "product_id": item.product_id,
                "quantity": item.quantity,
                "unit_cost": convert_to_base(
                    item.cost_price.unwrap_or_default(),
                    rate,
                    prepared.exchange_operator,
                ),
            })
        })
        .collect();

    let call = RemoteCall::new(action_type.procedure())
        .param("p_company_id", purchase.company_id.to_string())
        .param("p_user_id", purchase.user_id.to_string())
        .param("p_supplier_id", purchase.supplier_id.map(|id| id.to_string()))
        .param("p_items", items)
        .param("p_notes", purchase.notes.clone())
        .param("p_currency", currency_param(purchase.currency.as_ref()))
        .param("p_exchange_rate", json!(rate));

    if action_type == ActionType::CreatePurchaseReturn {
        return call
            .param("p_original_invoice_number", purchase.invoice_number.clone())
            .param("p_reference_invoice_id", purchase.reference_invoice_id.clone())
            .param("p_return_reason", purchase.return_reason.clone());
    }

    call.param("p_invoice_number", purchase.invoice_number.clone())
        .param("p_issue_date", purchase.issue_date.map(|d| d.to_string()))
        .param(
            "p_treasury_account_id",
            purchase.treasury_account_id.map(|id| id.to_string()),
        )
}

/// `p_amount` is the base amount. `p_foreign_amount` is zero for
/// base-currency vouchers.
fn payment_call(prepared: &PreparedPayment) -> RemoteCall {
    let payment = &prepared.payment;
    let currency = payment.currency.clone().unwrap_or_default();
    let foreign_amount = if currency.is_base() {
        Decimal::ZERO
    } else {
        payment.amount.unwrap_or_default()
    };

    RemoteCall::new(ActionType::CreatePayment.procedure())
        .param("p_company_id", payment.company_id.to_string())
        .param("p_user_id", payment.user_id.to_string())
        .param("p_type", payment.bond_type.payment_type())
        .param("p_amount", json!(prepared.base_total))
        .param("p_date", payment.date.map(|d| d.to_string()))
        .param(
            "p_cash_account_id",
            payment.cash_account_id.map(|id| id.to_string()),
        )
        .param("p_counterparty_type", payment.counterparty_type.as_str())
        .param("p_counterparty_id", payment.counterparty_id.clone())
        .param("p_description", payment.description.clone())
        .param(
            "p_payment_method",
            payment.payment_method.unwrap_or(PaymentMethod::Cash).as_str(),
        )
        .param("p_reference_number", payment.reference_number.clone())
        .param("p_currency_code", currency.to_string())
        .param("p_exchange_rate", json!(payment.exchange_rate.unwrap_or(Decimal::ONE)))
        .param("p_foreign_amount", json!(foreign_amount))
}

fn currency_param(currency: Option<&CurrencyCode>) -> String {
    currency.cloned().unwrap_or_default().to_string()
}

/// Replays every action type through [`TransactionSubmitter::replay`].
pub struct TransactionReplayHandler {
    submitter: Arc<TransactionSubmitter>,
}

impl TransactionReplayHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(submitter: Arc<TransactionSubmitter>) -> Self {
        Self { submitter }
    }

    /// Registers the handler on `coordinator` for every [`ActionType`].
    #[must_use]
    pub fn register(self: Arc<Self>, coordinator: ReplayCoordinator) -> ReplayCoordinator {
        ActionType::ALL
            .into_iter()
            .fold(coordinator, |coordinator, action_type| {
                coordinator.with_handler(action_type, self.clone())
            })
    }
}

#[async_trait]
impl ActionHandler for TransactionReplayHandler {
    async fn replay(&self, action: &QueuedAction) -> Result<(), ReplayError> {
        let resource = self.submitter.replay(action).await?;
        info!(
            action_id = %action.id,
            action_type = %action.action_type,
            resource_id = ?resource.id,
            "action replayed"
        );
        Ok(())
    }
}
