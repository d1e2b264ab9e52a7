use crate::{
    config::AppConfig,
    db::{self, DbPool},
    entities::{
        buyer::Entity as BuyerEntity,
        credit_term::Entity as CreditTermEntity,
        organization::Entity as OrganizationEntity,
        purchase_order::{self, Entity as PurchaseOrderEntity, PurchaseOrderStatus},
        purchase_order_line::{self, Entity as PurchaseOrderLineEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    pricing::{price_lines, LineRequest, PricingSnapshot},
    services::credit::CreditService,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref ORDER_CREATIONS: IntCounter = IntCounter::new(
        "purchase_order_creations_total",
        "Number of purchase orders created"
    )
    .expect("metric can be created");
    static ref ORDER_CREATION_FAILURES: IntCounter = IntCounter::new(
        "purchase_order_creation_failures_total",
        "Number of purchase order creations that failed"
    )
    .expect("metric can be created");
    static ref ORDER_APPROVALS: IntCounter = IntCounter::new(
        "purchase_order_approvals_total",
        "Number of purchase orders approved"
    )
    .expect("metric can be created");
    static ref ORDER_REJECTIONS: IntCounter = IntCounter::new(
        "purchase_order_rejections_total",
        "Number of purchase orders rejected"
    )
    .expect("metric can be created");
    static ref ORDER_CANCELLATIONS: IntCounter = IntCounter::new(
        "purchase_order_cancellations_total",
        "Number of purchase orders cancelled"
    )
    .expect("metric can be created");
}

/// One requested order line.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Request payload for creating a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseOrderRequest {
    pub organization_id: Uuid,
    pub buyer_id: Uuid,
    pub credit_term_id: Option<Uuid>,
    #[validate]
    pub lines: Vec<CreateLineRequest>,
    pub shipping_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// A freshly created purchase order with its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderResponse {
    pub order: purchase_order::Model,
    pub lines: Vec<purchase_order_line::Model>,
}

/// Orchestrates the purchase order lifecycle: creation with snapshot pricing,
/// and the Draft → Submitted → Approved/Rejected/Cancelled transitions.
///
/// Every transition is a compare-and-swap on (id, status, version), so two
/// concurrent writers cannot both move the same order; the loser gets
/// `Concurrency`. Approval additionally consumes credit inside the same
/// transaction as the status flip.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    config: Arc<AppConfig>,
}

impl PurchaseOrderService {
    /// Creates a new purchase order service instance
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            config,
        }
    }

    /// Creates a purchase order in Draft.
    ///
    /// All lines are priced against a single snapshot, the header and lines
    /// are inserted in one transaction, and the order number is derived from
    /// that day's order count inside the same transaction. A concurrent
    /// creation that races to the same number trips the unique index; the
    /// whole transaction is retried with a fresh count, bounded by
    /// `order_number_max_retries`.
    #[instrument(skip(self, input), fields(organization_id = %input.organization_id, line_count = input.lines.len()))]
    pub async fn create_purchase_order(
        &self,
        input: CreatePurchaseOrderRequest,
    ) -> Result<PurchaseOrderResponse, ServiceError> {
        let result = self.create_purchase_order_inner(input).await;

        match &result {
            Ok(response) => {
                ORDER_CREATIONS.inc();
                info!(
                    order_id = %response.order.id,
                    order_number = %response.order.order_number,
                    total_amount = %response.order.total_amount,
                    "Purchase order created"
                );
            }
            Err(e) => {
                ORDER_CREATION_FAILURES.inc();
                error!("Failed to create purchase order: {}", e);
            }
        }

        result
    }

    async fn create_purchase_order_inner(
        &self,
        input: CreatePurchaseOrderRequest,
    ) -> Result<PurchaseOrderResponse, ServiceError> {
        input.validate()?;
        if input.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "at least one order line is required".to_string(),
            ));
        }

        let shipping_amount = input.shipping_amount.unwrap_or(Decimal::ZERO);
        let discount_amount = input.discount_amount.unwrap_or(Decimal::ZERO);
        if shipping_amount < Decimal::ZERO || discount_amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "shipping and discount amounts must not be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        self.check_order_parties(db, &input).await?;

        let now = Utc::now();
        let product_ids: Vec<Uuid> = input.lines.iter().map(|l| l.product_id).collect();
        let snapshot =
            PricingSnapshot::load(db, &product_ids, Some(input.organization_id), now).await?;

        let requests: Vec<LineRequest> = input
            .lines
            .iter()
            .map(|l| LineRequest {
                product_id: l.product_id,
                quantity: l.quantity,
                notes: l.notes.clone(),
            })
            .collect();
        let priced = price_lines(&snapshot, &requests)?;

        let subtotal = priced.subtotal;
        let tax_amount = (subtotal * self.config.default_tax_rate).round_dp(2);
        let total_amount = (subtotal + tax_amount + shipping_amount - discount_amount).round_dp(2);
        if total_amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "order total must not be negative".to_string(),
            ));
        }

        let max_retries = self.config.order_number_max_retries;
        let mut attempt: u32 = 0;
        let (order, lines) = loop {
            attempt += 1;

            let txn = db.begin().await?;
            let order_number = Self::next_order_number(&txn, now).await?;

            let order_id = Uuid::new_v4();
            let header = purchase_order::ActiveModel {
                id: Set(order_id),
                order_number: Set(order_number),
                organization_id: Set(input.organization_id),
                buyer_id: Set(input.buyer_id),
                status: Set(PurchaseOrderStatus::Draft),
                credit_term_id: Set(input.credit_term_id),
                subtotal: Set(subtotal),
                tax_amount: Set(tax_amount),
                shipping_amount: Set(shipping_amount),
                discount_amount: Set(discount_amount),
                total_amount: Set(total_amount),
                notes: Set(input.notes.clone()),
                submitted_at: Set(None),
                approved_at: Set(None),
                approved_by: Set(None),
                rejected_at: Set(None),
                rejection_reason: Set(None),
                cancelled_at: Set(None),
                version: Set(0),
                created_at: Set(now),
                updated_at: Set(now),
            };

            match header.insert(&txn).await {
                Ok(order) => {
                    let mut lines = Vec::with_capacity(priced.lines.len());
                    for (idx, line) in priced.lines.iter().enumerate() {
                        let line_model = purchase_order_line::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            purchase_order_id: Set(order.id),
                            line_number: Set((idx + 1) as i32),
                            product_id: Set(line.product_id),
                            quantity: Set(line.quantity),
                            unit_price: Set(line.unit_price),
                            discount_percent: Set(line.discount_percent),
                            line_total: Set(line.line_total),
                            notes: Set(line.notes.clone()),
                            created_at: Set(now),
                        };
                        lines.push(line_model.insert(&txn).await?);
                    }
                    txn.commit().await?;
                    break (order, lines);
                }
                Err(e) if is_unique_violation(&e) && attempt <= max_retries => {
                    warn!(
                        attempt = attempt,
                        "Order number conflict, retrying with a fresh sequence"
                    );
                    txn.rollback().await.ok();
                    continue;
                }
                Err(e) if is_unique_violation(&e) => {
                    // Retries exhausted; the caller may try again.
                    txn.rollback().await.ok();
                    return Err(ServiceError::Concurrency(order_id));
                }
                Err(e) => {
                    txn.rollback().await.ok();
                    return Err(ServiceError::DatabaseError(e));
                }
            }
        };

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::PurchaseOrderCreated(order.id)).await {
                warn!(error = %e, order_id = %order.id, "Failed to send purchase order created event");
            }
        }

        Ok(PurchaseOrderResponse { order, lines })
    }

    /// Submits a Draft order for approval.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn submit_purchase_order(
        &self,
        order_id: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db_pool;
        let order = Self::find_order(db, order_id).await?;
        Self::guard_transition(&order, PurchaseOrderStatus::Submitted)?;

        let now = Utc::now();
        let result = PurchaseOrderEntity::update_many()
            .col_expr(
                purchase_order::Column::Status,
                Expr::value(PurchaseOrderStatus::Submitted),
            )
            .col_expr(purchase_order::Column::SubmittedAt, Expr::value(now))
            .col_expr(
                purchase_order::Column::Version,
                Expr::value(order.version + 1),
            )
            .col_expr(purchase_order::Column::UpdatedAt, Expr::value(now))
            .filter(purchase_order::Column::Id.eq(order_id))
            .filter(purchase_order::Column::Status.eq(PurchaseOrderStatus::Draft))
            .filter(purchase_order::Column::Version.eq(order.version))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Concurrency(order_id));
        }

        info!(order_id = %order_id, "Purchase order submitted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PurchaseOrderSubmitted(order_id))
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send purchase order submitted event");
            }
        }

        Ok(purchase_order::Model {
            status: PurchaseOrderStatus::Submitted,
            submitted_at: Some(now),
            version: order.version + 1,
            updated_at: now,
            ..order
        })
    }

    /// Approves a Submitted order, consuming credit atomically.
    ///
    /// Credit consumption and the status flip share one transaction: a credit
    /// limit breach or a lost version race rolls both back and the order stays
    /// Submitted.
    #[instrument(skip(self), fields(order_id = %order_id, approver_id = %approver_id))]
    pub async fn approve_purchase_order(
        &self,
        order_id: Uuid,
        approver_id: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        let updated = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let order = Self::find_order(txn, order_id).await?;
                Self::guard_transition(&order, PurchaseOrderStatus::Approved)?;
                Self::apply_approval(txn, &order, approver_id).await
            })
        })
        .await?;

        ORDER_APPROVALS.inc();
        info!(order_id = %order_id, approver_id = %approver_id, "Purchase order approved");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PurchaseOrderApproved {
                    order_id,
                    approver_id,
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send purchase order approved event");
            }
        }

        Ok(updated)
    }

    /// Rejects a Submitted order; the reason is required.
    #[instrument(skip(self, reason), fields(order_id = %order_id))]
    pub async fn reject_purchase_order(
        &self,
        order_id: Uuid,
        reason: &str,
    ) -> Result<purchase_order::Model, ServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::ValidationError(
                "rejection reason is required".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let order = Self::find_order(db, order_id).await?;
        Self::guard_transition(&order, PurchaseOrderStatus::Rejected)?;

        let now = Utc::now();
        let result = PurchaseOrderEntity::update_many()
            .col_expr(
                purchase_order::Column::Status,
                Expr::value(PurchaseOrderStatus::Rejected),
            )
            .col_expr(purchase_order::Column::RejectedAt, Expr::value(now))
            .col_expr(
                purchase_order::Column::RejectionReason,
                Expr::value(reason.to_string()),
            )
            .col_expr(
                purchase_order::Column::Version,
                Expr::value(order.version + 1),
            )
            .col_expr(purchase_order::Column::UpdatedAt, Expr::value(now))
            .filter(purchase_order::Column::Id.eq(order_id))
            .filter(purchase_order::Column::Status.eq(PurchaseOrderStatus::Submitted))
            .filter(purchase_order::Column::Version.eq(order.version))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Concurrency(order_id));
        }

        ORDER_REJECTIONS.inc();
        info!(order_id = %order_id, reason = %reason, "Purchase order rejected");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PurchaseOrderRejected {
                    order_id,
                    reason: reason.to_string(),
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send purchase order rejected event");
            }
        }

        Ok(purchase_order::Model {
            status: PurchaseOrderStatus::Rejected,
            rejected_at: Some(now),
            rejection_reason: Some(reason.to_string()),
            version: order.version + 1,
            updated_at: now,
            ..order
        })
    }

    /// Cancels a Draft or Submitted order.
    ///
    /// Credit is only consumed at approval, so cancellation reverses nothing.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_purchase_order(
        &self,
        order_id: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db_pool;
        let order = Self::find_order(db, order_id).await?;
        Self::guard_transition(&order, PurchaseOrderStatus::Cancelled)?;

        let now = Utc::now();
        let result = PurchaseOrderEntity::update_many()
            .col_expr(
                purchase_order::Column::Status,
                Expr::value(PurchaseOrderStatus::Cancelled),
            )
            .col_expr(purchase_order::Column::CancelledAt, Expr::value(now))
            .col_expr(
                purchase_order::Column::Version,
                Expr::value(order.version + 1),
            )
            .col_expr(purchase_order::Column::UpdatedAt, Expr::value(now))
            .filter(purchase_order::Column::Id.eq(order_id))
            .filter(purchase_order::Column::Status.eq(order.status))
            .filter(purchase_order::Column::Version.eq(order.version))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Concurrency(order_id));
        }

        ORDER_CANCELLATIONS.inc();
        info!(order_id = %order_id, "Purchase order cancelled");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PurchaseOrderCancelled(order_id))
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send purchase order cancelled event");
            }
        }

        Ok(purchase_order::Model {
            status: PurchaseOrderStatus::Cancelled,
            cancelled_at: Some(now),
            version: order.version + 1,
            updated_at: now,
            ..order
        })
    }

    /// Gets an order and its lines, ordered by line number.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_purchase_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<PurchaseOrderResponse>, ServiceError> {
        let db = &*self.db_pool;
        let Some(order) = PurchaseOrderEntity::find_by_id(order_id).one(db).await? else {
            return Ok(None);
        };

        let lines = PurchaseOrderLineEntity::find()
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(order_id))
            .order_by(purchase_order_line::Column::LineNumber, Order::Asc)
            .all(db)
            .await?;

        Ok(Some(PurchaseOrderResponse { order, lines }))
    }

    /// Lists an organization's orders, newest first.
    #[instrument(skip(self), fields(organization_id = %organization_id))]
    pub async fn list_purchase_orders(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<purchase_order::Model>, ServiceError> {
        let db = &*self.db_pool;
        let orders = PurchaseOrderEntity::find()
            .filter(purchase_order::Column::OrganizationId.eq(organization_id))
            .order_by(purchase_order::Column::CreatedAt, Order::Desc)
            .all(db)
            .await?;

        Ok(orders)
    }

    async fn check_order_parties<C>(
        &self,
        conn: &C,
        input: &CreatePurchaseOrderRequest,
    ) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        let organization = OrganizationEntity::find_by_id(input.organization_id)
            .one(conn)
            .await?
            .filter(|o| o.active)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Organization {} not found",
                    input.organization_id
                ))
            })?;

        BuyerEntity::find_by_id(input.buyer_id)
            .one(conn)
            .await?
            .filter(|b| b.active && b.organization_id == organization.id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Buyer {} not found in organization {}",
                    input.buyer_id, input.organization_id
                ))
            })?;

        if let Some(credit_term_id) = input.credit_term_id {
            CreditTermEntity::find_by_id(credit_term_id)
                .one(conn)
                .await?
                .filter(|t| t.active && t.organization_id == organization.id)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Credit term {} not found in organization {}",
                        credit_term_id, input.organization_id
                    ))
                })?;
        }

        Ok(())
    }

    /// Next order number for the day: `PO-{yyyyMMdd}-{seq:06}`.
    ///
    /// The count runs on the caller's transaction; the unique index on
    /// order_number catches the race where two creations count the same day
    /// concurrently, and the caller retries.
    async fn next_order_number<C>(conn: &C, now: DateTime<Utc>) -> Result<String, ServiceError>
    where
        C: ConnectionTrait,
    {
        let day = now.format("%Y%m%d");
        let prefix = format!("PO-{}-", day);

        let todays = PurchaseOrderEntity::find()
            .filter(purchase_order::Column::OrderNumber.starts_with(prefix.as_str()))
            .count(conn)
            .await?;

        Ok(format!("{}{:06}", prefix, todays + 1))
    }

    /// Consumes credit (when the order carries a credit term) and performs the
    /// Submitted -> Approved compare-and-swap against the version the caller
    /// read. A stale read matches zero rows and surfaces as `Concurrency`,
    /// rolling the credit consumption back with the transaction.
    pub(crate) async fn apply_approval<C>(
        conn: &C,
        order: &purchase_order::Model,
        approver_id: Uuid,
    ) -> Result<purchase_order::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        if let Some(credit_term_id) = order.credit_term_id {
            CreditService::use_credit_on(conn, credit_term_id, order.total_amount).await?;
        }

        let now = Utc::now();
        let result = PurchaseOrderEntity::update_many()
            .col_expr(
                purchase_order::Column::Status,
                Expr::value(PurchaseOrderStatus::Approved),
            )
            .col_expr(purchase_order::Column::ApprovedAt, Expr::value(now))
            .col_expr(
                purchase_order::Column::ApprovedBy,
                Expr::value(approver_id),
            )
            .col_expr(
                purchase_order::Column::Version,
                Expr::value(order.version + 1),
            )
            .col_expr(purchase_order::Column::UpdatedAt, Expr::value(now))
            .filter(purchase_order::Column::Id.eq(order.id))
            .filter(purchase_order::Column::Status.eq(PurchaseOrderStatus::Submitted))
            .filter(purchase_order::Column::Version.eq(order.version))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Concurrency(order.id));
        }

        Ok(purchase_order::Model {
            status: PurchaseOrderStatus::Approved,
            approved_at: Some(now),
            approved_by: Some(approver_id),
            version: order.version + 1,
            updated_at: now,
            ..order.clone()
        })
    }

    async fn find_order<C>(conn: &C, order_id: Uuid) -> Result<purchase_order::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        PurchaseOrderEntity::find_by_id(order_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })
    }

    fn guard_transition(
        order: &purchase_order::Model,
        next: PurchaseOrderStatus,
    ) -> Result<(), ServiceError> {
        if !order.status.can_transition_to(next) {
            return Err(ServiceError::BusinessRule(format!(
                "cannot transition purchase order {} from {} to {}",
                order.id, order.status, next
            )));
        }
        Ok(())
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("UNIQUE constraint failed") || msg.contains("duplicate key")
}
