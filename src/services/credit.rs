use crate::{
    db::DbPool,
    entities::credit_term::{self, Entity as CreditTermEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Service for the credit ledger: consuming and releasing an organization's
/// line of credit.
///
/// Consumption and release are compare-and-swap updates on `used_credit` so
/// concurrent consumers cannot both slip under the limit; the `_on` variants
/// run on a caller-supplied connection so order approval can consume credit
/// inside its own transaction.
#[derive(Clone)]
pub struct CreditService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CreditService {
    /// Creates a new credit service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Gets a credit term by ID
    #[instrument(skip(self))]
    pub async fn get_credit_term(
        &self,
        credit_term_id: Uuid,
    ) -> Result<Option<credit_term::Model>, ServiceError> {
        let db = &*self.db_pool;
        let term = CreditTermEntity::find_by_id(credit_term_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(term)
    }

    /// Consumes credit against a term, enforcing the limit.
    #[instrument(skip(self), fields(credit_term_id = %credit_term_id, amount = %amount))]
    pub async fn use_credit(
        &self,
        credit_term_id: Uuid,
        amount: Decimal,
    ) -> Result<credit_term::Model, ServiceError> {
        let updated = Self::use_credit_on(&*self.db_pool, credit_term_id, amount).await?;

        info!(
            credit_term_id = %credit_term_id,
            amount = %amount,
            used_credit = %updated.used_credit,
            "Credit consumed"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::CreditConsumed {
                    credit_term_id,
                    amount,
                })
                .await
            {
                warn!(error = %e, credit_term_id = %credit_term_id, "Failed to send credit consumed event");
            }
        }

        Ok(updated)
    }

    /// Releases previously consumed credit, clamped at zero.
    #[instrument(skip(self), fields(credit_term_id = %credit_term_id, amount = %amount))]
    pub async fn release_credit(
        &self,
        credit_term_id: Uuid,
        amount: Decimal,
    ) -> Result<credit_term::Model, ServiceError> {
        let updated = Self::release_credit_on(&*self.db_pool, credit_term_id, amount).await?;

        info!(
            credit_term_id = %credit_term_id,
            amount = %amount,
            used_credit = %updated.used_credit,
            "Credit released"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::CreditReleased {
                    credit_term_id,
                    amount,
                })
                .await
            {
                warn!(error = %e, credit_term_id = %credit_term_id, "Failed to send credit released event");
            }
        }

        Ok(updated)
    }

    /// Consumes credit on the given connection (typically an open transaction).
    ///
    /// Fails with `BusinessRule` when the limit would be exceeded and with
    /// `Concurrency` when another writer touched `used_credit` between the
    /// guard read and the swap; the term is left unchanged in both cases.
    pub(crate) async fn use_credit_on<C>(
        conn: &C,
        credit_term_id: Uuid,
        amount: Decimal,
    ) -> Result<credit_term::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        if amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "credit amount must not be negative".to_string(),
            ));
        }

        let term = CreditTermEntity::find_by_id(credit_term_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Credit term {} not found", credit_term_id))
            })?;

        if !term.active {
            return Err(ServiceError::BusinessRule(format!(
                "credit term {} is inactive",
                credit_term_id
            )));
        }

        if !term.can_consume(amount) {
            return Err(ServiceError::BusinessRule(format!(
                "credit limit exceeded: limit {}, used {}, requested {}",
                term.credit_limit.unwrap_or(Decimal::ZERO),
                term.used_credit,
                amount
            )));
        }

        let new_used = term.used_credit + amount;
        Self::swap_used_credit(conn, &term, new_used).await?;

        Ok(credit_term::Model {
            used_credit: new_used,
            updated_at: Utc::now(),
            ..term
        })
    }

    /// Releases credit on the given connection; `used_credit` never drops
    /// below zero.
    pub(crate) async fn release_credit_on<C>(
        conn: &C,
        credit_term_id: Uuid,
        amount: Decimal,
    ) -> Result<credit_term::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        if amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "credit amount must not be negative".to_string(),
            ));
        }

        let term = CreditTermEntity::find_by_id(credit_term_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Credit term {} not found", credit_term_id))
            })?;

        let new_used = (term.used_credit - amount).max(Decimal::ZERO);
        Self::swap_used_credit(conn, &term, new_used).await?;

        Ok(credit_term::Model {
            used_credit: new_used,
            updated_at: Utc::now(),
            ..term
        })
    }

    async fn swap_used_credit<C>(
        conn: &C,
        term: &credit_term::Model,
        new_used: Decimal,
    ) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        let result = CreditTermEntity::update_many()
            .col_expr(credit_term::Column::UsedCredit, Expr::value(new_used))
            .col_expr(credit_term::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(credit_term::Column::Id.eq(term.id))
            .filter(credit_term::Column::UsedCredit.eq(term.used_credit))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Concurrency(term.id));
        }

        Ok(())
    }
}
