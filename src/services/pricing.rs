use crate::{
    db::DbPool,
    errors::ServiceError,
    pricing::{
        discount_resolver::resolve_discount_percent,
        line_pricer::{price_lines, LineRequest, PricedLines},
        price_resolver::resolve_unit_price,
        snapshot::PricingSnapshot,
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Read-side pricing service.
///
/// Each call loads a `PricingSnapshot` for the products involved and resolves
/// against it in memory, so a whole order prices with a bounded number of
/// queries no matter how many lines it has.
#[derive(Clone)]
pub struct PricingService {
    db_pool: Arc<DbPool>,
}

impl PricingService {
    /// Creates a new pricing service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Resolves the wholesale unit price for a product at a quantity.
    ///
    /// `organization_id` is optional: anonymous callers resolve against
    /// general rules only. Returns `Ok(None)` when the product does not
    /// exist; falls back to the product's list price when no tier matches.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity))]
    pub async fn get_wholesale_price(
        &self,
        product_id: Uuid,
        organization_id: Option<Uuid>,
        quantity: i32,
    ) -> Result<Option<Decimal>, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be positive".to_string(),
            ));
        }

        let snapshot = PricingSnapshot::load(
            &*self.db_pool,
            &[product_id],
            organization_id,
            Utc::now(),
        )
        .await?;

        Ok(resolve_unit_price(&snapshot, product_id, quantity))
    }

    /// Resolves the volume discount percentage for a product at a quantity.
    ///
    /// `organization_id` is optional, as in [`Self::get_wholesale_price`].
    /// Returns zero when no rule applies.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity))]
    pub async fn calculate_volume_discount(
        &self,
        product_id: Uuid,
        organization_id: Option<Uuid>,
        quantity: i32,
    ) -> Result<Decimal, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be positive".to_string(),
            ));
        }

        let snapshot = PricingSnapshot::load(
            &*self.db_pool,
            &[product_id],
            organization_id,
            Utc::now(),
        )
        .await?;

        let category_id = snapshot.product(product_id).and_then(|p| p.category_id);
        Ok(resolve_discount_percent(
            &snapshot,
            product_id,
            category_id,
            quantity,
        ))
    }

    /// Prices a batch of order lines against a single snapshot.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn price_order_lines(
        &self,
        organization_id: Uuid,
        lines: &[LineRequest],
    ) -> Result<PricedLines, ServiceError> {
        let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let snapshot = PricingSnapshot::load(
            &*self.db_pool,
            &product_ids,
            Some(organization_id),
            Utc::now(),
        )
        .await?;

        price_lines(&snapshot, lines)
    }
}
