use crate::entities::{product, volume_discount_rule, wholesale_price_rule, DiscountScope};
use crate::errors::ServiceError;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Point-in-time, read-only index over the reference pricing data relevant to
/// one batch of products and one organization.
///
/// Rule vectors are sorted by `min_quantity` descending with insertion order
/// preserved among equals, so "first match wins" doubles as the tie-break.
#[derive(Debug, Clone)]
pub struct PricingSnapshot {
    organization_id: Option<Uuid>,
    now: DateTime<Utc>,
    products: HashMap<Uuid, product::Model>,
    prices_by_product: HashMap<Uuid, Vec<wholesale_price_rule::Model>>,
    discounts_by_scope: HashMap<DiscountScope, Vec<volume_discount_rule::Model>>,
}

impl PricingSnapshot {
    /// Bulk-loads the snapshot: the requested products, then at most one
    /// query per rule family. Missing rules are not an error; the indices
    /// simply stay empty.
    #[instrument(skip(conn, product_ids), fields(products = product_ids.len()))]
    pub async fn load<C>(
        conn: &C,
        product_ids: &[Uuid],
        organization_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Self, ServiceError>
    where
        C: ConnectionTrait,
    {
        let ids: Vec<Uuid> = product_ids
            .iter()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let products = product::Entity::find()
            .filter(product::Column::Id.is_in(ids.clone()))
            .all(conn)
            .await?;

        let category_ids: Vec<Uuid> = products
            .iter()
            .filter_map(|p| p.category_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let org_filter = |column: wholesale_price_rule::Column| match organization_id {
            Some(org) => Condition::any().add(column.is_null()).add(column.eq(org)),
            None => Condition::any().add(column.is_null()),
        };

        let price_rules = wholesale_price_rule::Entity::find()
            .filter(wholesale_price_rule::Column::ProductId.is_in(ids.clone()))
            .filter(wholesale_price_rule::Column::Active.eq(true))
            .filter(wholesale_price_rule::Column::DeletedAt.is_null())
            .filter(org_filter(wholesale_price_rule::Column::OrganizationId))
            .all(conn)
            .await?;

        let discount_org_filter = match organization_id {
            Some(org) => Condition::any()
                .add(volume_discount_rule::Column::OrganizationId.is_null())
                .add(volume_discount_rule::Column::OrganizationId.eq(org)),
            None => Condition::any().add(volume_discount_rule::Column::OrganizationId.is_null()),
        };

        // Product-scoped, category-scoped, or general (both ids null).
        let scope_filter = Condition::any()
            .add(volume_discount_rule::Column::ProductId.is_in(ids.clone()))
            .add(volume_discount_rule::Column::CategoryId.is_in(category_ids))
            .add(
                Condition::all()
                    .add(volume_discount_rule::Column::ProductId.is_null())
                    .add(volume_discount_rule::Column::CategoryId.is_null()),
            );

        let discount_rules = volume_discount_rule::Entity::find()
            .filter(volume_discount_rule::Column::Active.eq(true))
            .filter(volume_discount_rule::Column::DeletedAt.is_null())
            .filter(discount_org_filter)
            .filter(scope_filter)
            .all(conn)
            .await?;

        debug!(
            products = products.len(),
            price_rules = price_rules.len(),
            discount_rules = discount_rules.len(),
            "Loaded pricing reference data"
        );

        Ok(Self::from_parts(
            products,
            price_rules,
            discount_rules,
            organization_id,
            now,
        ))
    }

    /// Builds the indices from already-loaded rows, applying the full
    /// eligibility filter: active, not soft-deleted, organization null or
    /// matching, and validity window containing `now` (absent bounds are
    /// unbounded).
    pub fn from_parts(
        products: Vec<product::Model>,
        price_rules: Vec<wholesale_price_rule::Model>,
        discount_rules: Vec<volume_discount_rule::Model>,
        organization_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        let org_matches =
            |rule_org: Option<Uuid>| rule_org.is_none() || rule_org == organization_id;

        let mut prices_by_product: HashMap<Uuid, Vec<wholesale_price_rule::Model>> = HashMap::new();
        for rule in price_rules {
            if !rule.active
                || rule.deleted_at.is_some()
                || !rule.in_window(now)
                || !org_matches(rule.organization_id)
            {
                continue;
            }
            prices_by_product
                .entry(rule.product_id)
                .or_default()
                .push(rule);
        }

        let mut discounts_by_scope: HashMap<DiscountScope, Vec<volume_discount_rule::Model>> =
            HashMap::new();
        for rule in discount_rules {
            if !rule.active
                || rule.deleted_at.is_some()
                || !rule.in_window(now)
                || !org_matches(rule.organization_id)
            {
                continue;
            }
            discounts_by_scope
                .entry(rule.scope())
                .or_default()
                .push(rule);
        }

        // Stable: insertion order is preserved among equal min_quantity.
        for rules in prices_by_product.values_mut() {
            rules.sort_by(|a, b| b.min_quantity.cmp(&a.min_quantity));
        }
        for rules in discounts_by_scope.values_mut() {
            rules.sort_by(|a, b| b.min_quantity.cmp(&a.min_quantity));
        }

        Self {
            organization_id,
            now,
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            prices_by_product,
            discounts_by_scope,
        }
    }

    pub fn organization_id(&self) -> Option<Uuid> {
        self.organization_id
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn product(&self, product_id: Uuid) -> Option<&product::Model> {
        self.products.get(&product_id)
    }

    pub fn contains_product(&self, product_id: Uuid) -> bool {
        self.products.contains_key(&product_id)
    }

    pub fn price_rules(&self, product_id: Uuid) -> &[wholesale_price_rule::Model] {
        self.prices_by_product
            .get(&product_id)
            .map_or(&[], Vec::as_slice)
    }

    pub fn discount_rules(&self, scope: DiscountScope) -> &[volume_discount_rule::Model] {
        self.discounts_by_scope
            .get(&scope)
            .map_or(&[], Vec::as_slice)
    }
}
