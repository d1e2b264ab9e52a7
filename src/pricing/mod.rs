//! The pricing core: a bulk-loaded, read-only reference-data snapshot and the
//! pure resolution functions that consume it.
//!
//! One order-creation call loads a [`PricingSnapshot`] once (at most one query
//! per rule family) and then prices every requested line against it with
//! cheap in-memory lookups; the snapshot is never mutated.

pub mod discount_resolver;
pub mod line_pricer;
pub mod price_resolver;
pub mod snapshot;

pub use discount_resolver::resolve_discount_percent;
pub use line_pricer::{price_lines, LineRequest, PricedLine, PricedLines};
pub use price_resolver::resolve_unit_price;
pub use snapshot::PricingSnapshot;

#[cfg(test)]
pub(crate) mod test_fixtures {
    use crate::entities::{product, volume_discount_rule, wholesale_price_rule};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    pub fn product(id: Uuid, category_id: Option<Uuid>, list_price: Decimal) -> product::Model {
        product::Model {
            id,
            sku: format!("SKU-{}", &id.to_string()[..8]),
            name: "Test product".to_string(),
            category_id,
            list_price,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn price_rule(
        product_id: Uuid,
        organization_id: Option<Uuid>,
        min_quantity: i32,
        max_quantity: Option<i32>,
        price: Decimal,
    ) -> wholesale_price_rule::Model {
        wholesale_price_rule::Model {
            id: Uuid::new_v4(),
            product_id,
            organization_id,
            min_quantity,
            max_quantity,
            price,
            active: true,
            starts_at: None,
            ends_at: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn discount_rule(
        product_id: Option<Uuid>,
        category_id: Option<Uuid>,
        organization_id: Option<Uuid>,
        min_quantity: i32,
        discount_percent: Option<Decimal>,
    ) -> volume_discount_rule::Model {
        volume_discount_rule::Model {
            id: Uuid::new_v4(),
            product_id,
            category_id,
            organization_id,
            min_quantity,
            max_quantity: None,
            discount_percent,
            fixed_discount_amount: None,
            active: true,
            starts_at: None,
            ends_at: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
