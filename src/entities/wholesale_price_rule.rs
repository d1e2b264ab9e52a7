use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_of;

/// Quantity-tiered wholesale price for a product.
///
/// A null `organization_id` is a general rule applying to every organization.
/// Rules are soft-deleted (`deleted_at`) because historical orders reference
/// them; the loader skips deleted rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wholesale_price_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub price: Decimal,
    pub active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Whether `quantity` falls inside `[min_quantity, max_quantity-or-∞]`.
    pub fn matches_quantity(&self, quantity: i32) -> bool {
        quantity >= self.min_quantity && self.max_quantity.map_or(true, |max| quantity <= max)
    }

    /// Whether the rule's validity window contains `now`; absent bounds are unbounded.
    pub fn in_window(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.map_or(true, |start| start <= now)
            && self.ends_at.map_or(true, |end| now <= end)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    // Quantity-range and validity-window invariants hold for every stored rule.
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let Some(min) = value_of(&self.min_quantity) {
            if *min < 0 {
                return Err(DbErr::Custom(
                    "wholesale price rule: min_quantity must not be negative".into(),
                ));
            }
            if let Some(Some(max)) = value_of(&self.max_quantity) {
                if max < min {
                    return Err(DbErr::Custom(
                        "wholesale price rule: max_quantity must be >= min_quantity".into(),
                    ));
                }
            }
        }

        if let (Some(Some(start)), Some(Some(end))) =
            (value_of(&self.starts_at), value_of(&self.ends_at))
        {
            if end <= start {
                return Err(DbErr::Custom(
                    "wholesale price rule: ends_at must be after starts_at".into(),
                ));
            }
        }

        Ok(self)
    }
}
