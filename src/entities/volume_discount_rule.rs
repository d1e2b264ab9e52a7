use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_of;

/// The target a discount rule applies to.
///
/// Replaces the nullable `(product_id, category_id)` composite key with a
/// tagged value so the two lookup passes of discount resolution stay
/// type-safe: a rule is product-scoped, category-scoped, or general, and
/// never an ambiguous mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscountScope {
    Product(Uuid),
    Category(Uuid),
    General,
}

/// Quantity-tiered volume discount, scoped per [`DiscountScope`].
///
/// `discount_percent` wins when both fields are set; rules carrying only
/// `fixed_discount_amount` still match on specificity but contribute no
/// percentage.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "volume_discount_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub discount_percent: Option<Decimal>,
    pub fixed_discount_amount: Option<Decimal>,
    pub active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// The typed scope of this rule.
    pub fn scope(&self) -> DiscountScope {
        match (self.product_id, self.category_id) {
            (Some(product_id), _) => DiscountScope::Product(product_id),
            (None, Some(category_id)) => DiscountScope::Category(category_id),
            (None, None) => DiscountScope::General,
        }
    }

    pub fn matches_quantity(&self, quantity: i32) -> bool {
        quantity >= self.min_quantity && self.max_quantity.map_or(true, |max| quantity <= max)
    }

    pub fn in_window(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.map_or(true, |start| start <= now)
            && self.ends_at.map_or(true, |end| now <= end)
    }

    /// The percentage this rule contributes; fixed-amount-only rules yield zero.
    pub fn effective_percent(&self) -> Decimal {
        self.discount_percent.unwrap_or(Decimal::ZERO)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let (Some(Some(_)), Some(Some(_))) =
            (value_of(&self.product_id), value_of(&self.category_id))
        {
            return Err(DbErr::Custom(
                "volume discount rule: scope must be product, category or general, not both"
                    .into(),
            ));
        }

        if let Some(min) = value_of(&self.min_quantity) {
            if *min < 0 {
                return Err(DbErr::Custom(
                    "volume discount rule: min_quantity must not be negative".into(),
                ));
            }
            if let Some(Some(max)) = value_of(&self.max_quantity) {
                if max < min {
                    return Err(DbErr::Custom(
                        "volume discount rule: max_quantity must be >= min_quantity".into(),
                    ));
                }
            }
        }

        if let (Some(Some(start)), Some(Some(end))) =
            (value_of(&self.starts_at), value_of(&self.ends_at))
        {
            if end <= start {
                return Err(DbErr::Custom(
                    "volume discount rule: ends_at must be after starts_at".into(),
                ));
            }
        }

        Ok(self)
    }
}
