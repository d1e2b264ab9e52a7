use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_of;

/// An organization-level line of credit.
///
/// `used_credit` is the running consumed amount; `credit_limit = None` means
/// unlimited. The ledger invariant `0 <= used_credit <= credit_limit` is
/// enforced both here and by the compare-and-swap updates in the credit
/// service.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_terms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub payment_days: i32,
    pub credit_limit: Option<Decimal>,
    pub used_credit: Decimal,
    pub terms: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Remaining headroom, `None` when the term is unlimited.
    pub fn available_credit(&self) -> Option<Decimal> {
        self.credit_limit.map(|limit| limit - self.used_credit)
    }

    /// Whether consuming `amount` would stay within the limit.
    pub fn can_consume(&self, amount: Decimal) -> bool {
        match self.credit_limit {
            Some(limit) => self.used_credit + amount <= limit,
            None => true,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
    #[sea_orm(has_many = "super::purchase_order::Entity")]
    PurchaseOrders,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let Some(used) = value_of(&self.used_credit) {
            if *used < Decimal::ZERO {
                return Err(DbErr::Custom(
                    "credit term: used_credit must not be negative".into(),
                ));
            }
            if let Some(Some(limit)) = value_of(&self.credit_limit) {
                if used > limit {
                    return Err(DbErr::Custom(
                        "credit term: used_credit must not exceed credit_limit".into(),
                    ));
                }
            }
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn term(limit: Option<Decimal>, used: Decimal) -> Model {
        Model {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "Net 30".to_string(),
            payment_days: 30,
            credit_limit: limit,
            used_credit: used,
            terms: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn consumption_is_bounded_by_the_limit() {
        let t = term(Some(dec!(1000)), dec!(800));
        assert!(t.can_consume(dec!(200)));
        assert!(!t.can_consume(dec!(300)));
        assert_eq!(t.available_credit(), Some(dec!(200)));
    }

    #[test]
    fn unlimited_terms_always_admit_consumption() {
        let t = term(None, dec!(1_000_000));
        assert!(t.can_consume(dec!(999_999)));
        assert_eq!(t.available_credit(), None);
    }
}
