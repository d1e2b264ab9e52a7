pub mod buyer;
pub mod credit_term;
pub mod organization;
pub mod product;
pub mod purchase_order;
pub mod purchase_order_line;
pub mod volume_discount_rule;
pub mod wholesale_price_rule;

pub use purchase_order::PurchaseOrderStatus;
pub use volume_discount_rule::DiscountScope;

use sea_orm::{ActiveValue, Value};

/// The stored value behind an `ActiveValue`, if one is present.
pub(crate) fn value_of<T>(v: &ActiveValue<T>) -> Option<&T>
where
    T: Into<Value>,
{
    match v {
        ActiveValue::Set(x) | ActiveValue::Unchanged(x) => Some(x),
        ActiveValue::NotSet => None,
    }
}
