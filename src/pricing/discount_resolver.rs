use crate::entities::{volume_discount_rule, DiscountScope};
use crate::pricing::PricingSnapshot;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Resolves the volume discount percentage for a line.
///
/// Scope precedence is product, then category, then general. Specificity,
/// not discount magnitude, is the tie-break: a matching product-specific rule
/// wins even when a category rule would give a larger discount. Within a
/// scope, organization-specific rules are preferred over general ones with
/// the same quantity matching as price resolution. A rule that defines only a
/// fixed amount still wins its scope but contributes 0%.
pub fn resolve_discount_percent(
    snapshot: &PricingSnapshot,
    product_id: Uuid,
    category_id: Option<Uuid>,
    quantity: i32,
) -> Decimal {
    let mut scopes = Vec::with_capacity(3);
    scopes.push(DiscountScope::Product(product_id));
    if let Some(category_id) = category_id {
        scopes.push(DiscountScope::Category(category_id));
    }
    scopes.push(DiscountScope::General);

    for scope in scopes {
        if let Some(rule) = match_in_scope(snapshot, scope, quantity) {
            return rule.effective_percent();
        }
    }

    Decimal::ZERO
}

fn match_in_scope(
    snapshot: &PricingSnapshot,
    scope: DiscountScope,
    quantity: i32,
) -> Option<&volume_discount_rule::Model> {
    let rules = snapshot.discount_rules(scope);

    if let Some(org) = snapshot.organization_id() {
        if let Some(rule) = rules
            .iter()
            .filter(|r| r.organization_id == Some(org))
            .find(|r| r.matches_quantity(quantity))
        {
            return Some(rule);
        }
    }

    rules
        .iter()
        .filter(|r| r.organization_id.is_none())
        .find(|r| r.matches_quantity(quantity))
}
