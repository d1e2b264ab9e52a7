use crate::pricing::PricingSnapshot;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Resolves the effective unit price for `quantity` units of a product.
///
/// Organization-specific rules are searched first, then general rules; within
/// a pass the highest qualifying `min_quantity` wins, and among rules at the
/// same `min_quantity` the loader's original ordering decides (first match
/// wins). Falls back to the catalog list price; returns `None` only when the
/// product is absent from the snapshot.
pub fn resolve_unit_price(
    snapshot: &PricingSnapshot,
    product_id: Uuid,
    quantity: i32,
) -> Option<Decimal> {
    let rules = snapshot.price_rules(product_id);

    if let Some(org) = snapshot.organization_id() {
        if let Some(rule) = rules
            .iter()
            .filter(|r| r.organization_id == Some(org))
            .find(|r| r.matches_quantity(quantity))
        {
            return Some(rule.price);
        }
    }

    if let Some(rule) = rules
        .iter()
        .filter(|r| r.organization_id.is_none())
        .find(|r| r.matches_quantity(quantity))
    {
        return Some(rule.price);
    }

    snapshot.product(product_id).map(|p| p.list_price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::test_fixtures::{price_rule, product};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn tier_selection_picks_the_highest_qualifying_min_quantity() {
        let product_id = Uuid::new_v4();
        let snapshot = PricingSnapshot::from_parts(
            vec![product(product_id, None, dec!(120))],
            vec![
                price_rule(product_id, None, 1, None, dec!(100)),
                price_rule(product_id, None, 10, None, dec!(90)),
                price_rule(product_id, None, 50, None, dec!(80)),
            ],
            vec![],
            None,
            Utc::now(),
        );

        assert_eq!(
            resolve_unit_price(&snapshot, product_id, 25),
            Some(dec!(90))
        );
        assert_eq!(
            resolve_unit_price(&snapshot, product_id, 5),
            Some(dec!(100))
        );
        assert_eq!(
            resolve_unit_price(&snapshot, product_id, 100),
            Some(dec!(80))
        );
    }

    #[test]
    fn organization_specific_rules_beat_general_rules() {
        let product_id = Uuid::new_v4();
        let org = Uuid::new_v4();
        let snapshot = PricingSnapshot::from_parts(
            vec![product(product_id, None, dec!(120))],
            vec![
                price_rule(product_id, None, 1, None, dec!(100)),
                price_rule(product_id, Some(org), 1, None, dec!(95)),
            ],
            vec![],
            Some(org),
            Utc::now(),
        );

        assert_eq!(
            resolve_unit_price(&snapshot, product_id, 10),
            Some(dec!(95))
        );
    }

    #[test]
    fn falls_back_to_general_rule_when_org_rule_does_not_qualify() {
        let product_id = Uuid::new_v4();
        let org = Uuid::new_v4();
        let snapshot = PricingSnapshot::from_parts(
            vec![product(product_id, None, dec!(120))],
            vec![
                // Org rule only covers 50+, so quantity 10 must use the general tier.
                price_rule(product_id, Some(org), 50, None, dec!(70)),
                price_rule(product_id, None, 1, None, dec!(100)),
            ],
            vec![],
            Some(org),
            Utc::now(),
        );

        assert_eq!(
            resolve_unit_price(&snapshot, product_id, 10),
            Some(dec!(100))
        );
        assert_eq!(
            resolve_unit_price(&snapshot, product_id, 60),
            Some(dec!(70))
        );
    }

    #[test]
    fn falls_back_to_list_price_when_no_rule_matches() {
        let product_id = Uuid::new_v4();
        let snapshot = PricingSnapshot::from_parts(
            vec![product(product_id, None, dec!(42.50))],
            vec![price_rule(product_id, None, 100, None, dec!(30))],
            vec![],
            None,
            Utc::now(),
        );

        assert_eq!(
            resolve_unit_price(&snapshot, product_id, 5),
            Some(dec!(42.50))
        );
    }

    #[test]
    fn first_rule_wins_among_equal_min_quantities() {
        let product_id = Uuid::new_v4();
        let snapshot = PricingSnapshot::from_parts(
            vec![product(product_id, None, dec!(120))],
            vec![
                price_rule(product_id, None, 10, None, dec!(90)),
                price_rule(product_id, None, 10, None, dec!(85)),
            ],
            vec![],
            None,
            Utc::now(),
        );

        assert_eq!(
            resolve_unit_price(&snapshot, product_id, 15),
            Some(dec!(90))
        );
    }

    #[test]
    fn unknown_product_resolves_to_none() {
        let snapshot = PricingSnapshot::from_parts(vec![], vec![], vec![], None, Utc::now());
        assert_eq!(resolve_unit_price(&snapshot, Uuid::new_v4(), 1), None);
    }

    #[test]
    fn bounded_ranges_exclude_quantities_above_max() {
        let product_id = Uuid::new_v4();
        let snapshot = PricingSnapshot::from_parts(
            vec![product(product_id, None, dec!(100))],
            vec![price_rule(product_id, None, 1, Some(9), dec!(95))],
            vec![],
            None,
            Utc::now(),
        );

        assert_eq!(resolve_unit_price(&snapshot, product_id, 9), Some(dec!(95)));
        assert_eq!(
            resolve_unit_price(&snapshot, product_id, 10),
            Some(dec!(100))
        );
    }
}
