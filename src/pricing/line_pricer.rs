use crate::errors::ServiceError;
use crate::pricing::{resolve_discount_percent, resolve_unit_price, PricingSnapshot};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A requested order line, pre-pricing.
#[derive(Debug, Clone)]
pub struct LineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

/// A fully priced order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Resolved pre-discount unit price, snapshotted at order time.
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub line_total: Decimal,
    pub notes: Option<String>,
}

/// The priced batch and its accumulated subtotal.
#[derive(Debug, Clone)]
pub struct PricedLines {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
}

/// Prices every requested line against one snapshot.
///
/// The full request is validated before any line is priced: one unknown
/// product id or non-positive quantity aborts the whole batch, so callers
/// never see partial results. Lines are priced and returned in caller order.
pub fn price_lines(
    snapshot: &PricingSnapshot,
    requests: &[LineRequest],
) -> Result<PricedLines, ServiceError> {
    if requests.is_empty() {
        return Err(ServiceError::ValidationError(
            "at least one order line is required".to_string(),
        ));
    }

    for request in requests {
        if request.quantity <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "quantity must be positive for product {}",
                request.product_id
            )));
        }
    }

    for request in requests {
        if !snapshot.contains_product(request.product_id) {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                request.product_id
            )));
        }
    }

    let mut lines = Vec::with_capacity(requests.len());
    let mut subtotal = Decimal::ZERO;

    for request in requests {
        let unit_price = resolve_unit_price(snapshot, request.product_id, request.quantity)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;

        let category_id = snapshot
            .product(request.product_id)
            .and_then(|p| p.category_id);
        let discount_percent =
            resolve_discount_percent(snapshot, request.product_id, category_id, request.quantity);

        let discounted_unit = (unit_price
            * (Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED))
            .round_dp(2);
        let line_total = (discounted_unit * Decimal::from(request.quantity)).round_dp(2);

        subtotal += line_total;

        lines.push(PricedLine {
            product_id: request.product_id,
            quantity: request.quantity,
            unit_price,
            discount_percent,
            line_total,
            notes: request.notes.clone(),
        });
    }

    Ok(PricedLines { lines, subtotal })
}
