mod common;

use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;
use wholesale_api::{
    entities::{
        purchase_order::{Entity as PurchaseOrderEntity, PurchaseOrderStatus},
        purchase_order_line::Entity as PurchaseOrderLineEntity,
    },
    services::{CreateLineRequest, CreatePurchaseOrderRequest},
    ServiceError,
};

use common::*;

fn order_request(
    organization_id: Uuid,
    buyer_id: Uuid,
    credit_term_id: Option<Uuid>,
    lines: Vec<CreateLineRequest>,
) -> CreatePurchaseOrderRequest {
    CreatePurchaseOrderRequest {
        organization_id,
        buyer_id,
        credit_term_id,
        lines,
        shipping_amount: None,
        discount_amount: None,
        notes: None,
    }
}

fn line(product_id: Uuid, quantity: i32) -> CreateLineRequest {
    CreateLineRequest {
        product_id,
        quantity,
        notes: None,
    }
}

#[tokio::test]
async fn schema_applies_on_a_fresh_sqlite_database() {
    let state = setup_app_state().await;

    let orders = PurchaseOrderEntity::find()
        .count(&*state.db)
        .await
        .unwrap();
    assert_eq!(orders, 0);

    // Money columns accept and return exact decimal values.
    let org = seed_organization(&state.db).await;
    let term = seed_credit_term(&state.db, org.id, Some(dec!(1000.00)), dec!(800.25)).await;
    let reloaded = state.credit.get_credit_term(term.id).await.unwrap().unwrap();
    assert_eq!(reloaded.used_credit, dec!(800.25));
    assert_eq!(reloaded.credit_limit, Some(dec!(1000.00)));
}

#[tokio::test]
async fn order_flows_from_draft_through_approval() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let buyer = seed_buyer(db, org.id).await;
    // No tier rules and no discounts: the list price carries the whole order.
    let product = seed_product(db, None, dec!(50.00)).await;

    let response = state
        .purchase_orders
        .create_purchase_order(order_request(
            org.id,
            buyer.id,
            None,
            vec![line(product.id, 12)],
        ))
        .await
        .unwrap();

    let order = &response.order;
    assert_eq!(order.status, PurchaseOrderStatus::Draft);
    assert_eq!(order.subtotal, dec!(600.00));
    assert_eq!(order.tax_amount, dec!(120.00));
    assert_eq!(order.total_amount, dec!(720.00));
    assert_eq!(order.version, 0);
    assert_eq!(response.lines.len(), 1);
    assert_eq!(response.lines[0].unit_price, dec!(50.00));
    assert_eq!(response.lines[0].line_total, dec!(600.00));

    let expected_prefix = format!("PO-{}-", Utc::now().format("%Y%m%d"));
    assert!(order.order_number.starts_with(&expected_prefix));
    assert_eq!(order.order_number.len(), expected_prefix.len() + 6);

    let submitted = state
        .purchase_orders
        .submit_purchase_order(order.id)
        .await
        .unwrap();
    assert_eq!(submitted.status, PurchaseOrderStatus::Submitted);
    assert_eq!(submitted.version, 1);
    assert!(submitted.submitted_at.is_some());

    let approver = Uuid::new_v4();
    let approved = state
        .purchase_orders
        .approve_purchase_order(order.id, approver)
        .await
        .unwrap();
    assert_eq!(approved.status, PurchaseOrderStatus::Approved);
    assert_eq!(approved.version, 2);
    assert_eq!(approved.approved_by, Some(approver));

    // Totals computed at creation survive the transitions untouched.
    let reloaded = state
        .purchase_orders
        .get_purchase_order(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.order.subtotal, dec!(600.00));
    assert_eq!(reloaded.order.total_amount, dec!(720.00));
}

#[tokio::test]
async fn daily_sequence_increments_per_order() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let buyer = seed_buyer(db, org.id).await;
    let product = seed_product(db, None, dec!(10.00)).await;

    let first = state
        .purchase_orders
        .create_purchase_order(order_request(org.id, buyer.id, None, vec![line(product.id, 1)]))
        .await
        .unwrap();
    let second = state
        .purchase_orders
        .create_purchase_order(order_request(org.id, buyer.id, None, vec![line(product.id, 1)]))
        .await
        .unwrap();

    assert!(first.order.order_number.ends_with("-000001"));
    assert!(second.order.order_number.ends_with("-000002"));
}

#[tokio::test]
async fn creation_with_unknown_product_persists_nothing() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let buyer = seed_buyer(db, org.id).await;
    let good_one = seed_product(db, None, dec!(10.00)).await;
    let good_two = seed_product(db, None, dec!(20.00)).await;

    let result = state
        .purchase_orders
        .create_purchase_order(order_request(
            org.id,
            buyer.id,
            None,
            vec![
                line(good_one.id, 5),
                line(good_two.id, 5),
                line(Uuid::new_v4(), 5),
            ],
        ))
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let orders = PurchaseOrderEntity::find().count(&**db).await.unwrap();
    let lines = PurchaseOrderLineEntity::find().count(&**db).await.unwrap();
    assert_eq!(orders, 0);
    assert_eq!(lines, 0);
}

#[tokio::test]
async fn approval_over_credit_limit_fails_and_changes_nothing() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let buyer = seed_buyer(db, org.id).await;
    let product = seed_product(db, None, dec!(25.00)).await;
    let term = seed_credit_term(db, org.id, Some(dec!(1000.00)), dec!(800.00)).await;

    // 10 x 25.00 = 250 subtotal, 50 tax, 300 total: over the 200 of headroom.
    let response = state
        .purchase_orders
        .create_purchase_order(order_request(
            org.id,
            buyer.id,
            Some(term.id),
            vec![line(product.id, 10)],
        ))
        .await
        .unwrap();
    assert_eq!(response.order.total_amount, dec!(300.00));

    state
        .purchase_orders
        .submit_purchase_order(response.order.id)
        .await
        .unwrap();

    let result = state
        .purchase_orders
        .approve_purchase_order(response.order.id, Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(ServiceError::BusinessRule(_))));

    // Order stays Submitted and the ledger is untouched.
    let reloaded = state
        .purchase_orders
        .get_purchase_order(response.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.order.status, PurchaseOrderStatus::Submitted);

    let term = state.credit.get_credit_term(term.id).await.unwrap().unwrap();
    assert_eq!(term.used_credit, dec!(800.00));
}

#[tokio::test]
async fn approval_within_credit_limit_consumes_credit() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let buyer = seed_buyer(db, org.id).await;
    let product = seed_product(db, None, dec!(12.50)).await;
    let term = seed_credit_term(db, org.id, Some(dec!(1000.00)), dec!(800.00)).await;

    // 10 x 12.50 = 125 subtotal, 25 tax, 150 total: fits the headroom.
    let response = state
        .purchase_orders
        .create_purchase_order(order_request(
            org.id,
            buyer.id,
            Some(term.id),
            vec![line(product.id, 10)],
        ))
        .await
        .unwrap();
    assert_eq!(response.order.total_amount, dec!(150.00));

    state
        .purchase_orders
        .submit_purchase_order(response.order.id)
        .await
        .unwrap();
    state
        .purchase_orders
        .approve_purchase_order(response.order.id, Uuid::new_v4())
        .await
        .unwrap();

    let term = state.credit.get_credit_term(term.id).await.unwrap().unwrap();
    assert_eq!(term.used_credit, dec!(950.00));
}

#[tokio::test]
async fn rejection_requires_a_reason() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let buyer = seed_buyer(db, org.id).await;
    let product = seed_product(db, None, dec!(10.00)).await;

    let response = state
        .purchase_orders
        .create_purchase_order(order_request(org.id, buyer.id, None, vec![line(product.id, 1)]))
        .await
        .unwrap();
    state
        .purchase_orders
        .submit_purchase_order(response.order.id)
        .await
        .unwrap();

    let missing = state
        .purchase_orders
        .reject_purchase_order(response.order.id, "  ")
        .await;
    assert!(matches!(missing, Err(ServiceError::ValidationError(_))));

    let rejected = state
        .purchase_orders
        .reject_purchase_order(response.order.id, "pricing out of date")
        .await
        .unwrap();
    assert_eq!(rejected.status, PurchaseOrderStatus::Rejected);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("pricing out of date")
    );
}

#[tokio::test]
async fn illegal_transitions_are_rejected_unchanged() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let buyer = seed_buyer(db, org.id).await;
    let product = seed_product(db, None, dec!(10.00)).await;

    let response = state
        .purchase_orders
        .create_purchase_order(order_request(org.id, buyer.id, None, vec![line(product.id, 1)]))
        .await
        .unwrap();
    let order_id = response.order.id;

    // Draft cannot be approved or rejected.
    let premature = state
        .purchase_orders
        .approve_purchase_order(order_id, Uuid::new_v4())
        .await;
    assert!(matches!(premature, Err(ServiceError::BusinessRule(_))));

    state
        .purchase_orders
        .submit_purchase_order(order_id)
        .await
        .unwrap();
    state
        .purchase_orders
        .approve_purchase_order(order_id, Uuid::new_v4())
        .await
        .unwrap();

    // Approved is terminal: no cancellation, no resubmission.
    let cancel = state.purchase_orders.cancel_purchase_order(order_id).await;
    assert!(matches!(cancel, Err(ServiceError::BusinessRule(_))));
    let resubmit = state.purchase_orders.submit_purchase_order(order_id).await;
    assert!(matches!(resubmit, Err(ServiceError::BusinessRule(_))));

    let reloaded = state
        .purchase_orders
        .get_purchase_order(order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.order.status, PurchaseOrderStatus::Approved);
    assert_eq!(reloaded.order.version, 2);
}

#[tokio::test]
async fn draft_and_submitted_orders_can_be_cancelled() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let buyer = seed_buyer(db, org.id).await;
    let product = seed_product(db, None, dec!(10.00)).await;

    let draft = state
        .purchase_orders
        .create_purchase_order(order_request(org.id, buyer.id, None, vec![line(product.id, 1)]))
        .await
        .unwrap();
    let cancelled = state
        .purchase_orders
        .cancel_purchase_order(draft.order.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, PurchaseOrderStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());

    let submitted = state
        .purchase_orders
        .create_purchase_order(order_request(org.id, buyer.id, None, vec![line(product.id, 1)]))
        .await
        .unwrap();
    state
        .purchase_orders
        .submit_purchase_order(submitted.order.id)
        .await
        .unwrap();
    let cancelled = state
        .purchase_orders
        .cancel_purchase_order(submitted.order.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, PurchaseOrderStatus::Cancelled);
}

#[tokio::test]
async fn buyer_from_another_organization_is_rejected() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let other_org = seed_organization(db).await;
    let foreign_buyer = seed_buyer(db, other_org.id).await;
    let product = seed_product(db, None, dec!(10.00)).await;

    let result = state
        .purchase_orders
        .create_purchase_order(order_request(
            org.id,
            foreign_buyer.id,
            None,
            vec![line(product.id, 1)],
        ))
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn lines_are_returned_in_caller_order() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let buyer = seed_buyer(db, org.id).await;
    let first = seed_product(db, None, dec!(10.00)).await;
    let second = seed_product(db, None, dec!(20.00)).await;
    let third = seed_product(db, None, dec!(30.00)).await;

    let response = state
        .purchase_orders
        .create_purchase_order(order_request(
            org.id,
            buyer.id,
            None,
            vec![line(first.id, 1), line(second.id, 2), line(third.id, 3)],
        ))
        .await
        .unwrap();

    let reloaded = state
        .purchase_orders
        .get_purchase_order(response.order.id)
        .await
        .unwrap()
        .unwrap();
    let product_ids: Vec<Uuid> = reloaded.lines.iter().map(|l| l.product_id).collect();
    assert_eq!(product_ids, vec![first.id, second.id, third.id]);
    let line_numbers: Vec<i32> = reloaded.lines.iter().map(|l| l.line_number).collect();
    assert_eq!(line_numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn credit_release_clamps_at_zero() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let term = seed_credit_term(db, org.id, Some(dec!(1000.00)), dec!(100.00)).await;

    let released = state
        .credit
        .release_credit(term.id, dec!(500.00))
        .await
        .unwrap();
    assert_eq!(released.used_credit, dec!(0.00));
}

#[tokio::test]
async fn credit_consumption_without_a_limit_is_unbounded() {
    let state = setup_app_state().await;
    let db = &state.db;

    let org = seed_organization(db).await;
    let term = seed_credit_term(db, org.id, None, dec!(0.00)).await;

    let updated = state
        .credit
        .use_credit(term.id, dec!(1000000.00))
        .await
        .unwrap();
    assert_eq!(updated.used_credit, dec!(1000000.00));
}
