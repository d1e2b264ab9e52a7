#![allow(dead_code)]

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use uuid::Uuid;
use wholesale_api::{
    db::{self, DbConfig, DbPool},
    entities::{buyer, credit_term, organization, product, volume_discount_rule, wholesale_price_rule},
    AppConfig, AppState,
};

/// Builds an app state over a fresh in-memory sqlite database.
///
/// max_connections is pinned to 1: each sqlite `:memory:` connection is its
/// own database, so a larger pool would scatter the schema across connections.
pub async fn setup_app_state() -> AppState {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();

    let db_config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };

    let pool = db::establish_connection_with_config(&db_config)
        .await
        .expect("connect to in-memory sqlite");
    db::run_migrations(&pool).await.expect("run migrations");

    let config = AppConfig::new("sqlite::memory:", "test");
    AppState::new(Arc::new(pool), Arc::new(config), None)
}

pub async fn seed_organization(db: &DbPool) -> organization::Model {
    let now = Utc::now();
    organization::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Acme Wholesale".to_string()),
        contact_email: Set(Some("orders@acme.example".to_string())),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert organization")
}

pub async fn seed_buyer(db: &DbPool, organization_id: Uuid) -> buyer::Model {
    let now = Utc::now();
    buyer::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(organization_id),
        name: Set("Pat Buyer".to_string()),
        email: Set("pat@acme.example".to_string()),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert buyer")
}

pub async fn seed_product(
    db: &DbPool,
    category_id: Option<Uuid>,
    list_price: Decimal,
) -> product::Model {
    let now = Utc::now();
    let id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(id),
        sku: Set(format!("SKU-{}", &id.to_string()[..8])),
        name: Set("Widget".to_string()),
        category_id: Set(category_id),
        list_price: Set(list_price),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert product")
}

pub async fn seed_price_rule(
    db: &DbPool,
    product_id: Uuid,
    organization_id: Option<Uuid>,
    min_quantity: i32,
    max_quantity: Option<i32>,
    price: Decimal,
) -> wholesale_price_rule::Model {
    seed_price_rule_with(db, product_id, organization_id, min_quantity, max_quantity, price, true, None, None, None).await
}

#[allow(clippy::too_many_arguments)]
pub async fn seed_price_rule_with(
    db: &DbPool,
    product_id: Uuid,
    organization_id: Option<Uuid>,
    min_quantity: i32,
    max_quantity: Option<i32>,
    price: Decimal,
    active: bool,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
) -> wholesale_price_rule::Model {
    let now = Utc::now();
    wholesale_price_rule::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        organization_id: Set(organization_id),
        min_quantity: Set(min_quantity),
        max_quantity: Set(max_quantity),
        price: Set(price),
        active: Set(active),
        starts_at: Set(starts_at),
        ends_at: Set(ends_at),
        deleted_at: Set(deleted_at),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert price rule")
}

pub async fn seed_discount_rule(
    db: &DbPool,
    product_id: Option<Uuid>,
    category_id: Option<Uuid>,
    organization_id: Option<Uuid>,
    min_quantity: i32,
    discount_percent: Option<Decimal>,
) -> volume_discount_rule::Model {
    let now = Utc::now();
    volume_discount_rule::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        category_id: Set(category_id),
        organization_id: Set(organization_id),
        min_quantity: Set(min_quantity),
        max_quantity: Set(None),
        discount_percent: Set(discount_percent),
        fixed_discount_amount: Set(None),
        active: Set(true),
        starts_at: Set(None),
        ends_at: Set(None),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert discount rule")
}

pub async fn seed_credit_term(
    db: &DbPool,
    organization_id: Uuid,
    credit_limit: Option<Decimal>,
    used_credit: Decimal,
) -> credit_term::Model {
    let now = Utc::now();
    credit_term::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(organization_id),
        name: Set("Net 30".to_string()),
        payment_days: Set(30),
        credit_limit: Set(credit_limit),
        used_credit: Set(used_credit),
        terms: Set(None),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert credit term")
}
