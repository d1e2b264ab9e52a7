//! Wholesale API Library
//!
//! This crate provides tiered wholesale price resolution, volume discounts,
//! credit-limit enforcement and the purchase order lifecycle.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod pricing;
pub mod services;

use std::sync::Arc;

pub use config::{load_config, AppConfig};
pub use db::DbPool;
pub use errors::{ErrorCategory, ServiceError};

use events::EventSender;
use services::{CreditService, PricingService, PurchaseOrderService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub event_sender: Option<Arc<EventSender>>,
    pub pricing: PricingService,
    pub credit: CreditService,
    pub purchase_orders: PurchaseOrderService,
}

impl AppState {
    pub fn new(
        db: Arc<DbPool>,
        config: Arc<AppConfig>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        let pricing = PricingService::new(db.clone());
        let credit = CreditService::new(db.clone(), event_sender.clone());
        let purchase_orders =
            PurchaseOrderService::new(db.clone(), event_sender.clone(), config.clone());

        Self {
            db,
            config,
            event_sender,
            pricing,
            credit,
            purchase_orders,
        }
    }
}
