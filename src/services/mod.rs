//! Service layer.
//!
//! Each service is a cheap-to-clone handle over the shared connection pool,
//! with an optional event sender for post-commit notifications. Services own
//! the transactional workflows; pure pricing lives in [`crate::pricing`].

pub mod credit;
pub mod pricing;
pub mod purchase_orders;

pub use credit::CreditService;
pub use pricing::PricingService;
pub use purchase_orders::{
    CreateLineRequest, CreatePurchaseOrderRequest, PurchaseOrderResponse, PurchaseOrderService,
};
