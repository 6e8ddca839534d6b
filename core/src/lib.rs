// core/src/lib.rs

//! Checkout-to-order reconciliation for a storefront paid through an external provider.
//!
//! - [`checkout`]: turns a client cart into a provider-hosted checkout session.
//! - [`webhook`]: verifies signed provider callbacks over the raw body and decodes them.
//! - [`reconciler`]: creates exactly one order per paid session and drives pending -> completed.
//! - [`store`]: the order store contract that makes both of those atomic.
//!
//! Request flows are written as step pipelines ([`Pipeline`]) over a per-request
//! [`ContextData`], and dispatched through a [`PipelineRegistry`] keyed by context type.

pub mod catalog;
pub mod checkout;
pub mod core;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod reconciler;
pub mod registry;
pub mod store;
pub mod webhook;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{skip_when, SkipCondition, StepDef};
pub use crate::pipeline::definition::Pipeline;
pub use crate::registry::PipelineRegistry;

pub use crate::catalog::{CatalogProduct, CatalogReader, InMemoryCatalog};
pub use crate::checkout::{
  BuiltSession, PaymentProvider, PaymentSessionBuilder, ProviderLineItem, ProviderSession, SessionRequest,
  SessionSettings,
};
pub use crate::error::{CheckoutError, CheckoutResult, PipelineError, PipelineOutcome};
pub use crate::reconciler::{OrderDetail, OrderDetailLine, OrderReconciler, ReconcileOutcome, DEFAULT_STORE_TIMEOUT};
pub use crate::store::{InMemoryOrderStore, InsertOutcome, OrderStore, StoreError, StoreResult};
pub use crate::webhook::{EventKind, VerifiedEvent, WebhookVerifier};
