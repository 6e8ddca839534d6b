// core/src/model/mod.rs

//! Value types shared by the session builder, verifier, reconciler and stores.

pub mod cart;
pub mod identity;
pub mod money;
pub mod order;
pub mod session;

pub use cart::{Cart, CartItem};
pub use identity::{Role, UserId, UserIdentity};
pub use money::Money;
pub use order::{NewOrder, Order, OrderItem, OrderStatus};
pub use session::{CheckoutRedirect, LineItemProjection, PaymentSession};
