//! Custom actions for the Product actor.
//!
//! These are the inventory ledger's operations. Each one runs inside a single message
//! handler of the product actor, so the stock check and the decrement in `Reserve` happen
//! in one step that no concurrent caller can observe half-done.

/// Stock operations on one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductAction {
    /// Reads the current stock level without modifying it.
    CheckStock,
    /// Decrements stock by the quantity if at least that much is available.
    ///
    /// # Errors
    /// Fails with `InsufficientStock` when the request exceeds the available stock; stock
    /// is left untouched.
    Reserve(u32),
    /// Increments stock by the quantity. Used when an order is cancelled.
    Release(u32),
}

/// Results from ProductActions - variants match 1:1 with ProductAction.
/// Each carries the stock level after the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductActionResult {
    CheckStock(u32),
    Reserved(u32),
    Released(u32),
}
