//! Business-rule catalogues over the persistence facade.
//!
//! # Responsibility
//! - Enforce restaurant, menu and critique invariants.
//! - Serve read and aggregation queries for the controller layer.
//!
//! # Invariants
//! - Catalogues hold no entity storage; every read goes through
//!   `PersistenceFacade`.
//! - Every check-then-act sequence runs under the catalogue's write lock.
//! - Mapper not-found errors are translated into domain not-found variants;
//!   infrastructure errors pass through unchanged.

pub mod critique_catalogue;
pub mod restaurant_catalogue;
