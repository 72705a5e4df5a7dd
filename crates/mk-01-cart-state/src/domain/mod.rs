//! # Domain Layer - Cart State
//!
//! Pure cart logic: no I/O, no clocks, no async.
//!
//! - `entities`: `Cart` aggregate, `CartItem`, `ProductSnapshot`
//! - `totals`: `FeeSchedule`, totals and vendor grouping
//! - `sequence`: sync sequence numbers for out-of-order response handling
//! - `value_objects`: wire shapes for the remote cart and promo endpoints
//! - `errors`: `CartError`, `StorageError`

pub mod entities;
pub mod errors;
pub mod sequence;
pub mod totals;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use sequence::*;
pub use totals::*;
pub use value_objects::*;
