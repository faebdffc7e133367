//! ZIMMR domain logic.
//!
//! Pure, framework-agnostic functions shared by the API types crate and the
//! server. All money amounts are integer cents; quantities are integer
//! thousandths. No floating point enters billing arithmetic.

pub mod autoinvoice;
pub mod billing;
pub mod money;
pub mod notes;
