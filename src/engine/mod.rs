//! Stateful engines built on the pure calculation rules.
//!
//! Both engines read and write through the store traits; every guarded
//! transition is delegated to a single compare-and-set store call.

mod compensation;
mod leave;

pub use compensation::{
    BulkFailure, BulkOutcome, CalculationOutcome, CompensationEngine, UnsavedLineItem,
};
pub use leave::LeaveRequestEngine;
