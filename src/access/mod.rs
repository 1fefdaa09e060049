//! Access control over employee, leave and salary data.
//!
//! Privileged roles (`admin`, `hr`) see everything. Everyone else sees their
//! own records, and leave data of the people they manage, directly or
//! transitively. Salary data is never visible to managers.

mod policy;

pub use policy::{AccessPolicy, QueryScope};
