//! Compensation and leave engine for an HR back office.
//!
//! This crate owns the payroll record lifecycle (draft, calculated, approved,
//! paid) with proportional and fixed-rate tax arithmetic, the vacation request
//! lifecycle with balance, overlap and blocked-period validation, and the
//! hierarchical access policy that gates both. Persistence and the employee
//! directory are consumed through traits; an in-memory implementation and a
//! thin axum HTTP surface are included.

#![warn(missing_docs)]

pub mod access;
pub mod api;
pub mod calculation;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod store;
