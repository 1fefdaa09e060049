//! Application state for the HR engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::access::AccessPolicy;
use crate::clock::Clock;
use crate::config::ConfigLoader;
use crate::engine::{CompensationEngine, LeaveRequestEngine};
use crate::store::{EmployeeDirectory, LeaveStore, SalaryStore};

/// Shared application state.
///
/// Holds both engines and the access policy, all wired to the same store.
#[derive(Clone)]
pub struct AppState {
    compensation: CompensationEngine,
    leave: LeaveRequestEngine,
    policy: AccessPolicy,
}

impl AppState {
    /// Wires the engines and the policy to `store`.
    pub fn new<S>(store: Arc<S>, clock: Arc<dyn Clock>, config: &ConfigLoader) -> Self
    where
        S: SalaryStore + LeaveStore + EmployeeDirectory + 'static,
    {
        Self {
            compensation: CompensationEngine::new(
                store.clone(),
                store.clone(),
                clock.clone(),
                config.payroll().clone(),
            ),
            leave: LeaveRequestEngine::new(
                store.clone(),
                store.clone(),
                clock,
                config.leave().clone(),
            ),
            policy: AccessPolicy::new(store),
        }
    }

    /// Returns the payroll engine.
    pub fn compensation(&self) -> &CompensationEngine {
        &self.compensation
    }

    /// Returns the leave engine.
    pub fn leave(&self) -> &LeaveRequestEngine {
        &self.leave
    }

    /// Returns the access policy.
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }
}
