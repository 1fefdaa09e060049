//! Audit trace models.
//!
//! Every salary calculation records the rules it applied, their inputs and
//! outputs, and any warnings, so a payroll officer can see how each amount
//! was reached.

use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate potential issues that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a calculation.
///
/// # Example
///
/// ```
/// use hr_engine::models::AuditTrace;
///
/// let trace = AuditTrace::default();
/// assert!(trace.steps.is_empty());
/// assert!(!trace.has_warning("ZERO_WORK_DAYS"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

impl AuditTrace {
    /// Returns true if a warning with `code` was raised.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// The step number the next step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_trace_serialization() {
        let trace = AuditTrace {
            steps: vec![AuditStep {
                step_number: 1,
                rule_id: "attendance_ratio".to_string(),
                rule_name: "Attendance Ratio".to_string(),
                input: serde_json::json!({"work_days": 22}),
                output: serde_json::json!({"ratio": "1"}),
                reasoning: "full month".to_string(),
            }],
            warnings: vec![AuditWarning {
                code: "ZERO_WORK_DAYS".to_string(),
                message: "no work days".to_string(),
                severity: "medium".to_string(),
            }],
        };

        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["steps"][0]["rule_id"], "attendance_ratio");
        assert_eq!(json["warnings"][0]["code"], "ZERO_WORK_DAYS");
        assert!(trace.has_warning("ZERO_WORK_DAYS"));
        assert_eq!(trace.next_step_number(), 2);
    }
}
