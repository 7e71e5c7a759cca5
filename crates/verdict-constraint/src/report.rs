//! Validation report types

use serde::Serialize;

/// A single constraint violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Definition whose check failed
    pub constraint: String,
    pub position: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.constraint, self.position, self.message)
    }
}

/// A complete validation report
#[derive(Debug, Default, Clone, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Append the violations of another report
    pub fn merge(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    /// Check if no violation was found
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations at a position
    pub fn for_position(&self, position: &str) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.position == position)
            .collect()
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        let total = self.violations.len();
        if total == 0 {
            return "No violations found.".to_string();
        }

        let mut positions: Vec<&str> = self.violations.iter().map(|v| v.position.as_str()).collect();
        positions.sort_unstable();
        positions.dedup();

        format!(
            "{} violation(s) at {} position(s)",
            total,
            positions.len()
        )
    }
}
