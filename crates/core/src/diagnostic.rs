//! Diagnostic severity and work-order derivation rules.
//!
//! An approved diagnostic derives exactly one work order. The order's
//! priority comes from the diagnostic's severity and its description is
//! synthesized from the diagnostic text.

use crate::lookup::define_lookup_enum;
use crate::work_order::WorkOrderPriority;

define_lookup_enum! {
    /// Diagnostic severity (`diagnostic_severities`).
    Severity ("Severity") {
        Critical = 1 => "critical",
        Moderate = 2 => "moderate",
        Mild = 3 => "mild",
    }
}

impl Severity {
    /// Priority of the work order derived from a diagnostic of this severity.
    pub fn work_order_priority(self) -> WorkOrderPriority {
        match self {
            Severity::Critical => WorkOrderPriority::High,
            Severity::Moderate => WorkOrderPriority::Normal,
            Severity::Mild => WorkOrderPriority::Low,
        }
    }
}

/// Compose the description of a derived work order.
///
/// The materials line is omitted when the diagnostic lists none.
pub fn derive_work_order_description(
    possible_cause: &str,
    technical_recommendation: &str,
    required_materials: Option<&str>,
) -> String {
    let mut description = format!(
        "Possible cause: {}\nRecommendation: {}",
        possible_cause.trim(),
        technical_recommendation.trim()
    );
    if let Some(materials) = required_materials.map(str::trim).filter(|m| !m.is_empty()) {
        description.push_str("\nRequired materials: ");
        description.push_str(materials);
    }
    description
}
