//! Excess-permission evaluator.
//!
//! A binding is a finding when the writer identity is one of its members and
//! its role is not, character for character, the required role. Role
//! hierarchies are not modelled: an owner role is excessive even though it
//! implies the editor role.

use sinkaudit_core::{Finding, RoleBinding, WriterIdentity};
use tracing::debug;

/// Return the writer's non-baseline bindings, in fetch order.
///
/// A writer that appears in no binding yields no findings; only excess is
/// reported, never absence.
pub fn evaluate(
    bindings: &[RoleBinding],
    writer_identity: &WriterIdentity,
    required_role: &str,
) -> Vec<Finding> {
    let findings: Vec<Finding> = bindings
        .iter()
        .filter(|b| b.has_member(writer_identity.as_str()))
        .filter(|b| b.role != required_role)
        .map(|b| Finding {
            role: b.role.clone(),
            members: b.members.clone(),
            expected_role: required_role.to_string(),
        })
        .collect();

    debug!(
        writer = %writer_identity,
        required_role,
        bindings = bindings.len(),
        findings = findings.len(),
        "Evaluated writer bindings"
    );
    findings
}
