//! Least-privilege baseline: the one role a sink writer needs on each kind
//! of destination.

use sinkaudit_core::DestinationKind;

/// Create objects only; cannot read, overwrite, or delete existing ones.
pub const STORAGE_WRITER_ROLE: &str = "roles/storage.objectCreator";
/// Append and update table data; cannot manage dataset permissions.
pub const WAREHOUSE_WRITER_ROLE: &str = "roles/bigquery.dataEditor";
/// Publish messages; cannot subscribe or manage the topic.
pub const TOPIC_WRITER_ROLE: &str = "roles/pubsub.publisher";

/// The baseline role for a destination kind.
pub fn required_role(kind: DestinationKind) -> &'static str {
    match kind {
        DestinationKind::Storage => STORAGE_WRITER_ROLE,
        DestinationKind::Warehouse => WAREHOUSE_WRITER_ROLE,
        DestinationKind::Topic => TOPIC_WRITER_ROLE,
    }
}

/// The full table, in [`DestinationKind::ALL`] order.
pub fn baseline_table() -> [(DestinationKind, &'static str); 3] {
    DestinationKind::ALL.map(|kind| (kind, required_role(kind)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_baseline_role() {
        for kind in DestinationKind::ALL {
            assert!(required_role(kind).starts_with("roles/"));
        }
    }

    #[test]
    fn baseline_roles_match_their_service() {
        assert_eq!(required_role(DestinationKind::Storage), "roles/storage.objectCreator");
        assert_eq!(required_role(DestinationKind::Warehouse), "roles/bigquery.dataEditor");
        assert_eq!(required_role(DestinationKind::Topic), "roles/pubsub.publisher");
    }

    #[test]
    fn baseline_roles_are_distinct() {
        let table = baseline_table();
        assert_ne!(table[0].1, table[1].1);
        assert_ne!(table[1].1, table[2].1);
        assert_ne!(table[0].1, table[2].1);
    }
}
