//! Structural diff between two field snapshots
//!
//! Shared by the audit trail (entity field changes) and the version store
//! (section content changes). Snapshots are ordered `(field, value)` pairs;
//! a field present in only one snapshot diffs against an absent side.

/// One detected difference. `None` on either side means the field did not
/// exist in that snapshot.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Eq, PartialEq)]
pub struct FieldChange {
    #[n(0)]
    pub field: String,
    #[n(1)]
    pub old_value: Option<String>,
    #[n(2)]
    pub new_value: Option<String>,
}

fn value_of<'a>(snapshot: &'a [(String, String)], field: &str) -> Option<&'a String> {
    snapshot
        .iter()
        .find(|(name, _)| name == field)
        .map(|(_, value)| value)
}

/// Compare two snapshots field by field. Output order is deterministic so
/// audit and version diffs reproduce exactly: fields in old-snapshot order
/// first, then fields only the new snapshot carries, in its order.
pub fn detect_changes(old: &[(String, String)], new: &[(String, String)]) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    for (field, old_value) in old {
        match value_of(new, field) {
            Some(new_value) if new_value == old_value => {}
            new_value => changes.push(FieldChange {
                field: field.clone(),
                old_value: Some(old_value.clone()),
                new_value: new_value.cloned(),
            }),
        }
    }
    for (field, new_value) in new {
        if value_of(old, field).is_none() {
            changes.push(FieldChange {
                field: field.clone(),
                old_value: None,
                new_value: Some(new_value.clone()),
            });
        }
    }

    changes
}
