//! Append-only audit trail for administrative entity changes
//!
//! Distinct from the report status ledger: this one records CRUD events
//! against users, sectors, divisions and projects, with the field-level
//! changes computed by the change detector.
use crate::diff::FieldChange;
use crate::report::TimeStamp;
use chrono::Utc;
use std::fmt;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum AuditAction {
    #[n(0)]
    Create,
    #[n(1)]
    Update,
    #[n(2)]
    Delete,
    #[n(3)]
    Activate,
    #[n(4)]
    Deactivate,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum AuditEntity {
    #[n(0)]
    User,
    #[n(1)]
    Sector,
    #[n(2)]
    Division,
    #[n(3)]
    Project,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Activate => "ACTIVATE",
            AuditAction::Deactivate => "DEACTIVATE",
        }
    }
}

impl AuditEntity {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditEntity::User => "USER",
            AuditEntity::Sector => "SECTOR",
            AuditEntity::Division => "DIVISION",
            AuditEntity::Project => "PROJECT",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AuditEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct AuditRecord {
    #[n(0)]
    pub record_id: String,
    #[n(1)]
    pub recorded_at: TimeStamp<Utc>,
    #[n(2)]
    pub user_id: String,
    #[n(3)]
    pub user_name: String,
    #[n(4)]
    pub action: AuditAction,
    #[n(5)]
    pub entity: AuditEntity,
    #[n(6)]
    pub entity_id: String,
    #[n(7)]
    pub entity_name: String,
    #[n(8)]
    pub changes: Vec<FieldChange>,
}

/// Query filter for the audit trail. All criteria are conjunctive; the
/// free-text search matches entity or actor name, case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    pub entity: Option<AuditEntity>,
    pub action: Option<AuditAction>,
    pub search: Option<String>,
}

impl AuditFilter {
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(entity) = self.entity {
            if record.entity != entity {
                return false;
            }
        }
        if let Some(action) = self.action {
            if record.action != action {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = record.entity_name.to_lowercase().contains(&needle)
                || record.user_name.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

fn csv_escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_owned()
    }
}

fn changes_cell(changes: &[FieldChange]) -> String {
    let items: Vec<serde_json::Value> = changes
        .iter()
        .map(|c| {
            serde_json::json!({
                "field": c.field,
                "oldValue": c.old_value,
                "newValue": c.new_value,
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// Serialise records to CSV. Each record's change list is flattened into a
/// single JSON-array cell.
pub fn to_csv(records: &[AuditRecord]) -> String {
    let mut out = String::from("Timestamp,User,Action,Entity Type,Entity Name,Changes\n");
    for record in records {
        let row = [
            record.recorded_at.to_datetime_utc().to_rfc3339(),
            record.user_name.clone(),
            record.action.to_string(),
            record.entity.to_string(),
            record.entity_name.clone(),
            changes_cell(&record.changes),
        ];
        let escaped: Vec<String> = row.iter().map(|cell| csv_escape(cell)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    }
    out
}
