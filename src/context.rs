//! Report aggregate state and its append-only status history
use super::report::TimeStamp;
use super::state::ReportStatus;
use chrono::Utc;

/// One entry in a report's status ledger. Created exactly once per
/// transition and never mutated afterwards.
#[derive(Debug, PartialEq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct StatusEntry {
    #[n(0)]
    pub entry_id: String,
    #[n(1)]
    pub report_id: String, // a unique string that references the owning [`ReportContext`]
    #[n(2)]
    pub from_status: ReportStatus,
    #[n(3)]
    pub to_status: ReportStatus,
    #[n(4)]
    pub action_by: String,
    #[n(5)]
    pub action_at: TimeStamp<Utc>,
    #[n(6)]
    pub comment: Option<String>,
}

impl StatusEntry {
    pub fn new(
        entry_id: String,
        report_id: String,
        from_status: ReportStatus,
        to_status: ReportStatus,
        action_by: String,
        comment: Option<String>,
    ) -> Self {
        Self {
            entry_id,
            report_id,
            from_status,
            to_status,
            action_by,
            action_at: TimeStamp::new(),
            comment,
        }
    }
}

/// The workflow-side record of a report: identity, current status, version
/// counter and the embedded status ledger. Persisted as a single value so a
/// transition (ledger append + status update) is one atomic record write.
#[derive(Debug, PartialEq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct ReportContext {
    #[n(0)]
    pub report_id: String, // uuid7, bech32 encoded with the report_ prefix
    #[n(1)]
    pub created_by: String,
    #[n(2)]
    pub division_id: String,
    #[n(3)]
    pub project_id: Option<String>,
    #[n(4)]
    pub current_status: ReportStatus,
    #[n(5)]
    pub current_version: u32,
    #[n(6)]
    pub latest_content_hash: String,
    #[n(7)]
    pub created_at: TimeStamp<Utc>,
    #[n(8)]
    pub updated_at: TimeStamp<Utc>,
    #[n(9)]
    pub history: Vec<StatusEntry>,
}

impl ReportContext {
    pub fn new(
        report_id: String,
        created_by: String,
        division_id: String,
        project_id: Option<String>,
    ) -> Self {
        let now = TimeStamp::new();
        Self {
            report_id,
            created_by,
            division_id,
            project_id,
            current_status: ReportStatus::Draft,
            current_version: 0,
            latest_content_hash: String::new(),
            created_at: now.clone(),
            updated_at: now,
            history: vec![],
        }
    }

    pub fn insert_entry(&mut self, entry: StatusEntry) {
        self.history.push(entry);
    }

    pub fn current_status(&self) -> ReportStatus {
        self.current_status
    }

    /// Content may only change while the report sits with its creator.
    pub fn is_editable(&self) -> bool {
        matches!(
            self.current_status,
            ReportStatus::Draft
                | ReportStatus::ReturnedForRevisionSector
                | ReportStatus::ReturnedForRevisionDmd
        )
    }

    /// Checks the ledger is a legal walk: starts at Draft, every entry
    /// chains onto the previous one, and the last entry lands on the
    /// current status. An empty ledger is consistent only for a Draft.
    pub fn history_is_consistent(&self) -> bool {
        let mut at = ReportStatus::Draft;
        for entry in &self.history {
            if entry.from_status != at {
                return false;
            }
            at = entry.to_status;
        }
        at == self.current_status
    }

    /// Render the ledger one line per transition, oldest first.
    pub fn view_history(&self) -> String {
        let mut out = String::new();
        for entry in &self.history {
            out.push_str(&format!(
                "{} {} -> {} by {}",
                entry.action_at.to_datetime_utc().to_rfc3339(),
                entry.from_status,
                entry.to_status,
                entry.action_by,
            ));
            if let Some(comment) = &entry.comment {
                out.push_str(&format!(" ({comment})"));
            }
            out.push('\n');
        }
        out
    }
}
