//! Editable report content, draft construction and version snapshots
use crate::error::{DraftError, WorkflowError};
use chrono::{DateTime, TimeZone, Utc};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub enum Priority {
    #[n(0)]
    Low,
    #[n(1)]
    Medium,
    #[n(2)]
    High,
    #[n(3)]
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// The editable fields of a report. Every version snapshot is one of these;
// unset fields are simply absent from the snapshot.
// A snapshot is addressed by the hash of its CBOR encoding.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Default, Clone, Eq, PartialEq)]
pub struct ReportContent {
    #[n(0)]
    title: Option<String>,
    #[n(1)]
    summary: Option<String>,
    #[n(2)]
    objectives: Option<String>,
    #[n(3)]
    key_issues: Option<String>,
    #[n(4)]
    status_update: Option<String>,
    #[n(5)]
    risks: Option<String>,
    #[n(6)]
    recommendations: Option<String>,
    #[n(7)]
    priority: Option<Priority>,
    #[n(8)]
    category: Option<String>,
    #[n(9)]
    attachments: Vec<String>, // attachment names only, blob storage is external
}

#[derive(Debug, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl<T: TimeZone> PartialEq for TimeStamp<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<T: TimeZone> Eq for TimeStamp<T> {}
impl<T: TimeZone> PartialOrd for TimeStamp<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T: TimeZone> Ord for TimeStamp<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl ReportContent {
    /// Construct a new builder object, this becomes the basis for a draft
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_owned());
        self
    }
    pub fn set_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_owned());
        self
    }
    pub fn set_objectives(mut self, objectives: &str) -> Self {
        self.objectives = Some(objectives.to_owned());
        self
    }
    pub fn set_key_issues(mut self, key_issues: &str) -> Self {
        self.key_issues = Some(key_issues.to_owned());
        self
    }
    pub fn set_status_update(mut self, status_update: &str) -> Self {
        self.status_update = Some(status_update.to_owned());
        self
    }
    pub fn set_risks(mut self, risks: &str) -> Self {
        self.risks = Some(risks.to_owned());
        self
    }
    pub fn set_recommendations(mut self, recommendations: &str) -> Self {
        self.recommendations = Some(recommendations.to_owned());
        self
    }
    pub fn set_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
    pub fn set_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }
    pub fn add_attachment(mut self, name: &str) -> Self {
        self.attachments.push(name.to_owned());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// Flatten the snapshot into ordered `(field, value)` pairs for the
    /// change detector. Unset fields are omitted so a one-sided field shows
    /// up as absent rather than as an empty string.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                out.push((name.to_owned(), value));
            }
        };
        push("title", self.title.clone());
        push("summary", self.summary.clone());
        push("objectives", self.objectives.clone());
        push("key_issues", self.key_issues.clone());
        push("status_update", self.status_update.clone());
        push("risks", self.risks.clone());
        push("recommendations", self.recommendations.clone());
        push("priority", self.priority.map(|p| p.as_str().to_owned()));
        push("category", self.category.clone());
        if !self.attachments.is_empty() {
            out.push(("attachments".to_owned(), self.attachments.join(", ")));
        }
        out
    }

    /// Checks required fields, then returns the snapshot hash and its
    /// contents serialised into CBOR. The hash is the storage address of
    /// the snapshot.
    pub fn validate_and_finalise(&self) -> Result<(String, Vec<u8>), WorkflowError> {
        if self.title.as_deref().is_none_or(str::is_empty) {
            return Err(DraftError::MissingTitle.into());
        }
        if self.summary.as_deref().is_none_or(str::is_empty) {
            return Err(DraftError::MissingSummary.into());
        }
        if self.priority.is_none() {
            return Err(DraftError::MissingPriority.into());
        }

        let contents = minicbor::to_vec(self).map_err(|e| WorkflowError::Codec(e.to_string()))?;
        let hash = sha256::digest(&contents);

        Ok((hash, contents))
    }
}

/// An immutable snapshot of a report's editable fields at one point in
/// time. Version numbers are 1-based and gap-free per report.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct ReportVersion {
    #[n(0)]
    pub version_id: String,
    #[n(1)]
    pub report_id: String,
    #[n(2)]
    pub version_number: u32,
    #[n(3)]
    pub content: ReportContent,
    #[n(4)]
    pub content_hash: String,
    #[n(5)]
    pub created_by: String,
    #[n(6)]
    pub created_at: TimeStamp<Utc>,
    #[n(7)]
    pub change_description: String,
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}
impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}
impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}
