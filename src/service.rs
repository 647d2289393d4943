//! Service layer API for report workflow operations
use super::audit::{self, AuditAction, AuditEntity, AuditFilter, AuditRecord};
use super::comments::{self, Comment, CommentThread, CommentType};
use super::context::{ReportContext, StatusEntry};
use super::diff::{self, FieldChange};
use super::error::WorkflowError;
use super::report::{ReportContent, ReportVersion, TimeStamp};
use super::state::{self, ReportStatus};
use super::utils::mint_id;
use super::visibility::{self, OrgDirectory, User};
use sled::Batch;
use std::sync::Arc;

/// Site-configurable workflow constraints.
#[derive(Debug, Clone)]
pub struct WorkflowPolicy {
    /// The creator may cancel their own non-terminal report regardless of role.
    pub creator_may_cancel: bool,
    /// Maximum reply nesting depth; a top-level comment sits at depth 0.
    pub max_reply_depth: u32,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            creator_may_cancel: true,
            max_reply_depth: 3,
        }
    }
}

pub struct ReportService {
    instance: Arc<sled::Db>,
    reports: sled::Tree,
    versions: sled::Tree,
    comments: sled::Tree,
    audit: sled::Tree,
    policy: WorkflowPolicy,
}

fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>, WorkflowError> {
    minicbor::to_vec(value).map_err(|e| WorkflowError::Codec(e.to_string()))
}

fn decode<'b, T: minicbor::Decode<'b, ()>>(bytes: &'b [u8]) -> Result<T, WorkflowError> {
    minicbor::decode(bytes).map_err(|e| WorkflowError::Codec(e.to_string()))
}

fn version_key(report_id: &str, number: u32) -> String {
    // zero-padded so lexicographic key order is version order
    format!("{report_id}/{number:010}")
}

fn comment_key(report_id: &str, comment_id: &str) -> String {
    format!("{report_id}/{comment_id}")
}

impl ReportService {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, WorkflowError> {
        Self::with_policy(instance, WorkflowPolicy::default())
    }

    pub fn with_policy(
        instance: Arc<sled::Db>,
        policy: WorkflowPolicy,
    ) -> Result<Self, WorkflowError> {
        let reports = instance.open_tree("reports")?;
        let versions = instance.open_tree("versions")?;
        let comments = instance.open_tree("comments")?;
        let audit = instance.open_tree("audit")?;
        Ok(Self {
            instance,
            reports,
            versions,
            comments,
            audit,
            policy,
        })
    }

    /// Load a report aggregate along with the raw bytes it was read from,
    /// which later serve as the compare-and-swap expected value.
    fn load_context_raw(
        &self,
        report_id: &str,
    ) -> Result<(sled::IVec, ReportContext), WorkflowError> {
        let bytes = self
            .reports
            .get(report_id)?
            .ok_or_else(|| WorkflowError::NotFound(report_id.to_owned()))?;
        let ctx = decode::<ReportContext>(&bytes)?;
        Ok((bytes, ctx))
    }

    pub fn get_report(&self, report_id: &str) -> Result<ReportContext, WorkflowError> {
        Ok(self.load_context_raw(report_id)?.1)
    }

    /// Create a new report in Draft and record version 1 of its content.
    pub fn create_report(
        &self,
        content: &ReportContent,
        creator: &User,
        division_id: &str,
        project_id: Option<String>,
    ) -> Result<ReportContext, WorkflowError> {
        let (content_hash, _) = content.validate_and_finalise()?;

        let report_id = mint_id("report_")?;
        let mut ctx = ReportContext::new(
            report_id.clone(),
            creator.user_id.clone(),
            division_id.to_owned(),
            project_id,
        );

        let version = ReportVersion {
            version_id: mint_id("version_")?,
            report_id: report_id.clone(),
            version_number: 1,
            content: content.clone(),
            content_hash: content_hash.clone(),
            created_by: creator.user_id.clone(),
            created_at: TimeStamp::new(),
            change_description: "initial draft".to_owned(),
        };
        ctx.current_version = 1;
        ctx.latest_content_hash = content_hash;

        // version snapshot lands before the aggregate so a listed report
        // always has its version 1 in place
        self.versions
            .insert(version_key(&report_id, 1), encode(&version)?)?;
        self.reports.insert(&report_id, encode(&ctx)?)?;

        tracing::info!(report_id = %ctx.report_id, division_id, "report created in draft");

        Ok(ctx)
    }

    /// Attempt a status transition on behalf of an actor.
    ///
    /// Ledger append and status update happen in one record write, applied
    /// with compare-and-swap against the bytes read at load: a competing
    /// transition that lands first surfaces as `ConcurrentModification`.
    pub fn attempt_transition(
        &self,
        report_id: &str,
        to: ReportStatus,
        actor: &User,
        comment: Option<String>,
    ) -> Result<StatusEntry, WorkflowError> {
        let (old_bytes, mut ctx) = self.load_context_raw(report_id)?;
        let from = ctx.current_status();

        let creator_cancel = to == ReportStatus::Cancelled
            && !from.is_terminal()
            && self.policy.creator_may_cancel
            && actor.user_id == ctx.created_by;

        if !creator_cancel {
            state::check_transition(from, to, actor.role)?;

            // the submission hops are re-entered by the creator only
            if state::is_creator_gated(from, to) && actor.user_id != ctx.created_by {
                return Err(WorkflowError::Unauthorized {
                    role: actor.role,
                    action: "submit a report they did not create".to_owned(),
                });
            }
        }

        let entry = StatusEntry::new(
            mint_id("entry_")?,
            ctx.report_id.clone(),
            from,
            to,
            actor.user_id.clone(),
            comment,
        );
        ctx.insert_entry(entry.clone());
        ctx.current_status = to;
        ctx.updated_at = TimeStamp::new();

        self.reports
            .compare_and_swap(report_id, Some(old_bytes), Some(encode(&ctx)?))?
            .map_err(|_| WorkflowError::ConcurrentModification)?;

        tracing::info!(
            report_id = %entry.report_id,
            from = %entry.from_status,
            to = %entry.to_status,
            action_by = %entry.action_by,
            "report status transition recorded"
        );

        Ok(entry)
    }

    /// Record a new content version. The version number is claimed through
    /// compare-and-swap on the aggregate, keeping the sequence gap-free
    /// when two editors race.
    pub fn record_version(
        &self,
        report_id: &str,
        content: &ReportContent,
        author: &User,
        change_description: &str,
    ) -> Result<ReportVersion, WorkflowError> {
        let (old_bytes, mut ctx) = self.load_context_raw(report_id)?;

        if !ctx.is_editable() {
            return Err(WorkflowError::NotEditable(ctx.current_status()));
        }
        if author.user_id != ctx.created_by {
            return Err(WorkflowError::Unauthorized {
                role: author.role,
                action: "edit report content they did not create".to_owned(),
            });
        }

        let (content_hash, _) = content.validate_and_finalise()?;
        let number = ctx.current_version + 1;

        let version = ReportVersion {
            version_id: mint_id("version_")?,
            report_id: ctx.report_id.clone(),
            version_number: number,
            content: content.clone(),
            content_hash: content_hash.clone(),
            created_by: author.user_id.clone(),
            created_at: TimeStamp::new(),
            change_description: change_description.to_owned(),
        };

        ctx.current_version = number;
        ctx.latest_content_hash = content_hash;
        ctx.updated_at = TimeStamp::new();

        self.reports
            .compare_and_swap(report_id, Some(old_bytes), Some(encode(&ctx)?))?
            .map_err(|_| WorkflowError::ConcurrentModification)?;
        self.versions
            .insert(version_key(report_id, number), encode(&version)?)?;

        tracing::info!(report_id, version = number, "report version recorded");

        Ok(version)
    }

    /// All version snapshots of a report, in version order.
    pub fn get_versions(&self, report_id: &str) -> Result<Vec<ReportVersion>, WorkflowError> {
        let mut out = Vec::new();
        for item in self.versions.scan_prefix(format!("{report_id}/")) {
            let (_, bytes) = item?;
            out.push(decode::<ReportVersion>(&bytes)?);
        }
        Ok(out)
    }

    pub fn get_version(
        &self,
        report_id: &str,
        number: u32,
    ) -> Result<ReportVersion, WorkflowError> {
        let bytes = self
            .versions
            .get(version_key(report_id, number))?
            .ok_or_else(|| WorkflowError::NotFound(format!("{report_id} version {number}")))?;
        decode(&bytes)
    }

    /// Field-level difference between two versions. Argument order is
    /// normalised so the smaller version number is always the old side.
    pub fn diff_versions(
        &self,
        report_id: &str,
        a: u32,
        b: u32,
    ) -> Result<Vec<FieldChange>, WorkflowError> {
        let (older, newer) = if a <= b { (a, b) } else { (b, a) };
        let older = self.get_version(report_id, older)?;
        let newer = self.get_version(report_id, newer)?;

        Ok(diff::detect_changes(
            &older.content.fields(),
            &newer.content.fields(),
        ))
    }

    /// Append one audit record. The key is a monotonic sequence number, so
    /// iteration order is insertion order.
    pub fn log_audit(
        &self,
        actor: &User,
        action: AuditAction,
        entity: AuditEntity,
        entity_id: &str,
        entity_name: &str,
        changes: Vec<FieldChange>,
    ) -> Result<AuditRecord, WorkflowError> {
        let record = AuditRecord {
            record_id: mint_id("audit_")?,
            recorded_at: TimeStamp::new(),
            user_id: actor.user_id.clone(),
            user_name: actor.name.clone(),
            action,
            entity,
            entity_id: entity_id.to_owned(),
            entity_name: entity_name.to_owned(),
            changes,
        };

        let seq = self.instance.generate_id()?;
        self.audit.insert(format!("{seq:020}"), encode(&record)?)?;

        Ok(record)
    }

    /// Audit records matching the filter, newest first.
    pub fn list_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, WorkflowError> {
        let mut out = Vec::new();
        for item in self.audit.iter().rev() {
            let (_, bytes) = item?;
            let record = decode::<AuditRecord>(&bytes)?;
            if filter.matches(&record) {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Remove every audit record. Irreversible; the caller is responsible
    /// for confirming the operation upstream.
    pub fn clear_audit(&self) -> Result<usize, WorkflowError> {
        let mut batch = Batch::default();
        let mut removed = 0usize;
        for item in self.audit.iter() {
            let (key, _) = item?;
            batch.remove(key);
            removed += 1;
        }
        self.audit.apply_batch(batch)?;

        tracing::warn!(removed, "audit trail cleared");

        Ok(removed)
    }

    pub fn export_audit_csv(&self, filter: &AuditFilter) -> Result<String, WorkflowError> {
        Ok(audit::to_csv(&self.list_audit(filter)?))
    }

    /// Add a top-level comment to a report.
    pub fn add_comment(
        &self,
        report_id: &str,
        author: &User,
        body: &str,
        kind: CommentType,
    ) -> Result<Comment, WorkflowError> {
        // reports must exist before discussion attaches to them
        self.load_context_raw(report_id)?;

        let comment = Comment::new(
            mint_id("comment_")?,
            report_id.to_owned(),
            author.user_id.clone(),
            body.to_owned(),
            kind,
            None,
        );
        self.comments.insert(
            comment_key(report_id, &comment.comment_id),
            encode(&comment)?,
        )?;

        Ok(comment)
    }

    /// Reply to an existing comment, subject to the configured depth bound.
    pub fn add_reply(
        &self,
        report_id: &str,
        parent_id: &str,
        author: &User,
        body: &str,
        kind: CommentType,
    ) -> Result<Comment, WorkflowError> {
        let all = self.comments_for(report_id)?;
        let parent_depth = comments::depth_of(&all, parent_id)
            .ok_or_else(|| WorkflowError::NotFound(parent_id.to_owned()))?;

        if parent_depth >= self.policy.max_reply_depth {
            return Err(WorkflowError::DepthExceeded {
                max: self.policy.max_reply_depth,
            });
        }

        let comment = Comment::new(
            mint_id("comment_")?,
            report_id.to_owned(),
            author.user_id.clone(),
            body.to_owned(),
            kind,
            Some(parent_id.to_owned()),
        );
        self.comments.insert(
            comment_key(report_id, &comment.comment_id),
            encode(&comment)?,
        )?;

        Ok(comment)
    }

    /// Edit a comment body. Permitted to the author and to moderators.
    pub fn edit_comment(
        &self,
        report_id: &str,
        comment_id: &str,
        actor: &User,
        body: &str,
    ) -> Result<Comment, WorkflowError> {
        let key = comment_key(report_id, comment_id);
        let bytes = self
            .comments
            .get(&key)?
            .ok_or_else(|| WorkflowError::NotFound(comment_id.to_owned()))?;
        let mut comment = decode::<Comment>(&bytes)?;

        if comment.author_id != actor.user_id && !comments::can_moderate(actor.role) {
            return Err(WorkflowError::Unauthorized {
                role: actor.role,
                action: "edit a comment they did not write".to_owned(),
            });
        }

        comment.body = body.to_owned();
        comment.updated_at = TimeStamp::new();
        self.comments.insert(key.as_bytes(), encode(&comment)?)?;

        Ok(comment)
    }

    /// Delete a comment and cascade to its descendants, so no reply is
    /// left pointing at a missing parent. Returns the number removed.
    pub fn delete_comment(
        &self,
        report_id: &str,
        comment_id: &str,
        actor: &User,
    ) -> Result<usize, WorkflowError> {
        let all = self.comments_for(report_id)?;
        let target = all
            .iter()
            .find(|c| c.comment_id == comment_id)
            .ok_or_else(|| WorkflowError::NotFound(comment_id.to_owned()))?;

        if target.author_id != actor.user_id && !comments::can_moderate(actor.role) {
            return Err(WorkflowError::Unauthorized {
                role: actor.role,
                action: "delete a comment they did not write".to_owned(),
            });
        }

        let mut batch = Batch::default();
        let mut removed = 1usize;
        batch.remove(comment_key(report_id, comment_id).as_bytes());
        for descendant in comments::descendants_of(&all, comment_id) {
            batch.remove(comment_key(report_id, &descendant).as_bytes());
            removed += 1;
        }
        self.comments.apply_batch(batch)?;

        Ok(removed)
    }

    /// The flat comment list for a report, storage order.
    pub fn comments_for(&self, report_id: &str) -> Result<Vec<Comment>, WorkflowError> {
        let mut out = Vec::new();
        for item in self.comments.scan_prefix(format!("{report_id}/")) {
            let (_, bytes) = item?;
            out.push(decode::<Comment>(&bytes)?);
        }
        Ok(out)
    }

    /// The rebuilt reply tree for a report.
    pub fn comment_tree(&self, report_id: &str) -> Result<CommentThread, WorkflowError> {
        Ok(comments::build_tree(self.comments_for(report_id)?))
    }

    /// Every stored report the user may see under the visibility policy.
    pub fn visible_reports(
        &self,
        user: &User,
        directory: &OrgDirectory,
    ) -> Result<Vec<ReportContext>, WorkflowError> {
        let mut all = Vec::new();
        for item in self.reports.iter() {
            let (_, bytes) = item?;
            all.push(decode::<ReportContext>(&bytes)?);
        }
        Ok(visibility::filter_reports(&all, user, directory))
    }
}
