//! Threaded discussion attached to a report
//!
//! Comments persist as a flat list; the tree is a pure rebuild from that
//! list, keyed by optional parent id. Reply depth is bounded by the
//! workflow policy.
use crate::report::TimeStamp;
use crate::state::UserRole;
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum CommentType {
    #[n(0)]
    General,
    #[n(1)]
    Review,
    #[n(2)]
    Approval,
    #[n(3)]
    Rejection,
    #[n(4)]
    System,
}

impl CommentType {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentType::General => "general",
            CommentType::Review => "review",
            CommentType::Approval => "approval",
            CommentType::Rejection => "rejection",
            CommentType::System => "system",
        }
    }
}

impl fmt::Display for CommentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Comment {
    #[n(0)]
    pub comment_id: String,
    #[n(1)]
    pub report_id: String,
    #[n(2)]
    pub author_id: String,
    #[n(3)]
    pub body: String,
    #[n(4)]
    pub kind: CommentType,
    #[n(5)]
    pub parent_id: Option<String>,
    #[n(6)]
    pub created_at: TimeStamp<Utc>,
    #[n(7)]
    pub updated_at: TimeStamp<Utc>,
}

impl Comment {
    pub fn new(
        comment_id: String,
        report_id: String,
        author_id: String,
        body: String,
        kind: CommentType,
        parent_id: Option<String>,
    ) -> Self {
        let now = TimeStamp::new();
        Self {
            comment_id,
            report_id,
            author_id,
            body,
            kind,
            parent_id,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// A rebuilt reply tree. Top-level comments sort newest first; replies
/// under a parent sort oldest first for chronological reading.
#[derive(Debug, Default)]
pub struct CommentThread {
    pub top_level: Vec<Comment>,
    pub children: HashMap<String, Vec<Comment>>,
}

impl CommentThread {
    /// Total comments held, top-level and nested.
    pub fn len(&self) -> usize {
        self.top_level.len() + self.children.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition a flat list into the reply tree. Never drops a comment: a
/// reply whose parent is absent from the input still appears in the
/// children map under its recorded parent id.
pub fn build_tree(comments: Vec<Comment>) -> CommentThread {
    let mut thread = CommentThread::default();

    for comment in comments {
        match comment.parent_id.clone() {
            None => thread.top_level.push(comment),
            Some(parent_id) => thread.children.entry(parent_id).or_default().push(comment),
        }
    }

    // newest first; id as tie-break keeps ordering reproducible
    thread.top_level.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.comment_id.cmp(&a.comment_id))
    });
    for replies in thread.children.values_mut() {
        replies.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.comment_id.cmp(&b.comment_id))
        });
    }

    thread
}

/// Nesting depth of a comment: 0 for a top-level comment, parent depth + 1
/// for a reply. Returns `None` for an unknown id. The walk is bounded by
/// the list length so a malformed parent cycle terminates.
pub fn depth_of(comments: &[Comment], comment_id: &str) -> Option<u32> {
    let by_id: HashMap<&str, &Comment> = comments
        .iter()
        .map(|c| (c.comment_id.as_str(), c))
        .collect();

    let mut current = *by_id.get(comment_id)?;
    let mut depth = 0u32;
    for _ in 0..comments.len() {
        match current.parent_id.as_deref() {
            None => return Some(depth),
            Some(parent_id) => {
                depth += 1;
                match by_id.get(parent_id) {
                    Some(parent) => current = parent,
                    // dangling parent reference, count the hop and stop
                    None => return Some(depth),
                }
            }
        }
    }
    None
}

/// All comments of one type, in input order.
pub fn filter_by_type(comments: &[Comment], kind: CommentType) -> Vec<Comment> {
    comments
        .iter()
        .filter(|c| c.kind == kind)
        .cloned()
        .collect()
}

/// Ids of every comment in the subtree rooted at `comment_id`, the root
/// excluded. Used for cascade deletion.
pub fn descendants_of(comments: &[Comment], comment_id: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut frontier = vec![comment_id.to_owned()];
    while let Some(parent) = frontier.pop() {
        for comment in comments {
            if comment.parent_id.as_deref() == Some(parent.as_str()) {
                out.push(comment.comment_id.clone());
                frontier.push(comment.comment_id.clone());
            }
        }
    }
    out
}

/// Moderators may edit or delete comments they did not author.
pub fn can_moderate(role: UserRole) -> bool {
    matches!(role, UserRole::SystemAdmin | UserRole::DeputyMd)
}
