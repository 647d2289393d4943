//! Report status state machine and role-gated transition table
use crate::error::WorkflowError;
use std::fmt;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportStatus {
    #[n(0)]
    Draft,
    #[n(1)]
    SubmittedToSector,
    #[n(2)]
    UnderReviewSector,
    #[n(3)]
    ReturnedForRevisionSector,
    #[n(4)]
    ApprovedBySector,
    #[n(5)]
    UnderReviewDmd,
    #[n(6)]
    ReturnedForRevisionDmd,
    #[n(7)]
    FinalApproved,
    #[n(8)]
    Cancelled,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserRole {
    #[n(0)]
    SystemAdmin,
    #[n(1)]
    DeputyMd,
    #[n(2)]
    ChiefOfSector,
    #[n(3)]
    HeadOfDivision,
    #[n(4)]
    DivisionSecretary,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 9] = [
        ReportStatus::Draft,
        ReportStatus::SubmittedToSector,
        ReportStatus::UnderReviewSector,
        ReportStatus::ReturnedForRevisionSector,
        ReportStatus::ApprovedBySector,
        ReportStatus::UnderReviewDmd,
        ReportStatus::ReturnedForRevisionDmd,
        ReportStatus::FinalApproved,
        ReportStatus::Cancelled,
    ];

    /// Terminal statuses absorb: no outgoing transitions, not even cancellation.
    pub fn is_terminal(self) -> bool {
        matches!(self, ReportStatus::FinalApproved | ReportStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::SubmittedToSector => "submitted_to_sector",
            ReportStatus::UnderReviewSector => "under_review_sector",
            ReportStatus::ReturnedForRevisionSector => "returned_for_revision_sector",
            ReportStatus::ApprovedBySector => "approved_by_sector",
            ReportStatus::UnderReviewDmd => "under_review_dmd",
            ReportStatus::ReturnedForRevisionDmd => "returned_for_revision_dmd",
            ReportStatus::FinalApproved => "final_approved",
            ReportStatus::Cancelled => "cancelled",
        }
    }
}

impl UserRole {
    pub const ALL: [UserRole; 5] = [
        UserRole::SystemAdmin,
        UserRole::DeputyMd,
        UserRole::ChiefOfSector,
        UserRole::HeadOfDivision,
        UserRole::DivisionSecretary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::SystemAdmin => "SYSTEM_ADMIN",
            UserRole::DeputyMd => "DEPUTY_MD",
            UserRole::ChiefOfSector => "CHIEF_OF_SECTOR",
            UserRole::HeadOfDivision => "HEAD_OF_DIVISION",
            UserRole::DivisionSecretary => "DIVISION_SECRETARY",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// The approval chain as static data. Creator-identity checks for the
// division-side entries live in the service layer; this table only knows
// about roles. Cancellation is handled below the table: any non-terminal
// status may be cancelled by a system administrator.
const TRANSITIONS: &[(ReportStatus, ReportStatus, &[UserRole])] = &[
    (
        ReportStatus::Draft,
        ReportStatus::SubmittedToSector,
        &[UserRole::HeadOfDivision, UserRole::DivisionSecretary],
    ),
    (
        ReportStatus::SubmittedToSector,
        ReportStatus::UnderReviewSector,
        &[UserRole::ChiefOfSector],
    ),
    (
        ReportStatus::UnderReviewSector,
        ReportStatus::ReturnedForRevisionSector,
        &[UserRole::ChiefOfSector],
    ),
    (
        ReportStatus::UnderReviewSector,
        ReportStatus::ApprovedBySector,
        &[UserRole::ChiefOfSector],
    ),
    (
        ReportStatus::ReturnedForRevisionSector,
        ReportStatus::SubmittedToSector,
        &[UserRole::HeadOfDivision, UserRole::DivisionSecretary],
    ),
    (
        ReportStatus::ApprovedBySector,
        ReportStatus::UnderReviewDmd,
        &[UserRole::DeputyMd],
    ),
    (
        ReportStatus::UnderReviewDmd,
        ReportStatus::ReturnedForRevisionDmd,
        &[UserRole::DeputyMd],
    ),
    (
        ReportStatus::UnderReviewDmd,
        ReportStatus::FinalApproved,
        &[UserRole::DeputyMd],
    ),
    (
        ReportStatus::ReturnedForRevisionDmd,
        ReportStatus::SubmittedToSector,
        &[UserRole::HeadOfDivision, UserRole::DivisionSecretary],
    ),
];

const CANCEL_ROLES: &[UserRole] = &[UserRole::SystemAdmin];

/// Roles permitted to move a report from `from` to `to`, or `None` when the
/// pair is not in the table at all.
pub fn allowed_roles(from: ReportStatus, to: ReportStatus) -> Option<&'static [UserRole]> {
    if to == ReportStatus::Cancelled && !from.is_terminal() {
        return Some(CANCEL_ROLES);
    }
    TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, roles)| *roles)
}

pub fn can_transition(from: ReportStatus, to: ReportStatus, role: UserRole) -> bool {
    allowed_roles(from, to).is_some_and(|roles| roles.contains(&role))
}

/// Typed variant of [`can_transition`]: an unknown pair fails as
/// `InvalidTransition`, a known pair with the wrong role as `Unauthorized`.
pub fn check_transition(
    from: ReportStatus,
    to: ReportStatus,
    role: UserRole,
) -> Result<(), WorkflowError> {
    match allowed_roles(from, to) {
        None => Err(WorkflowError::InvalidTransition { from, to }),
        Some(roles) if roles.contains(&role) => Ok(()),
        Some(_) => Err(WorkflowError::Unauthorized {
            role,
            action: format!("move a report from {from} to {to}"),
        }),
    }
}

/// Every status reachable from `from` in a single legal transition,
/// regardless of role. Empty for terminal statuses.
pub fn next_states(from: ReportStatus) -> Vec<ReportStatus> {
    let mut out: Vec<ReportStatus> = TRANSITIONS
        .iter()
        .filter(|(f, _, _)| *f == from)
        .map(|(_, t, _)| *t)
        .collect();
    if !from.is_terminal() {
        out.push(ReportStatus::Cancelled);
    }
    out
}

/// The submission entries are re-entered by the report creator; the service
/// layer must additionally check actor identity for these pairs.
pub fn is_creator_gated(from: ReportStatus, to: ReportStatus) -> bool {
    to == ReportStatus::SubmittedToSector
        && matches!(
            from,
            ReportStatus::Draft
                | ReportStatus::ReturnedForRevisionSector
                | ReportStatus::ReturnedForRevisionDmd
        )
}
