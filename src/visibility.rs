//! Role-scoped report visibility
//!
//! The filter is a pure subset operation over report aggregates; the host
//! injects the identity and organisational directory it already maintains.
use crate::context::ReportContext;
use crate::state::UserRole;

/// A user as supplied by the host's identity collaborator. Never persisted
/// by this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub sector_ids: Vec<String>,
    pub division_ids: Vec<String>,
    pub is_active: bool,
}

impl User {
    pub fn new(user_id: String, name: &str, email: &str, role: UserRole) -> Self {
        Self {
            user_id,
            name: name.to_owned(),
            email: email.to_owned(),
            role,
            sector_ids: vec![],
            division_ids: vec![],
            is_active: true,
        }
    }
    pub fn in_sector(mut self, sector_id: &str) -> Self {
        self.sector_ids.push(sector_id.to_owned());
        self
    }
    pub fn in_division(mut self, division_id: &str) -> Self {
        self.division_ids.push(division_id.to_owned());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Division {
    pub division_id: String,
    pub sector_id: String,
    pub name: String,
}

/// Minimal division -> sector mapping for sector-chief scoping.
#[derive(Debug, Default, Clone)]
pub struct OrgDirectory {
    divisions: Vec<Division>,
}

impl OrgDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_division(mut self, division_id: &str, sector_id: &str, name: &str) -> Self {
        self.divisions.push(Division {
            division_id: division_id.to_owned(),
            sector_id: sector_id.to_owned(),
            name: name.to_owned(),
        });
        self
    }

    pub fn sector_of(&self, division_id: &str) -> Option<&str> {
        self.divisions
            .iter()
            .find(|d| d.division_id == division_id)
            .map(|d| d.sector_id.as_str())
    }
}

fn is_visible(report: &ReportContext, user: &User, directory: &OrgDirectory) -> bool {
    match user.role {
        UserRole::SystemAdmin | UserRole::DeputyMd => true,
        UserRole::ChiefOfSector => directory
            .sector_of(&report.division_id)
            .is_some_and(|sector_id| user.sector_ids.iter().any(|s| s == sector_id)),
        UserRole::HeadOfDivision | UserRole::DivisionSecretary => {
            user.division_ids.iter().any(|d| *d == report.division_id)
                || report.created_by == user.user_id
        }
    }
}

/// Subset of `reports` the user may see. Never mutates the input, never
/// introduces or duplicates a report, and re-applying it changes nothing.
pub fn filter_reports(
    reports: &[ReportContext],
    user: &User,
    directory: &OrgDirectory,
) -> Vec<ReportContext> {
    reports
        .iter()
        .filter(|report| is_visible(report, user, directory))
        .cloned()
        .collect()
}
