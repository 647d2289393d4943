//! Smoke Screen Unit tests for report approval system components
//!
//! These test are unit tests that span the codebase, testing behavior in
//! isolation from integration scenarios. These are intended as smoke-screen
//! and generally test the happy-path.
//!

use report_approval::{
    audit::{AuditAction, AuditEntity, AuditFilter, AuditRecord, to_csv},
    comments::{Comment, CommentType, build_tree, depth_of, filter_by_type},
    diff::detect_changes,
    report::{Priority, ReportContent, TimeStamp},
    state::{ReportStatus, UserRole, can_transition, next_states},
    utils::new_uuid_to_bech32,
};

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Test that new_uuid_to_bech32 generates valid bech32-encoded strings
    /// with the correct human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let result = new_uuid_to_bech32("report_");
        assert!(result.is_ok());

        let encoded = result.unwrap();
        assert!(encoded.starts_with("report_1"));
        assert!(encoded.len() > 10); // UUID should produce substantial output
    }

    /// Test that the function handles empty strings appropriately
    #[test]
    fn handles_empty_hrp() {
        // Empty string should fail
        let result = new_uuid_to_bech32("");
        assert!(result.is_err());
    }

    /// Test that multiple calls generate unique identifiers
    #[test]
    fn generates_unique_ids() {
        let id1 = new_uuid_to_bech32("report_").unwrap();
        let id2 = new_uuid_to_bech32("report_").unwrap();
        let id3 = new_uuid_to_bech32("report_").unwrap();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    /// Test that different HRPs produce different encoded strings
    #[test]
    fn different_hrps_produce_different_encodings() {
        let report_id = new_uuid_to_bech32("report_").unwrap();
        let user_id = new_uuid_to_bech32("user_").unwrap();

        assert!(report_id.starts_with("report_"));
        assert!(user_id.starts_with("user_"));
        assert_ne!(report_id, user_id);
    }
}

// STATE MACHINE TESTS
#[cfg(test)]
mod state_tests {
    use super::*;
    use ReportStatus::*;
    use UserRole::*;

    /// The complete set of permitted (from, to, role) triples. Everything
    /// outside this list must be rejected.
    fn permitted_triples() -> Vec<(ReportStatus, ReportStatus, UserRole)> {
        let mut triples = vec![
            (Draft, SubmittedToSector, HeadOfDivision),
            (Draft, SubmittedToSector, DivisionSecretary),
            (SubmittedToSector, UnderReviewSector, ChiefOfSector),
            (UnderReviewSector, ReturnedForRevisionSector, ChiefOfSector),
            (UnderReviewSector, ApprovedBySector, ChiefOfSector),
            (ReturnedForRevisionSector, SubmittedToSector, HeadOfDivision),
            (
                ReturnedForRevisionSector,
                SubmittedToSector,
                DivisionSecretary,
            ),
            (ApprovedBySector, UnderReviewDmd, DeputyMd),
            (UnderReviewDmd, ReturnedForRevisionDmd, DeputyMd),
            (UnderReviewDmd, FinalApproved, DeputyMd),
            (ReturnedForRevisionDmd, SubmittedToSector, HeadOfDivision),
            (ReturnedForRevisionDmd, SubmittedToSector, DivisionSecretary),
        ];
        // any non-terminal status may be cancelled by an administrator
        for from in ReportStatus::ALL {
            if !from.is_terminal() {
                triples.push((from, Cancelled, SystemAdmin));
            }
        }
        triples
    }

    /// Exhaustively check every (from, to, role) combination against the
    /// expected table
    #[test]
    fn transition_table_is_exact() {
        let permitted = permitted_triples();
        assert_eq!(permitted.len(), 19);

        for from in ReportStatus::ALL {
            for to in ReportStatus::ALL {
                for role in UserRole::ALL {
                    let expected = permitted.contains(&(from, to, role));
                    assert_eq!(
                        can_transition(from, to, role),
                        expected,
                        "mismatch for {from} -> {to} as {role}"
                    );
                }
            }
        }
    }

    #[test]
    fn next_states_match_the_table() {
        let cases: &[(ReportStatus, &[ReportStatus])] = &[
            (Draft, &[SubmittedToSector, Cancelled]),
            (SubmittedToSector, &[UnderReviewSector, Cancelled]),
            (
                UnderReviewSector,
                &[ReturnedForRevisionSector, ApprovedBySector, Cancelled],
            ),
            (ReturnedForRevisionSector, &[SubmittedToSector, Cancelled]),
            (ApprovedBySector, &[UnderReviewDmd, Cancelled]),
            (
                UnderReviewDmd,
                &[ReturnedForRevisionDmd, FinalApproved, Cancelled],
            ),
            (ReturnedForRevisionDmd, &[SubmittedToSector, Cancelled]),
            (FinalApproved, &[]),
            (Cancelled, &[]),
        ];

        for (from, expected) in cases {
            let mut actual = next_states(*from);
            let mut expected = expected.to_vec();
            actual.sort_by_key(|s| s.as_str());
            expected.sort_by_key(|s| s.as_str());
            assert_eq!(actual, expected, "next_states({from})");
        }
    }

    /// Display strings follow the wire spelling used by host applications
    #[test]
    fn display_spellings() {
        assert_eq!(
            ReturnedForRevisionSector.to_string(),
            "returned_for_revision_sector"
        );
        assert_eq!(FinalApproved.to_string(), "final_approved");
        assert_eq!(DeputyMd.to_string(), "DEPUTY_MD");
        assert_eq!(DivisionSecretary.to_string(), "DIVISION_SECRETARY");
    }
}

// REPORT CONTENT TESTS
#[cfg(test)]
mod content_tests {
    use super::*;

    /// Test that TimeStamp::new() creates a timestamp close to current time
    #[test]
    fn timestamp_new_creates_current_time() {
        let ts = TimeStamp::new();
        let now = chrono::Utc::now();

        let diff = (now - ts.to_datetime_utc()).num_seconds().abs();
        assert!(diff < 1); // Should be within 1 second
    }

    #[test]
    fn fields_flatten_in_declaration_order() {
        let content = ReportContent::new()
            .set_title("t")
            .set_summary("s")
            .set_risks("r")
            .set_priority(Priority::Critical);

        let fields = content.fields();
        let names: Vec<&str> = fields.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["title", "summary", "risks", "priority"]);
        assert_eq!(fields[3].1, "critical");
    }

    #[test]
    fn unset_fields_are_absent_not_empty() {
        let content = ReportContent::new().set_title("t");
        assert!(content.fields().iter().all(|(name, _)| name != "summary"));
    }

    #[test]
    fn attachments_flatten_to_one_field() {
        let content = ReportContent::new()
            .set_title("t")
            .add_attachment("annex-a.pdf")
            .add_attachment("figures.xlsx");

        let fields = content.fields();
        let attachment = fields.iter().find(|(name, _)| name == "attachments");
        assert_eq!(
            attachment.map(|(_, value)| value.as_str()),
            Some("annex-a.pdf, figures.xlsx")
        );
    }

    #[test]
    fn finalise_requires_title_summary_priority() {
        assert!(ReportContent::new().validate_and_finalise().is_err());
        assert!(
            ReportContent::new()
                .set_title("t")
                .set_summary("s")
                .validate_and_finalise()
                .is_err()
        );
        assert!(
            ReportContent::new()
                .set_title("t")
                .set_summary("s")
                .set_priority(Priority::Low)
                .validate_and_finalise()
                .is_ok()
        );
    }

    #[test]
    fn different_content_hashes_differently() {
        let a = ReportContent::new()
            .set_title("t")
            .set_summary("one")
            .set_priority(Priority::Low);
        let b = ReportContent::new()
            .set_title("t")
            .set_summary("two")
            .set_priority(Priority::Low);

        let (hash_a, _) = a.validate_and_finalise().unwrap();
        let (hash_b, _) = b.validate_and_finalise().unwrap();
        assert_ne!(hash_a, hash_b);
    }
}

// CHANGE DETECTOR TESTS
#[cfg(test)]
mod diff_tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Old-snapshot order first, then new-only fields appended
    #[test]
    fn ordering_is_old_then_new_only() {
        let old = snapshot(&[("b", "1"), ("a", "2")]);
        let new = snapshot(&[("c", "3"), ("a", "4"), ("b", "1")]);

        let changes = detect_changes(&old, &new);
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "c"]);
    }

    #[test]
    fn detects_content_snapshot_changes() {
        let old = ReportContent::new()
            .set_title("t")
            .set_summary("before")
            .set_priority(Priority::Low);
        let new = ReportContent::new()
            .set_title("t")
            .set_summary("after")
            .set_priority(Priority::High);

        let changes = detect_changes(&old.fields(), &new.fields());
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, "summary");
        assert_eq!(changes[1].field, "priority");
        assert_eq!(changes[1].new_value.as_deref(), Some("high"));
    }
}

// COMMENT ENGINE TESTS
#[cfg(test)]
mod comment_tests {
    use super::*;

    fn comment(id: &str, parent: Option<&str>, kind: CommentType) -> Comment {
        Comment::new(
            id.into(),
            "report_x".into(),
            "user_x".into(),
            "body".into(),
            kind,
            parent.map(str::to_owned),
        )
    }

    /// A reply whose parent is missing from the input is kept, not dropped
    #[test]
    fn orphan_replies_are_preserved() {
        let comments = vec![
            comment("comment_a", None, CommentType::General),
            comment("comment_b", Some("comment_gone"), CommentType::General),
        ];
        let thread = build_tree(comments);

        assert_eq!(thread.len(), 2);
        assert_eq!(thread.children["comment_gone"].len(), 1);
    }

    /// A dangling parent reference terminates the depth walk instead of
    /// looping
    #[test]
    fn depth_with_dangling_parent() {
        let comments = vec![comment(
            "comment_b",
            Some("comment_gone"),
            CommentType::General,
        )];
        assert_eq!(depth_of(&comments, "comment_b"), Some(1));
    }

    #[test]
    fn filter_selects_one_type() {
        let comments = vec![
            comment("comment_a", None, CommentType::Review),
            comment("comment_b", None, CommentType::General),
            comment("comment_c", None, CommentType::Review),
        ];
        let reviews = filter_by_type(&comments, CommentType::Review);
        assert_eq!(reviews.len(), 2);
        assert!(reviews.iter().all(|c| c.kind == CommentType::Review));
    }
}

// AUDIT TRAIL TESTS
#[cfg(test)]
mod audit_tests {
    use super::*;

    fn record(action: AuditAction, entity: AuditEntity) -> AuditRecord {
        AuditRecord {
            record_id: "audit_x".into(),
            recorded_at: TimeStamp::new(),
            user_id: "user_x".into(),
            user_name: "Auditor".into(),
            action,
            entity,
            entity_id: "entity_x".into(),
            entity_name: "Entity".into(),
            changes: vec![],
        }
    }

    #[test]
    fn filter_by_action_and_entity() {
        let rec = record(AuditAction::Delete, AuditEntity::Project);

        let hit = AuditFilter {
            action: Some(AuditAction::Delete),
            entity: Some(AuditEntity::Project),
            search: None,
        };
        assert!(hit.matches(&rec));

        let miss = AuditFilter {
            action: Some(AuditAction::Create),
            ..Default::default()
        };
        assert!(!miss.matches(&rec));
    }

    /// An empty change list serialises as an empty JSON array, not an
    /// empty cell
    #[test]
    fn csv_renders_empty_changes_as_json() {
        let csv = to_csv(&[record(AuditAction::Activate, AuditEntity::Sector)]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.ends_with(",[]"));
        assert!(row.contains("ACTIVATE"));
        assert!(row.contains("SECTOR"));
    }

    #[test]
    fn action_and_entity_spellings() {
        assert_eq!(AuditAction::Deactivate.to_string(), "DEACTIVATE");
        assert_eq!(AuditEntity::Division.to_string(), "DIVISION");
    }
}
