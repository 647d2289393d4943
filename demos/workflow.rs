//! Walks one report through the full approval chain against a throwaway
//! database, printing the ledger at the end.
use report_approval::{
    comments::CommentType,
    report::{Priority, ReportContent},
    service::ReportService,
    state::{ReportStatus, UserRole},
    utils,
    visibility::{OrgDirectory, User},
};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db = sled::open("report-approval-demo")?;
    for name in db.tree_names() {
        db.open_tree(name)?.clear()?;
    }
    let service = ReportService::new(Arc::new(db))?;

    let creator = User::new(
        utils::user_id()?,
        "Lerato Mokoena",
        "lerato@example.gov",
        UserRole::HeadOfDivision,
    )
    .in_division("division_water");
    let chief = User::new(
        utils::user_id()?,
        "Sipho Dlamini",
        "sipho@example.gov",
        UserRole::ChiefOfSector,
    )
    .in_sector("sector_infrastructure");
    let dmd = User::new(
        utils::user_id()?,
        "Naledi Khumalo",
        "naledi@example.gov",
        UserRole::DeputyMd,
    );

    let directory =
        OrgDirectory::new().insert_division("division_water", "sector_infrastructure", "Water");

    // draft
    let content = ReportContent::new()
        .set_title("Q3 rural water supply")
        .set_summary("Boreholes ahead of schedule, pipeline behind")
        .set_risks("Pump supplier delivery slipping")
        .set_priority(Priority::High)
        .set_category("infrastructure");
    let ctx = service.create_report(&content, &creator, "division_water", None)?;
    println!("created {} in {}", ctx.report_id, ctx.current_status);

    // through the chain
    service.attempt_transition(&ctx.report_id, ReportStatus::SubmittedToSector, &creator, None)?;
    service.attempt_transition(&ctx.report_id, ReportStatus::UnderReviewSector, &chief, None)?;
    service.attempt_transition(
        &ctx.report_id,
        ReportStatus::ReturnedForRevisionSector,
        &chief,
        Some("quantify the pipeline delay".into()),
    )?;

    // revise and resubmit
    let revised = content
        .clone()
        .set_status_update("Pipeline delay quantified at six weeks");
    service.record_version(&ctx.report_id, &revised, &creator, "added delay estimate")?;
    service.attempt_transition(&ctx.report_id, ReportStatus::SubmittedToSector, &creator, None)?;
    service.attempt_transition(&ctx.report_id, ReportStatus::UnderReviewSector, &chief, None)?;
    service.attempt_transition(&ctx.report_id, ReportStatus::ApprovedBySector, &chief, None)?;
    service.attempt_transition(&ctx.report_id, ReportStatus::UnderReviewDmd, &dmd, None)?;
    service.attempt_transition(&ctx.report_id, ReportStatus::FinalApproved, &dmd, None)?;

    service.add_comment(
        &ctx.report_id,
        &dmd,
        "Good recovery on the revision.",
        CommentType::Approval,
    )?;

    let ctx = service.get_report(&ctx.report_id)?;
    println!("final status: {}", ctx.current_status);
    println!("{}", ctx.view_history());

    for change in service.diff_versions(&ctx.report_id, 1, 2)? {
        println!(
            "v1 -> v2: {} {:?} -> {:?}",
            change.field, change.old_value, change.new_value
        );
    }

    println!(
        "creator sees {} report(s)",
        service.visible_reports(&creator, &directory)?.len()
    );

    Ok(())
}
