use serde::Serialize;

use crate::domain::errors::{TeamBuilderError, TeamBuilderResult};
use crate::domain::repositories::TeamRepository;
use crate::domain::team::value_objects::positionally_equal;

/// Totals from a repair pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    /// Teams whose members were rewritten
    pub fixed_count: usize,
    /// Teams removed because nothing valid was left
    pub deleted_count: usize,
    /// Teams whose update or delete failed and were skipped
    pub failed_count: usize,
}

/// Re-canonicalizes every stored team
///
/// For each team: an empty canonical list deletes it; a list that differs
/// positionally from what is stored is written back; anything else is left
/// alone. A failing listing aborts the pass. A failing update or delete is
/// logged, counted in `failed_count`, and the pass moves on, so running it
/// again retries only what is still broken.
pub async fn repair_all(teams: &dyn TeamRepository) -> TeamBuilderResult<RepairReport> {
    let listing = teams.list_all().await.map_err(|e| {
        tracing::error!(error = %e, "Repair pass could not list teams");
        TeamBuilderError::remote(e)
    })?;

    let mut report = RepairReport::default();

    for team in &listing {
        let canonical = team.canonical_members();

        if canonical.is_empty() {
            match teams.delete(team.id()).await {
                Ok(()) => report.deleted_count += 1,
                Err(e) => {
                    tracing::warn!(team_id = %team.id(), error = %e, "Repair could not delete team");
                    report.failed_count += 1;
                }
            }
        } else if !positionally_equal(team.stored_members(), &canonical) {
            match teams.update_members(team.id(), &canonical).await {
                Ok(()) => report.fixed_count += 1,
                Err(e) => {
                    tracing::warn!(team_id = %team.id(), error = %e, "Repair could not update team");
                    report.failed_count += 1;
                }
            }
        }
    }

    tracing::info!(
        scanned = listing.len(),
        fixed = report.fixed_count,
        deleted = report.deleted_count,
        failed = report.failed_count,
        "Repair pass finished"
    );

    Ok(report)
}
