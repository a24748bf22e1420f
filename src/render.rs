// Reply text formatting for command responses.

use crate::catalog::MonsterRecord;
use crate::db::{Encounter, SizeTier};

/// Missing monsters and completion for one size tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeReport {
    pub size: SizeTier,
    /// Catalog entries not yet logged at this size, in catalog order.
    pub missing: Vec<String>,
    /// `round(100 * tracked / catalog_len)`.
    pub percent_complete: u32,
}

/// Partition the user's encounters by size and compute, per size, which
/// catalog monsters are still missing. Name matching is case-insensitive.
pub fn missing_by_size(catalog: &[MonsterRecord], encounters: &[Encounter]) -> Vec<SizeReport> {
    SizeTier::ALL
        .iter()
        .map(|&size| {
            let tracked: Vec<String> = encounters
                .iter()
                .filter(|e| e.size_tier() == Some(size))
                .map(|e| e.monster_name.to_lowercase())
                .collect();

            let missing: Vec<String> = catalog
                .iter()
                .filter(|m| !tracked.contains(&m.name.to_lowercase()))
                .map(|m| m.name.clone())
                .collect();

            let total = catalog.len();
            let done = total - missing.len();
            let percent_complete = if total == 0 {
                0
            } else {
                ((100.0 * done as f64) / total as f64).round() as u32
            };

            SizeReport {
                size,
                missing,
                percent_complete,
            }
        })
        .collect()
}

/// One line per logged encounter plus a total, for the `progress` command.
pub fn format_progress(encounters: &[Encounter]) -> String {
    let lines: Vec<String> = encounters
        .iter()
        .map(|e| format!("🦖 **{}** ({})", e.monster_name, e.size))
        .collect();
    format!(
        "{}\n\nTotal Encounters: {}",
        lines.join("\n"),
        encounters.len()
    )
}

/// Per-size missing lists with completion percentages, for the `missing`
/// command.
pub fn format_missing(reports: &[SizeReport]) -> String {
    let sections: Vec<String> = reports
        .iter()
        .map(|report| {
            if report.missing.is_empty() {
                format!(
                    "**{}**: all monsters tracked ({}% complete)",
                    report.size.label(),
                    report.percent_complete
                )
            } else {
                let list: Vec<String> = report
                    .missing
                    .iter()
                    .map(|name| format!("❌ **{name}**"))
                    .collect();
                format!(
                    "**{}** ({}% complete), still need:\n{}",
                    report.size.label(),
                    report.percent_complete,
                    list.join("\n")
                )
            }
        })
        .collect();
    sections.join("\n\n")
}

/// Appended to a monster menu reply when the catalog exceeded the cap.
pub fn truncation_notice(cap: usize) -> String {
    format!("Showing the first {cap} monsters; track some to see the rest.")
}
