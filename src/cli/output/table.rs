//! Table output formatting for CLI commands
//!
//! Campaign statistics, memo summaries and database listings rendered with
//! comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::domain::models::{
    CampaignState, CampaignStats, IRootDb, Idiom, Image, Inst, MemoSummary, StaticInfo,
    TestHistory, TestHistorySummary,
};

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
}

impl TableFormatter {
    /// Formatter that colors output unless the terminal cannot show it.
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
        }
    }

    /// Formatter with colors forced on or off.
    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// One row per campaign phase that ran
    pub fn format_campaign_stats(&self, stats: &[CampaignStats]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Phase", "Runs", "Time (s)", "State"]));

        for phase in stats {
            let state = if self.use_colors {
                Cell::new(phase.state).fg(state_color(phase.state))
            } else {
                Cell::new(phase.state)
            };
            table.add_row(vec![
                Cell::new(&phase.label),
                Cell::new(phase.runs),
                Cell::new(format!("{:.3}", phase.used_time.as_secs_f64())),
                state,
            ]);
        }

        table.to_string()
    }

    /// Class totals with a per-idiom breakdown
    pub fn format_memo_summary(&self, summary: &MemoSummary) -> String {
        let mut table = self.create_base_table();
        let mut columns = vec!["Class".to_string(), "Total".to_string()];
        columns.extend(Idiom::ALL.iter().map(ToString::to_string));
        table.set_header(
            columns
                .into_iter()
                .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );

        for (label, counts) in summary.classes() {
            let mut row = vec![Cell::new(label), Cell::new(counts.total)];
            row.extend(counts.per_idiom.iter().map(Cell::new));
            table.add_row(row);
        }

        format!(
            "{table}\niRoots with runtime info: {}",
            summary.total_iroot_info
        )
    }

    /// Images with their short names.
    pub fn format_images<'a>(&self, images: impl Iterator<Item = &'a Image>) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "Short", "Name"]));
        for image in images {
            table.add_row(vec![
                Cell::new(image.id),
                Cell::new(image.short_name()),
                Cell::new(&image.name),
            ]);
        }
        table.to_string()
    }

    /// Instructions with image, offset and source location.
    pub fn format_insts<'a>(
        &self,
        insts: impl Iterator<Item = &'a Inst>,
        sinfo: &StaticInfo,
    ) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "Image", "Offset", "Location"]));
        for inst in insts {
            let image = sinfo
                .find_image(inst.image_id)
                .map(|image| image.short_name().to_string())
                .unwrap_or_else(|_| inst.image_id.to_string());
            let location = inst
                .debug_info
                .as_ref()
                .map(|d| format!("{}:{}", d.file_name, d.line))
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(inst.id),
                Cell::new(image),
                Cell::new(format!("0x{:x}", inst.offset)),
                Cell::new(location),
            ]);
        }
        table.to_string()
    }

    /// iRoots with their resolved events.
    pub fn format_iroots(&self, catalog: &IRootDb, sinfo: &StaticInfo) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "Idiom", "Events"]));
        for iroot in catalog.iroots() {
            // Multi-line cell: one event per line.
            let events = catalog
                .describe_iroot(iroot.id, sinfo)
                .map(|text| {
                    text.lines()
                        .skip(1)
                        .map(str::trim)
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(iroot.id),
                Cell::new(iroot.idiom),
                Cell::new(events),
            ]);
        }
        table.to_string()
    }

    /// One row per targeted run, in run order
    pub fn format_test_history(&self, history: &TestHistory) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["iRoot", "Idiom", "Result", "Seed"]));
        for (entry, idiom) in history.entries() {
            let result = match (self.use_colors, entry.success) {
                (true, Some(true)) => Cell::new(entry.result_label()).fg(Color::Green),
                (true, Some(false)) => Cell::new(entry.result_label()).fg(Color::Red),
                _ => Cell::new(entry.result_label()),
            };
            table.add_row(vec![
                Cell::new(entry.iroot_id),
                Cell::new(idiom),
                result,
                Cell::new(entry.seed),
            ]);
        }
        table.to_string()
    }

    /// Per-idiom run and iRoot counts.
    pub fn format_test_history_summary(&self, summary: &TestHistorySummary) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "Idiom",
            "Tests",
            "Succ",
            "Fail",
            "Succ iRoots",
            "Fail iRoots",
        ]));
        for counts in &summary.per_idiom {
            table.add_row(vec![
                Cell::new(counts.idiom),
                Cell::new(counts.tests()),
                Cell::new(counts.success),
                Cell::new(counts.fail),
                Cell::new(counts.success_iroots),
                Cell::new(counts.fail_iroots),
            ]);
        }
        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn state_color(state: CampaignState) -> Color {
    match state {
        CampaignState::Converged => Color::Green,
        CampaignState::Fatal => Color::Red,
        CampaignState::Running => Color::Yellow,
        CampaignState::NotStarted => Color::Grey,
    }
}

/// Check if the terminal supports colors
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}
