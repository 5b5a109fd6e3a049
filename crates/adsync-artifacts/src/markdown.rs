//! Markdown rendering of check and update reports.

use adsync_reconcile::{Publisher, Report};
use adsync_records::MasterChange;

use crate::UpdateReport;

/// Render a check report. `roster` supplies display names and notes;
/// publishers not in it are shown by domain.
pub fn render_report_markdown(report: &Report, roster: &[Publisher]) -> String {
    let mut md = String::new();
    let s = &report.summary;

    md.push_str("# app-ads.txt Compliance Report\n\n");
    md.push_str(&format!(
        "_Generated: {}_\n\n",
        report.generated_at.format("%Y-%m-%dT%H:%M:%SZ")
    ));
    md.push_str(&format!("- Publishers checked: **{}**\n", s.total));
    md.push_str(&format!("- In sync: **{}**\n", s.ok));
    md.push_str(&format!("- Missing records: **{}**\n", s.missing_records));
    md.push_str(&format!("- Unreachable: **{}**\n", s.unreachable));
    md.push_str(&format!("- Parse errors: **{}**\n", s.parse_error));
    md.push_str(&format!(
        "- Master records: **{}**\n\n",
        report.master_record_count
    ));

    md.push_str("| Publisher | Domain | Status | Current lines | Missing | Conflicts | URL | Notes |\n");
    md.push_str("|---|---|---|---:|---:|---:|---|---|\n");
    for (domain, r) in &report.publishers {
        let (name, notes) = display_name(roster, domain);
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            cell(name),
            cell(domain),
            r.status,
            r.publisher_record_count,
            r.missing.len(),
            r.conflicts.len(),
            cell(r.source_url.as_deref().unwrap_or("-")),
            cell(notes),
        ));
    }
    md.push('\n');

    md.push_str("## Master\n\n");
    render_master_change(&mut md, &report.master);

    md.push_str("## Details\n\n");
    for (domain, r) in &report.publishers {
        let (name, _) = display_name(roster, domain);
        md.push_str(&format!("### {name} ({domain}) - {}\n\n", r.status));
        md.push_str(&format!(
            "- URL: {}\n",
            r.source_url.as_deref().unwrap_or("-")
        ));
        if let Some(failure) = &r.failure_reason {
            md.push_str(&format!("- Failure: {failure}\n\n"));
            continue;
        }
        md.push('\n');

        record_list(&mut md, "Missing lines to add", r.missing.iter().map(|x| x.serialize()));
        record_list(
            &mut md,
            "Relationship conflicts",
            r.conflicts.iter().map(|c| c.to_string()),
        );
        record_list(
            &mut md,
            "Extra lines present (not in master)",
            r.extra.iter().map(|x| x.serialize()),
        );
        if !r.malformed.is_empty() {
            md.push_str("**Unparsable lines:**\n");
            for m in &r.malformed {
                md.push_str(&format!("- line {}: `{}` ({})\n", m.line_no, m.text.trim(), m.reason));
            }
            md.push('\n');
        }
    }

    md
}

/// Render a master update report.
pub fn render_update_markdown(report: &UpdateReport) -> String {
    let mut md = String::new();
    md.push_str("# Master Update Report\n\n");
    md.push_str(&format!(
        "_Generated: {}_\n\n",
        report.generated_at.format("%Y-%m-%dT%H:%M:%SZ")
    ));
    if report.dry_run {
        md.push_str("> Dry run: the master file was not written.\n\n");
    }
    md.push_str(&format!("- Master: `{}`\n", report.master_path));
    md.push_str(&format!(
        "- Records: **{}** -> **{}**\n",
        report.records_before, report.records_after
    ));
    md.push_str(&format!(
        "- Partner files: {}\n\n",
        if report.partner_files.is_empty() {
            "none".to_string()
        } else {
            report
                .partner_files
                .iter()
                .map(|f| format!("`{f}`"))
                .collect::<Vec<_>>()
                .join(", ")
        }
    ));

    render_master_change(&mut md, &report.change);

    if !report.change.already_present.is_empty() {
        md.push_str(&format!(
            "**Already present:** {} line(s)\n\n",
            report.change.already_present.len()
        ));
    }
    if !report.change.invalid.is_empty() {
        md.push_str("**Invalid partner lines:**\n");
        for l in &report.change.invalid {
            md.push_str(&format!(
                "- {}:{}: `{}` ({})\n",
                l.source,
                l.line_no,
                l.text.trim(),
                l.reason
            ));
        }
        md.push('\n');
    }
    md
}

fn render_master_change(md: &mut String, change: &MasterChange) {
    if change.is_empty() {
        md.push_str("No changes to the master list.\n\n");
        return;
    }
    record_list(md, "Added", change.added.iter().map(|r| r.serialize()));
    record_list(
        md,
        "Removed as duplicates",
        change.deduped_away.iter().map(|r| r.serialize()),
    );
    if !change.reformatted.is_empty() {
        md.push_str(&format!(
            "**Reformatted:** {} line(s)\n\n",
            change.reformatted.len()
        ));
    }
    record_list(
        md,
        "Certification conflicts",
        change.cert_conflicts.iter().map(|c| c.to_string()),
    );
}

fn record_list<I>(md: &mut String, title: &str, lines: I)
where
    I: IntoIterator<Item = String>,
{
    let lines: Vec<String> = lines.into_iter().collect();
    if lines.is_empty() {
        return;
    }
    md.push_str(&format!("**{title}:**\n"));
    for line in lines {
        md.push_str(&format!("- `{line}`\n"));
    }
    md.push('\n');
}

fn display_name<'a>(roster: &'a [Publisher], domain: &'a str) -> (&'a str, &'a str) {
    match roster.iter().find(|p| p.domain == domain) {
        Some(p) => (p.name.as_str(), p.notes.as_str()),
        None => (domain, ""),
    }
}

/// Table cells cannot contain raw pipes or newlines.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsync_reconcile::{reconcile_failure, reconcile_text, FetchFailure};
    use adsync_records::MasterList;
    use chrono::{TimeZone, Utc};

    #[test]
    fn report_lists_every_publisher() {
        let m = MasterList::from_text("a.com, 1, DIRECT\nb.com, 2, RESELLER\n").unwrap();
        let mut report = Report::new(&m, Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap());
        report.insert("ok.example", reconcile_text(&m, "a.com, 1, DIRECT\nb.com, 2, RESELLER\n"));
        report.insert("gap.example", reconcile_text(&m, "a.com, 1, RESELLER\n"));
        report.insert(
            "down.example",
            reconcile_failure(FetchFailure::Timeout {
                message: "20s elapsed".to_string(),
            }),
        );
        let roster = vec![Publisher::new("gap.example").with_name("Gap | Studio")];

        let md = render_report_markdown(&report, &roster);
        assert!(md.contains("_Generated: 2026-05-01T12:00:00Z_"));
        assert!(md.contains("- Publishers checked: **3**"));
        assert!(md.contains("| Gap \\| Studio | gap.example | MISSING_RECORDS |"));
        assert!(md.contains("### down.example (down.example) - UNREACHABLE"));
        assert!(md.contains("- Failure: timeout: 20s elapsed"));
        assert!(md.contains("- `b.com, 2, RESELLER`"));
        assert!(md.contains("master 'a.com, 1, DIRECT' vs publisher 'a.com, 1, RESELLER'"));
        assert!(md.contains("No changes to the master list."));
    }
}
