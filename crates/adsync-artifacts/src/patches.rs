//! Per-publisher patch files: the lines a publisher must add to match the
//! master. The text is valid input for `adsync merge --add`.

use adsync_reconcile::{PublisherStatus, ReconciliationResult};

/// `studio-a.example` -> `studio-a_example_missing.txt`
pub fn patch_file_name(domain: &str) -> String {
    let stem: String = domain
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}_missing.txt")
}

/// Patch text for a reconciled publisher; `None` when the publisher was
/// never reconciled (unreachable or unparsable).
pub fn render_patch(domain: &str, result: &ReconciliationResult) -> Option<String> {
    match result.status {
        PublisherStatus::Unreachable | PublisherStatus::ParseError => None,
        PublisherStatus::Ok | PublisherStatus::MissingRecords => {
            let mut out = String::new();
            if result.missing.is_empty() {
                out.push_str(&format!("# {domain}: no missing lines, already in sync.\n"));
            } else {
                out.push_str(&format!(
                    "# Lines to ADD to {domain}'s app-ads.txt to match master\n"
                ));
                for r in &result.missing {
                    out.push_str(&r.serialize());
                    out.push('\n');
                }
            }
            Some(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsync_reconcile::{reconcile_failure, reconcile_text, FetchFailure};
    use adsync_records::MasterList;

    #[test]
    fn file_name_replaces_dots() {
        assert_eq!(patch_file_name("studio-a.example"), "studio-a_example_missing.txt");
        assert_eq!(patch_file_name("a.b/c"), "a_b_c_missing.txt");
    }

    #[test]
    fn patch_lists_missing_in_canonical_form() {
        let m = MasterList::from_text("b.com, 2, RESELLER, cc\na.com, 1, DIRECT\n").unwrap();
        let r = reconcile_text(&m, "a.com, 1, DIRECT\n");
        let text = render_patch("pub.example", &r).unwrap();
        assert_eq!(
            text,
            "# Lines to ADD to pub.example's app-ads.txt to match master\nb.com, 2, RESELLER, cc\n"
        );
    }

    #[test]
    fn unreachable_gets_no_patch() {
        let r = reconcile_failure(FetchFailure::Connection {
            message: "refused".to_string(),
        });
        assert!(render_patch("down.example", &r).is_none());
    }
}
