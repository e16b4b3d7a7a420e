use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use foodcmp_core::{ItemResult, RunReport};

/// Errors shown per provider before the rest are elided.
const MAX_ERRORS_SHOWN: usize = 5;

/// Renders the terminal summary of a run.
pub(crate) fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_summary(&mut out, report);
    out
}

fn write_summary(out: &mut String, report: &RunReport) -> std::fmt::Result {
    writeln!(out, "Food deal comparison")?;
    writeln!(out, "====================")?;
    writeln!(
        out,
        "Searched: {}",
        report.search_request.food_items().join(", ")
    )?;
    writeln!(out, "Execution time: {:.2}s", report.execution_time_seconds)?;
    writeln!(
        out,
        "Providers available: {}/{}",
        report.available_providers(),
        report.provider_reports.len()
    )?;
    writeln!(out, "Total options: {}", report.total_options)?;
    writeln!(out)?;

    match &report.best_deal {
        Some(best) => {
            writeln!(out, "Best deal")?;
            writeln!(out, "  Provider:   {}", best.provider)?;
            writeln!(out, "  Restaurant: {}", best.restaurant_name)?;
            writeln!(out, "  Item:       {}", best.item_name)?;
            writeln!(out, "  Price:      {}", price_label(best))?;
            writeln!(out, "  Rating:     {}", rating_label(best.rating))?;
            if let Some(coupon) = &best.coupon_applied {
                writeln!(out, "  Coupon:     {coupon}")?;
            }
        }
        None => writeln!(out, "No item matched the filters.")?,
    }

    if report.total_options > 0 {
        writeln!(out)?;
        writeln!(
            out,
            "{:<10} {:<24} {:<28} {:>10} {:>6}",
            "PROVIDER", "RESTAURANT", "ITEM", "PRICE", "RATING"
        )?;
        for item in report.all_results() {
            writeln!(
                out,
                "{:<10} {:<24} {:<28} {:>10.2} {:>6}",
                item.provider.as_str(),
                truncate(&item.restaurant_name, 24),
                truncate(&item.item_name, 28),
                item.effective_price(),
                rating_label(item.rating)
            )?;
        }
    }

    if let Some(m) = &report.mutation {
        writeln!(out)?;
        writeln!(
            out,
            "Cart: {} on {} after {} attempt(s), {} rollback(s)",
            m.outcome, m.provider, m.attempts, m.rollbacks
        )?;
    }

    let failing: Vec<_> = report
        .provider_reports
        .iter()
        .filter(|r| !r.errors.is_empty())
        .collect();
    if !failing.is_empty() {
        writeln!(out)?;
        writeln!(out, "Errors")?;
        for r in failing {
            let status = if r.available { "" } else { " (unavailable)" };
            writeln!(out, "  {}{status}:", r.provider)?;
            for e in r.errors.iter().take(MAX_ERRORS_SHOWN) {
                writeln!(out, "    - {e}")?;
            }
            if r.errors.len() > MAX_ERRORS_SHOWN {
                writeln!(out, "    ... {} more", r.errors.len() - MAX_ERRORS_SHOWN)?;
            }
        }
    }
    Ok(())
}

fn price_label(item: &ItemResult) -> String {
    match (item.final_price, item.discount_percentage) {
        (Some(final_price), Some(pct)) if final_price < item.item_price => {
            format!("{final_price:.2} (was {:.2}, {pct:.0}% off)", item.item_price)
        }
        _ => format!("{:.2}", item.effective_price()),
    }
}

fn rating_label(rating: Option<f64>) -> String {
    rating.map_or_else(|| "-".to_owned(), |r| format!("{r:.1}"))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_owned();
    }
    let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Writes `report` as pretty JSON, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub(crate) fn save_report(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
