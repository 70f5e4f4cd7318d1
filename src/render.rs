// =============================================================================
// Presentation
// =============================================================================
//
// Text (CLI) and HTML (index page) renderings of analyses and scan reports.
// This is the only place values are rounded: money to 2 decimals, indicators
// to 2 decimals, percentages to 2 decimals.  Undefined values print as "n/a".
// =============================================================================

use std::fmt::Write as _;

use crate::recommendation::{Analysis, Recommendation};
use crate::scanner::{ScanReport, ScanStatus};

fn money(v: f64) -> String {
    format!("${v:.2}")
}

fn opt_money(v: Option<f64>) -> String {
    v.map(money).unwrap_or_else(|| "n/a".into())
}

fn opt_num(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "n/a".into())
}

fn opt_volume(v: Option<u64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "n/a".into())
}

fn opt_market_cap(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.0}")).unwrap_or_else(|| "n/a".into())
}

/// Minimal escaping for text interpolated into HTML.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// (label, value) rows shared by the text and HTML renderings.
fn analysis_rows(a: &Analysis) -> Vec<(&'static str, String)> {
    let q = &a.quote;
    let mut rows = vec![
        ("Ticker", a.ticker.clone()),
        ("Current Price", money(q.price())),
        ("Day High", opt_money(q.day_high())),
        ("Day Low", opt_money(q.day_low())),
        ("52-Week High", opt_money(q.fifty_two_week_high())),
        ("52-Week Low", opt_money(q.fifty_two_week_low())),
        ("Market Cap", opt_market_cap(q.market_cap())),
        ("Volume", opt_volume(q.volume())),
        ("SMA", opt_num(a.indicators.sma)),
        ("EMA", opt_num(a.indicators.ema)),
        ("ATR (Volatility)", opt_num(a.indicators.atr)),
        ("RSI", opt_num(a.indicators.rsi)),
        ("Trend", a.trend.to_string()),
        ("Signal", a.signal.to_string()),
        ("Target Price", opt_money(a.target_price)),
    ];
    if let (Some(profit), Some(pct)) = (a.potential_profit, a.potential_profit_pct) {
        rows.push(("Potential Profit", format!("{} per share ({pct:.2}%)", money(profit))));
    }
    if let Some(below) = a.buy_below {
        rows.push(("Buy Below", money(below)));
    }
    rows.push(("Take Profit", money(a.exit_plan.take_profit)));
    rows.push(("Stop Loss", money(a.exit_plan.stop_loss)));
    rows
}

// =============================================================================
// Text
// =============================================================================

pub fn analysis_text(a: &Analysis) -> String {
    let mut out = String::new();
    for (label, value) in analysis_rows(a) {
        let _ = writeln!(out, "{label:<18} {value}");
    }
    let _ = writeln!(out, "\n{}", a.rationale);
    out
}

pub fn recommendation_text(r: &Recommendation) -> String {
    format!(
        "=== Recommended Stock to Trade ===\n{}",
        analysis_text(&r.analysis)
    )
}

pub fn report_text(report: &ScanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "scan {} ({}): {} evaluated, {} skipped",
        report.id,
        report.policy,
        report.evaluated,
        report.skipped.len()
    );

    match (&report.best, report.status) {
        (Some(best), _) => out.push_str(&recommendation_text(best)),
        (None, ScanStatus::ProviderOutage) => {
            let _ = writeln!(out, "Market data provider unavailable; no ticker could be evaluated.");
        }
        (None, _) => {
            let _ = writeln!(out, "No eligible recommendation found.");
        }
    }

    for skip in &report.skipped {
        let _ = writeln!(out, "  skipped {}: {}", skip.ticker, skip.error);
    }
    out
}

// =============================================================================
// HTML
// =============================================================================

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{body}</body></html>\n",
        title = escape(title),
    )
}

fn analysis_html(a: &Analysis) -> String {
    let mut body = String::new();
    for (label, value) in analysis_rows(a) {
        let _ = writeln!(body, "<p><strong>{label}:</strong> {}</p>", escape(&value));
    }
    let _ = writeln!(body, "<h2>Decision Summary</h2>\n<p>{}</p>", escape(&a.rationale));
    body
}

/// Standalone page for a single-ticker analysis.
pub fn analysis_page(a: &Analysis) -> String {
    let body = format!("<h1>Stock Analysis: {}</h1>\n{}", escape(&a.ticker), analysis_html(a));
    page(&format!("{} analysis", a.ticker), &body)
}

/// Minimal page carrying one message, for HTML error responses.
pub fn error_page(message: &str) -> String {
    let body = format!("<h1>Signal Scout</h1>\n<p>{}</p>\n", escape(message));
    page("Signal Scout", &body)
}

/// Index page: the cached scan, or a placeholder before the first scan.
pub fn index_page(report: Option<&ScanReport>) -> String {
    let mut body = String::from("<h1>Signal Scout</h1>\n");

    match report {
        None => body.push_str("<p>No scan has completed yet. Check back shortly.</p>\n"),
        Some(r) => {
            let _ = writeln!(
                body,
                "<p>Last scan finished {} ({} evaluated, {} skipped).</p>",
                r.finished_at.to_rfc3339(),
                r.evaluated,
                r.skipped.len()
            );
            match &r.best {
                Some(best) => {
                    body.push_str("<h2>Recommended Stock</h2>\n");
                    body.push_str(&analysis_html(&best.analysis));
                }
                None => {
                    let _ = writeln!(body, "<p>{}</p>", escape(&r.status.to_string()));
                }
            }
        }
    }

    page("Signal Scout", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::bar::series_from_closes;
    use crate::market_data::Quote;
    use crate::recommendation::{analyze, build};
    use crate::runtime_config::EngineConfig;
    use crate::types::ScanPolicy;
    use chrono::Utc;
    use uuid::Uuid;

    fn falling_analysis() -> Analysis {
        let closes: Vec<f64> = (1..=20).rev().map(|x| x as f64).collect();
        let series = series_from_closes("ABC", &closes);
        let quote = Quote::new("ABC", 1.0).unwrap().with_volume(Some(1_234));
        analyze("ABC", &quote, &series, &EngineConfig::default())
    }

    fn report(best: Option<Recommendation>, status: ScanStatus) -> ScanReport {
        ScanReport {
            id: Uuid::nil(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            policy: ScanPolicy::FirstEligible,
            evaluated: 3,
            skipped: vec![],
            outcomes: vec![],
            best,
            status,
        }
    }

    #[test]
    fn text_rounds_to_two_decimals() {
        let text = analysis_text(&falling_analysis());
        assert!(text.contains("Current Price      $1.00"));
        assert!(text.contains("RSI                0.00"));
        assert!(text.contains("Volume             1234"));
        assert!(text.contains("Day High           n/a"));
        assert!(text.contains("Buy Below"));
    }

    #[test]
    fn no_eligible_is_distinct_from_outage() {
        let none = report_text(&report(None, ScanStatus::NoEligible));
        let outage = report_text(&report(None, ScanStatus::ProviderOutage));
        assert!(none.contains("No eligible recommendation found."));
        assert!(outage.contains("provider unavailable"));
        assert_ne!(none, outage);
    }

    #[test]
    fn report_text_includes_best_pick() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64 * 0.25).collect();
        let series = series_from_closes("ABC", &closes);
        let quote = Quote::new("ABC", 1.0).unwrap();
        let rec = build("ABC", Some(&quote), &series, &EngineConfig::default()).unwrap();

        let text = report_text(&report(Some(rec), ScanStatus::Recommended));
        assert!(text.contains("=== Recommended Stock to Trade ==="));
        assert!(text.contains("Ticker             ABC"));
    }

    #[test]
    fn index_page_before_first_scan() {
        let html = index_page(None);
        assert!(html.contains("No scan has completed yet"));
    }

    #[test]
    fn html_escapes_interpolated_text() {
        assert_eq!(escape("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
        let html = analysis_page(&falling_analysis());
        assert!(html.contains("<strong>Signal:</strong> Buy (Oversold)"));

        let html = error_page("bad <ticker>");
        assert!(html.contains("bad &lt;ticker&gt;"));
    }
}
