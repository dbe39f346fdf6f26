// Colored terminal output for analysis results.
//
// Renders the envelope for humans: a header per finding, the key evidence
// numbers, flags and the busiest parts of the graph. `--json` bypasses all
// of this and prints the envelope as-is.

use colored::Colorize;
use serde_json::Value;

use crate::report::{AnalysisResult, ErrorBody, Finding, Severity};

/// Display an analysis result.
pub fn display_result(result: &AnalysisResult) {
    if let Some(error) = &result.error {
        display_error(error);
        return;
    }

    for finding in &result.findings {
        display_finding(finding);
    }

    if let Some(risk) = result.artifact("risk_indicators") {
        display_risk(risk);
    }
    if let Some(graph) = result.artifact("relationship_graph") {
        display_graph(graph);
    }
    if let Some(linked) = result.artifact("linked_channels").and_then(Value::as_array) {
        display_linked(linked);
    }
    println!();
}

fn display_error(error: &ErrorBody) {
    println!(
        "\n{} {} ({})",
        "Error:".red().bold(),
        error.message,
        error.code.to_string().dimmed()
    );
    if let Some(secs) = error.retry_after_secs {
        println!("  Upstream asked to retry after {secs}s");
    }
}

fn display_finding(finding: &Finding) {
    println!(
        "\n{}",
        format!("=== {} ({}) ===", finding.kind, finding.provider).bold()
    );
    println!("  Severity: {}", colorize_severity(finding.severity));

    for (key, value) in &finding.evidence {
        println!("  {:<24} {}", format!("{key}:").dimmed(), render_value(value));
    }
}

fn display_risk(risk: &Value) {
    let score = risk["overall_risk_score"].as_u64().unwrap_or(0);
    println!("\n{}", "=== Risk ===".bold());
    println!("  Score: {}/100", colorize_score(score));

    let flags = risk["flags"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    for flag in flags {
        let severity = flag["severity"].as_str().unwrap_or("low");
        let marker = match severity {
            "high" => "!!".red().bold(),
            "medium" => "!".bright_red(),
            _ => "~".yellow(),
        };
        println!(
            "  {} {:<20} {}",
            marker,
            flag["type"].as_str().unwrap_or("?"),
            flag["detail"].as_str().unwrap_or("").dimmed()
        );
    }
}

fn display_graph(graph: &Value) {
    let edges = graph["edges"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    if edges.is_empty() {
        return;
    }
    println!("\n{}", format!("=== Relationships ({} edges) ===", edges.len()).bold());

    let mut ranked: Vec<&Value> = edges.iter().collect();
    ranked.sort_by_key(|e| std::cmp::Reverse(e["weight"].as_u64().unwrap_or(0)));
    for edge in ranked.into_iter().take(10) {
        println!(
            "  {:<14} {} -> {}  {}",
            edge["type"].as_str().unwrap_or("?"),
            edge["source"].as_str().unwrap_or("?"),
            edge["target"].as_str().unwrap_or("?"),
            format!("x{}", edge["weight"]).dimmed()
        );
    }
}

fn display_linked(linked: &[Value]) {
    if linked.is_empty() {
        return;
    }
    println!("\n{}", format!("=== Linked channels ({}) ===", linked.len()).bold());
    for channel in linked {
        println!("  {}", channel["url"].as_str().unwrap_or("?"));
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "-".dimmed().to_string(),
        Value::String(s) => super::truncate_chars(s, 80),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => super::truncate_chars(&other.to_string(), 80),
    }
}

fn colorize_severity(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::High => "high".red().bold(),
        Severity::Medium => "medium".bright_red(),
        Severity::Low => "low".yellow(),
        Severity::Info => "info".green(),
    }
}

/// Score bands for display only.
fn colorize_score(score: u64) -> colored::ColoredString {
    let text = score.to_string();
    match score {
        60.. => text.red().bold(),
        35..=59 => text.bright_red(),
        15..=34 => text.yellow(),
        _ => text.green(),
    }
}
