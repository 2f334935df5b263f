//! Markdown report assembly.
//!
//! The document is a pure function of the analysis, so two runs over the
//! same file produce byte-identical output.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};
use crate::pipeline::AnalysisRun;
use crate::render::RenderOutcome;
use crate::summary::ColumnSummary;

/// Two decimals, with pandas-style spellings for undefined values.
fn num(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let s = format!("{v:.2}");
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}

/// Make `text` safe inside a pipe table cell or an emphasised bullet.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace('*', "\\*")
        .replace(['\r', '\n'], " ")
}

fn table_row(out: &mut String, cells: &[String]) {
    let _ = writeln!(out, "| {} |", cells.join(" | "));
}

fn table_header(out: &mut String, headers: &[&str], numeric_from: usize) {
    let _ = writeln!(out, "| {} |", headers.join(" | "));
    let rule: Vec<&str> = (0..headers.len())
        .map(|i| if i >= numeric_from { "---:" } else { "---" })
        .collect();
    let _ = writeln!(out, "|{}|", rule.join("|"));
}

/// Build the full report for `analysis`, embedding the rendered charts in
/// order and listing any that failed.
pub fn render_markdown(analysis: &AnalysisRun, rendered: &RenderOutcome) -> String {
    let mut out = String::new();
    overview(&mut out, analysis);
    summary_statistics(&mut out, analysis);
    missing_values(&mut out, analysis);
    correlation(&mut out, analysis);
    key_insights(&mut out, analysis);
    visualizations(&mut out, rendered);
    outliers(&mut out, analysis);
    out
}

fn overview(out: &mut String, analysis: &AnalysisRun) {
    let _ = writeln!(out, "# Dataset Analysis: {}\n", analysis.dataset_name);
    let _ = writeln!(out, "## Overview\n");
    let _ = writeln!(out, "- Rows loaded: {}", analysis.rows_loaded);
    let _ = writeln!(out, "- Rows after cleaning: {}", analysis.rows_after_cleaning());
    let _ = writeln!(out, "- Columns: {}\n", analysis.columns.len());

    if !analysis.columns.is_empty() {
        table_header(out, &["Column", "Kind"], 2);
        for (name, kind) in &analysis.columns {
            table_row(out, &[cell(name), kind.to_string()]);
        }
        out.push('\n');
    }
}

fn summary_statistics(out: &mut String, analysis: &AnalysisRun) {
    let _ = writeln!(out, "## Summary Statistics\n");

    let numeric: Vec<_> = analysis
        .summaries
        .iter()
        .filter_map(|s| match s {
            ColumnSummary::Numeric(n) => Some(n),
            ColumnSummary::NonNumeric(_) => None,
        })
        .collect();
    if numeric.is_empty() {
        let _ = writeln!(out, "No numeric columns.\n");
    } else {
        table_header(
            out,
            &[
                "Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max", "skewness",
                "kurtosis",
            ],
            1,
        );
        for s in numeric {
            table_row(
                out,
                &[
                    cell(&s.name),
                    s.count.to_string(),
                    num(s.mean),
                    num(s.std),
                    num(s.min),
                    num(s.q1),
                    num(s.median),
                    num(s.q3),
                    num(s.max),
                    num(s.skewness),
                    num(s.kurtosis),
                ],
            );
        }
        out.push('\n');
    }

    let other: Vec<_> = analysis
        .summaries
        .iter()
        .filter_map(|s| match s {
            ColumnSummary::NonNumeric(n) => Some(n),
            ColumnSummary::Numeric(_) => None,
        })
        .collect();
    if !other.is_empty() {
        let _ = writeln!(out, "### Non-numeric Columns\n");
        table_header(out, &["Column", "kind", "count", "unique", "top", "freq"], 2);
        for s in other {
            table_row(
                out,
                &[
                    cell(&s.name),
                    s.kind.to_string(),
                    s.count.to_string(),
                    s.unique.to_string(),
                    s.top.as_deref().map(cell).unwrap_or_default(),
                    s.freq.to_string(),
                ],
            );
        }
        out.push('\n');
    }
}

fn missing_values(out: &mut String, analysis: &AnalysisRun) {
    let _ = writeln!(out, "## Missing Values\n");
    table_header(out, &["Column", "Missing"], 1);
    for (name, count) in analysis.missing.entries() {
        table_row(out, &[cell(name), count.to_string()]);
    }
    out.push('\n');
}

fn correlation(out: &mut String, analysis: &AnalysisRun) {
    let _ = writeln!(out, "## Correlation Matrix\n");
    let matrix = &analysis.correlation;
    if matrix.is_empty() {
        let _ = writeln!(out, "No numeric columns.\n");
        return;
    }
    let names: Vec<String> = matrix.columns.iter().map(|c| cell(c)).collect();
    let mut headers: Vec<&str> = vec![""];
    headers.extend(names.iter().map(String::as_str));
    table_header(out, &headers, 1);
    for (i, name) in names.iter().enumerate() {
        let mut row = vec![name.clone()];
        row.extend(matrix.row(i).iter().map(|&r| num(r)));
        table_row(out, &row);
    }
    out.push('\n');
}

fn key_insights(out: &mut String, analysis: &AnalysisRun) {
    let _ = writeln!(out, "## Key Insights\n");
    let mut any = false;
    for summary in &analysis.summaries {
        if let ColumnSummary::Numeric(s) = summary {
            any = true;
            let _ = writeln!(
                out,
                "- **{}:** Mean = {}, Std Dev = {}, Skewness = {}, Kurtosis = {}",
                cell(&s.name),
                num(s.mean),
                num(s.std),
                num(s.skewness),
                num(s.kurtosis)
            );
        }
    }
    if !any {
        let _ = writeln!(out, "No numeric columns to describe.");
    }
    out.push('\n');
}

fn visualizations(out: &mut String, rendered: &RenderOutcome) {
    let _ = writeln!(out, "## Visualizations\n");
    if rendered.charts.is_empty() && rendered.failures.is_empty() {
        let _ = writeln!(out, "No charts were produced.\n");
        return;
    }
    for chart in &rendered.charts {
        // charts sit next to the report
        let link = chart
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| chart.kind.file_name());
        let _ = writeln!(out, "![{}]({link})\n", chart.kind);
    }
    if !rendered.failures.is_empty() {
        let _ = writeln!(out, "Not rendered:\n");
        for failure in &rendered.failures {
            let _ = writeln!(out, "- {}: {}", failure.kind, cell(&failure.message));
        }
        out.push('\n');
    }
}

fn outliers(out: &mut String, analysis: &AnalysisRun) {
    let _ = writeln!(out, "## Outliers\n");
    if analysis.outliers.is_empty() {
        let _ = writeln!(out, "No numeric columns.");
        return;
    }
    let header = format!("Values with z > {}", analysis.outlier_threshold);
    table_header(out, &["Column", header.as_str()], 1);
    for (name, count) in analysis.outliers.entries() {
        table_row(out, &[cell(name), count.to_string()]);
    }
}

/// Write `markdown` to `dir/file_name`, replacing any previous report.
pub fn write_report(dir: &Path, file_name: &str, markdown: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    fs::write(&path, markdown).map_err(|e| AnalysisError::write(&path, e))?;
    Ok(path)
}
