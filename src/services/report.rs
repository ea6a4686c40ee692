use std::path::Path;

use crate::error::AppError;
use crate::models::AnalysisResult;
use crate::services::interpret;

pub const REPORT_TITLE: &str = "InsightGenie Analysis Report";

/// Assembles the full plain-text report: title, then each statistics table
/// followed by its interpretation, in fixed order.
pub fn render_report(analysis: &AnalysisResult) -> String {
    let mut report = String::new();
    report.push_str(REPORT_TITLE);
    report.push('\n');
    report.push_str("\nDescriptive Statistics:\n");
    report.push_str(&analysis.descriptive.to_string());
    report.push_str("\nInterpretation of Descriptive Statistics:\n");
    report.push_str(&interpret::descriptive_interpretation(&analysis.descriptive));
    report.push_str("\n\nMarket Matrix (Correlation):\n");
    report.push_str(&analysis.correlation.to_string());
    report.push_str("\nInterpretation of Market Matrix:\n");
    report.push_str(&interpret::correlation_interpretation(&analysis.correlation));
    report.push_str("\n\nGrowth Trends:\n");
    report.push_str(&analysis.growth.to_string());
    report.push_str("\nInterpretation of Growth Trends:\n");
    report.push_str(&interpret::growth_interpretation(&analysis.growth));
    report
}

pub async fn write_report(analysis: &AnalysisResult, path: &Path) -> Result<(), AppError> {
    tokio::fs::write(path, render_report(analysis)).await?;
    Ok(())
}
