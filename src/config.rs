use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;

/// Fixed artifact filenames inside the report directory. Every upload
/// overwrites the previous run's files; the download routes reference
/// these names directly.
pub const REPORT_FILE: &str = "report.txt";
pub const PIE_CHART_FILE: &str = "pie_chart.png";
pub const BAR_CHART_FILE: &str = "bar_chart.png";
pub const TREND_CHART_FILE: &str = "trend_analysis.png";

#[derive(Debug, Clone)]
pub struct Config {
    pub upload_dir: PathBuf,
    pub report_dir: PathBuf,
    pub max_file_size: usize,
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let upload_dir = std::env::var("UPLOAD_DIR")
            .unwrap_or_else(|_| "uploads".to_string())
            .into();
        let report_dir = std::env::var("REPORT_DIR")
            .unwrap_or_else(|_| "reports".to_string())
            .into();

        Ok(Config {
            upload_dir,
            report_dir,
            max_file_size: 10 * 1024 * 1024, // 10MB
        })
    }

    pub async fn ensure_directories(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::create_dir_all(&self.report_dir).await?;
        Ok(())
    }
}
