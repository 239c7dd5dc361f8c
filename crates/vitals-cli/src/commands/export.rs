//! Export command implementation

use std::path::Path;

use anyhow::Result;
use vitals_core::export::EXPORT_FAILURE_MESSAGE;
use vitals_core::{normalize, Config, ExportPipeline, WizardPage};

use super::core::read_report;
use crate::render::ChartCapture;

/// Render pages of a saved report into a PDF in `output_dir`
pub async fn cmd_export(
    config: &Config,
    report_path: &Path,
    output_dir: &Path,
    page: &str,
    all: bool,
) -> Result<()> {
    let pages = if all {
        WizardPage::ALL.to_vec()
    } else {
        vec![page.parse::<WizardPage>().map_err(|e| anyhow::anyhow!(e))?]
    };

    let report = normalize(&read_report(report_path)?);
    let pipeline = ExportPipeline::from_config(&config.export);

    match pipeline.export_to(&ChartCapture, &pages, &report, output_dir).await {
        Ok(path) => {
            let names: Vec<&str> = pages.iter().map(|p| p.title()).collect();
            println!("📄 Exported {} to {}", names.join(", "), path.display());
            Ok(())
        }
        Err(e) => {
            println!("❌ {}", EXPORT_FAILURE_MESSAGE);
            Err(anyhow::anyhow!(e.user_message()))
        }
    }
}
