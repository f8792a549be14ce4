use crate::error::Result;
use crate::types::{RawPricingLine, TaskResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// `task_3_data.json` for the third reported result.
pub fn export_file_name(position: usize) -> String {
    format!("task_{}_data.json", position)
}

/// Pretty JSON array of `{dateTime, description, price}` objects.
pub fn task_data_json(lines: &[RawPricingLine]) -> Result<String> {
    Ok(serde_json::to_string_pretty(lines)?)
}

/// Writes one file per successful result into `dir`, numbered by position
/// in `results` starting at 1. Failed results produce no file.
pub fn write_task_exports(dir: &Path, results: &[TaskResult]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (i, result) in results.iter().enumerate() {
        if !result.success {
            continue;
        }
        let path = dir.join(export_file_name(i + 1));
        fs::write(&path, task_data_json(&result.rows)?)?;
        written.push(path);
    }
    info!("💾 Wrote {} task exports to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScraperError;
    use crate::types::{ExtractionTask, ShowListing};
    use serde_json::json;
    use tempfile::tempdir;

    fn task(id: usize) -> ExtractionTask {
        let show = ShowListing {
            title: "Wicked".into(),
            detail_url: "https://www.broadwayinbound.com/wicked".into(),
            first_performance: String::new(),
            on_sale_through: String::new(),
        };
        ExtractionTask::new(id, show, "03/08/2026", "")
    }

    #[test]
    fn test_task_data_json_field_names() {
        let lines = vec![RawPricingLine::new("SUNDAY, 3/8/2026 6:30PM", "Orchestra", "$199.00")];
        let value: serde_json::Value = serde_json::from_str(&task_data_json(&lines).unwrap()).unwrap();
        assert_eq!(
            value,
            json!([{"dateTime": "SUNDAY, 3/8/2026 6:30PM", "description": "Orchestra", "price": "$199.00"}])
        );
    }

    #[test]
    fn test_only_successful_results_are_written() {
        let dir = tempdir().unwrap();
        let results = vec![
            TaskResult::succeeded(
                task(0),
                vec![RawPricingLine::new("SUNDAY, 3/8/2026 6:30PM", "Orchestra", "$199.00")],
            ),
            TaskResult::failed(task(1), &ScraperError::NoRowsFound),
            TaskResult::succeeded(
                task(2),
                vec![RawPricingLine::new("SUNDAY, 3/8/2026 1:00PM", "Balcony", "$79.00")],
            ),
        ];
        let written = write_task_exports(dir.path(), &results).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["task_1_data.json", "task_3_data.json"]);
    }
}
