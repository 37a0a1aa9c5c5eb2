//! Storage usage figures for the dashboard.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::storage::models::FileRecord;

/// How many trailing months the monthly series keeps.
const MONTHS_SHOWN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pdf,
    Image,
    Document,
    Video,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Pdf,
        Category::Image,
        Category::Document,
        Category::Video,
        Category::Other,
    ];

    pub fn from_file_type(file_type: &str) -> Self {
        match file_type {
            "pdf" => Category::Pdf,
            "jpg" | "jpeg" | "png" | "gif" | "svg" => Category::Image,
            "doc" | "docx" | "txt" | "rtf" => Category::Document,
            "mp4" | "mov" | "avi" | "mkv" => Category::Video,
            _ => Category::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub count: u64,
    pub bytes: u64,
}

impl Usage {
    fn add(&mut self, size: u64) {
        self.count += 1;
        self.bytes += size;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageStats {
    pub total_bytes: u64,
    pub total_formatted: String,
    pub quota_bytes: u64,
    pub quota_formatted: String,
    pub usage_percent: f64,
    pub folder_count: u64,
    pub by_category: BTreeMap<Category, Usage>,
    /// Keyed by file extension; files without one are counted under `other`
    pub by_type: BTreeMap<String, Usage>,
    /// `(YYYY-MM, bytes)` for the most recent months, oldest first
    pub by_month: Vec<(String, u64)>,
}

impl StorageStats {
    /// Aggregate every file of an owner, trashed ones included since they still use space.
    pub fn compute(files: &[FileRecord], folder_count: u64, quota_bytes: u64) -> Self {
        let mut by_category: BTreeMap<Category, Usage> =
            Category::ALL.iter().map(|c| (*c, Usage::default())).collect();
        let mut by_type: BTreeMap<String, Usage> = BTreeMap::new();
        let mut by_month: BTreeMap<String, u64> = BTreeMap::new();
        let mut total_bytes = 0u64;

        for file in files {
            total_bytes += file.size;
            by_category
                .entry(Category::from_file_type(&file.file_type))
                .or_default()
                .add(file.size);

            let type_key = if file.file_type.is_empty() {
                "other".to_string()
            } else {
                file.file_type.clone()
            };
            by_type.entry(type_key).or_default().add(file.size);

            if let Some(modified) = file.modified_at {
                *by_month
                    .entry(modified.format("%Y-%m").to_string())
                    .or_default() += file.size;
            }
        }

        let skip = by_month.len().saturating_sub(MONTHS_SHOWN);
        let by_month = by_month.into_iter().skip(skip).collect();

        let usage_percent = if quota_bytes == 0 {
            0.0
        } else {
            total_bytes as f64 / quota_bytes as f64 * 100.0
        };

        StorageStats {
            total_bytes,
            total_formatted: format_size(total_bytes),
            quota_bytes,
            quota_formatted: format_size(quota_bytes),
            usage_percent,
            folder_count,
            by_category,
            by_type,
            by_month,
        }
    }
}

/// Human-readable size in base-1024 units, up to GB, with at most two decimals.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
