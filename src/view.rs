//! Filtering and sorting of the active file listing.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::storage::models::FileRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Modified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub favorites_only: bool,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

impl ViewSettings {
    /// Re-selecting the current key flips direction; a new key starts ascending.
    pub fn sort_by(&mut self, key: SortKey) {
        if self.sort == key {
            self.order = self.order.flipped();
        } else {
            self.sort = key;
            self.order = SortOrder::Asc;
        }
    }

    pub fn toggle_favorites_only(&mut self) {
        self.favorites_only = !self.favorites_only;
    }

    pub fn is_visible(&self, file: &FileRecord) -> bool {
        !file.is_in_trash
            && (!self.favorites_only || file.is_favorite)
            && file
                .name
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }

    /// Visible files in display order. The sort is stable.
    pub fn apply<'a, I>(&self, files: I) -> Vec<FileRecord>
    where
        I: IntoIterator<Item = &'a FileRecord>,
    {
        let mut visible: Vec<FileRecord> = files
            .into_iter()
            .filter(|f| self.is_visible(f))
            .cloned()
            .collect();

        visible.sort_by(|a, b| {
            let ord = compare(self.sort, a, b);
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        visible
    }
}

fn compare(key: SortKey, a: &FileRecord, b: &FileRecord) -> Ordering {
    match key {
        SortKey::Name => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
        SortKey::Size => a.size.cmp(&b.size),
        // Missing timestamps sort as the oldest
        SortKey::Modified => modified_millis(a).cmp(&modified_millis(b)),
    }
}

fn modified_millis(file: &FileRecord) -> i64 {
    file.modified_at.map_or(0, |t| t.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_file;
    use chrono::{TimeZone, Utc};

    fn names(files: &[FileRecord]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn favorites_and_search_compose() {
        let mut a = sample_file("1", "Q3 Report.pdf");
        a.is_favorite = true;
        let b = sample_file("2", "report-draft.docx");
        let mut c = sample_file("3", "annual REPORT.txt");
        c.is_favorite = true;
        let mut d = sample_file("4", "notes.txt");
        d.is_favorite = true;
        let mut e = sample_file("5", "old report.pdf");
        e.is_favorite = true;
        e.is_in_trash = true;
        e.trashed_at = Some(Utc::now());

        let view = ViewSettings {
            search: "report".to_string(),
            favorites_only: true,
            ..Default::default()
        };
        let shown = view.apply([&a, &b, &c, &d, &e]);
        assert_eq!(names(&shown), vec!["annual REPORT.txt", "Q3 Report.pdf"]);

        let mut desc = view.clone();
        desc.order = SortOrder::Desc;
        let shown = desc.apply([&a, &b, &c, &d, &e]);
        assert_eq!(names(&shown), vec!["Q3 Report.pdf", "annual REPORT.txt"]);
    }

    #[test]
    fn sort_by_same_key_toggles_direction() {
        let mut view = ViewSettings::default();
        view.sort_by(SortKey::Name);
        assert_eq!(view.order, SortOrder::Desc);
        view.sort_by(SortKey::Size);
        assert_eq!((view.sort, view.order), (SortKey::Size, SortOrder::Asc));
        view.sort_by(SortKey::Size);
        assert_eq!(view.order, SortOrder::Desc);
    }

    #[test]
    fn missing_modified_sorts_oldest() {
        let mut old = sample_file("1", "a.txt");
        old.modified_at = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let mut none = sample_file("2", "b.txt");
        none.modified_at = None;
        let mut new = sample_file("3", "c.txt");
        new.modified_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let view = ViewSettings {
            sort: SortKey::Modified,
            ..Default::default()
        };
        assert_eq!(
            names(&view.apply([&new, &old, &none])),
            vec!["b.txt", "a.txt", "c.txt"]
        );
    }

    #[test]
    fn size_ties_keep_prior_order() {
        let mut x = sample_file("1", "x.txt");
        x.size = 10;
        let mut y = sample_file("2", "y.txt");
        y.size = 10;
        let mut z = sample_file("3", "z.txt");
        z.size = 5;

        let view = ViewSettings {
            sort: SortKey::Size,
            ..Default::default()
        };
        assert_eq!(names(&view.apply([&y, &x, &z])), vec!["z.txt", "y.txt", "x.txt"]);
    }
}
