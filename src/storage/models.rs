use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-state patch value for partial updates that survives serialization round-trips.
/// Unlike `Option<Option<T>>`, each variant has a distinct wire representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Patch<T> {
    /// Field was not included in the request (no change).
    #[default]
    Absent,
    /// Field was explicitly set to null (clear it).
    Null,
    /// Field was set to a new value.
    Value(T),
}

impl<T> From<Option<Option<T>>> for Patch<T> {
    fn from(v: Option<Option<T>>) -> Self {
        match v {
            None => Patch::Absent,
            Some(None) => Patch::Null,
            Some(Some(v)) => Patch::Value(v),
        }
    }
}

impl<T: Clone> Patch<T> {
    /// Apply the patch to an optional field in place.
    pub fn apply_to(&self, field: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *field = None,
            Patch::Value(v) => *field = Some(v.clone()),
        }
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }
}

/// Where a file record sits in the trash lifecycle. Purged records no longer exist,
/// so only the two live states are representable on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Active,
    Trashed,
}

/// A file record stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    // System fields
    pub id: String,
    pub name: String,
    pub size: u64,
    /// Lower-cased extension of `name`, empty when there is none
    pub file_type: String,
    pub owner_email: String,
    pub storage_path: String,
    pub blob_ref: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parent_folder_id: Option<String>,

    // User-controlled flags
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_in_trash: bool,
    #[serde(default)]
    pub trashed_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn state(&self) -> LifecycleState {
        if self.is_in_trash {
            LifecycleState::Trashed
        } else {
            LifecycleState::Active
        }
    }
}

/// Extract the lower-cased extension used for icon and preview dispatch.
pub fn file_type_from_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// A folder record stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    pub owner_email: String,
    #[serde(default)]
    pub parent_folder_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a file record. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_folder_id: Patch<String>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub is_in_trash: Option<bool>,
    #[serde(default)]
    pub trashed_at: Patch<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Patch<DateTime<Utc>>,
}

impl FilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.parent_folder_id.is_absent()
            && self.is_favorite.is_none()
            && self.is_in_trash.is_none()
            && self.trashed_at.is_absent()
            && self.modified_at.is_absent()
    }

    pub fn apply_to(&self, file: &mut FileRecord) {
        if let Some(ref name) = self.name {
            file.name = name.clone();
        }
        self.parent_folder_id.apply_to(&mut file.parent_folder_id);
        if let Some(fav) = self.is_favorite {
            file.is_favorite = fav;
        }
        if let Some(trash) = self.is_in_trash {
            file.is_in_trash = trash;
        }
        self.trashed_at.apply_to(&mut file.trashed_at);
        self.modified_at.apply_to(&mut file.modified_at);
    }
}

/// Conjunction of equality predicates over the files collection.
/// `None` means "don't filter on this field".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileQuery {
    pub owner_email: Option<String>,
    /// `Some(None)` matches root-level files only
    pub parent_folder_id: Option<Option<String>>,
    pub is_in_trash: Option<bool>,
    pub is_favorite: Option<bool>,
}

impl FileQuery {
    pub fn owned_by(email: &str) -> Self {
        Self {
            owner_email: Some(email.to_string()),
            ..Default::default()
        }
    }

    pub fn in_folder(folder_id: &str) -> Self {
        Self {
            parent_folder_id: Some(Some(folder_id.to_string())),
            ..Default::default()
        }
    }

    pub fn trashed(mut self, in_trash: bool) -> Self {
        self.is_in_trash = Some(in_trash);
        self
    }

    pub fn matches(&self, file: &FileRecord) -> bool {
        self.owner_email
            .as_ref()
            .map_or(true, |e| *e == file.owner_email)
            && self
                .parent_folder_id
                .as_ref()
                .map_or(true, |p| *p == file.parent_folder_id)
            && self.is_in_trash.map_or(true, |t| t == file.is_in_trash)
            && self.is_favorite.map_or(true, |f| f == file.is_favorite)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderQuery {
    pub owner_email: Option<String>,
    pub parent_folder_id: Option<Option<String>>,
}

impl FolderQuery {
    pub fn children_of(folder_id: &str) -> Self {
        Self {
            owner_email: None,
            parent_folder_id: Some(Some(folder_id.to_string())),
        }
    }

    pub fn matches(&self, folder: &FolderRecord) -> bool {
        self.owner_email
            .as_ref()
            .map_or(true, |e| *e == folder.owner_email)
            && self
                .parent_folder_id
                .as_ref()
                .map_or(true, |p| *p == folder.parent_folder_id)
    }
}
