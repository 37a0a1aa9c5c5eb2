use redb::{ReadableTable, WriteTransaction};

use super::db::{Database, DatabaseError};
use super::models::{FileQuery, FilePatch, FileRecord};
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Store a file record and update the folder index
    pub fn put_file(&self, file: &FileRecord) -> Result<(), DatabaseError> {
        debug_assert!(!file.id.is_empty(), "file id must not be empty");

        let write_txn = self.begin_write()?;
        {
            // Replacing a record that moved folders must drop the stale index entry
            let previous_parent: Option<String> = {
                let table = write_txn.open_table(FILES)?;
                let result = match table.get(file.id.as_str())? {
                    Some(data) => {
                        let old: FileRecord = rmp_serde::from_slice(data.value())?;
                        old.parent_folder_id
                    }
                    None => None,
                };
                result
            };
            if previous_parent != file.parent_folder_id {
                if let Some(ref old) = previous_parent {
                    index_remove(&write_txn, old, &file.id)?;
                }
            }

            let mut table = write_txn.open_table(FILES)?;
            let data = rmp_serde::to_vec_named(file)?;
            table.insert(file.id.as_str(), data.as_slice())?;
            drop(table);

            if let Some(ref folder_id) = file.parent_folder_id {
                index_add(&write_txn, folder_id, &file.id)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a file by its UUID
    pub fn get_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(id)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Get all files directly inside a folder
    pub fn get_files_in_folder(&self, folder_id: &str) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(FOLDER_FILES)?;
        let files_table = read_txn.open_table(FILES)?;

        let file_ids: Vec<String> = match index.get(folder_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut files = Vec::new();
        for file_id in file_ids {
            if let Some(data) = files_table.get(file_id.as_str())? {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                files.push(file);
            }
        }

        Ok(files)
    }

    /// Delete a file by its UUID and clean up the folder index
    pub fn delete_file(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let parent: Option<Option<String>> = {
            let table = write_txn.open_table(FILES)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let file: FileRecord = rmp_serde::from_slice(data.value())?;
                    Some(file.parent_folder_id)
                }
                None => None,
            };
            result
        };

        let deleted = match parent {
            Some(parent_folder_id) => {
                {
                    let mut table = write_txn.open_table(FILES)?;
                    table.remove(id)?;
                }
                if let Some(ref folder_id) = parent_folder_id {
                    index_remove(&write_txn, folder_id, id)?;
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// Apply a partial update. Returns the updated record, or `None` if the file doesn't exist.
    pub fn update_file(
        &self,
        id: &str,
        patch: &FilePatch,
    ) -> Result<Option<FileRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(FILES)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let file: FileRecord = rmp_serde::from_slice(data.value())?;
                    Some(file)
                }
                None => None,
            };
            result
        };

        if patch.is_empty() {
            write_txn.abort()?;
            return Ok(existing);
        }

        let updated = match existing {
            Some(mut file) => {
                let old_parent = file.parent_folder_id.clone();
                patch.apply_to(&mut file);

                if old_parent != file.parent_folder_id {
                    if let Some(ref old) = old_parent {
                        index_remove(&write_txn, old, id)?;
                    }
                    if let Some(ref new) = file.parent_folder_id {
                        index_add(&write_txn, new, id)?;
                    }
                }

                let serialized = rmp_serde::to_vec_named(&file)?;
                let mut table = write_txn.open_table(FILES)?;
                table.insert(id, serialized.as_slice())?;
                Some(file)
            }
            None => None,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    pub fn get_all_files(&self) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        let mut files = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let file: FileRecord = rmp_serde::from_slice(value.value())?;
            files.push(file);
        }

        Ok(files)
    }

    /// Evaluate a predicate query, using the folder index when a folder is named
    pub fn query_files(&self, query: &FileQuery) -> Result<Vec<FileRecord>, DatabaseError> {
        let candidates = match query.parent_folder_id {
            Some(Some(ref folder_id)) => self.get_files_in_folder(folder_id)?,
            _ => self.get_all_files()?,
        };

        Ok(candidates
            .into_iter()
            .filter(|f| query.matches(f))
            .collect())
    }
}

fn index_add(txn: &WriteTransaction, folder_id: &str, file_id: &str) -> Result<(), DatabaseError> {
    let mut index = txn.open_table(FOLDER_FILES)?;
    let existing: Option<Vec<String>> = {
        let result = match index.get(folder_id)? {
            Some(data) => Some(rmp_serde::from_slice(data.value())?),
            None => None,
        };
        result
    };
    let mut file_ids = existing.unwrap_or_default();

    if !file_ids.iter().any(|fid| fid == file_id) {
        file_ids.push(file_id.to_string());
        let data = rmp_serde::to_vec_named(&file_ids)?;
        index.insert(folder_id, data.as_slice())?;
    }
    Ok(())
}

fn index_remove(
    txn: &WriteTransaction,
    folder_id: &str,
    file_id: &str,
) -> Result<(), DatabaseError> {
    let mut index = txn.open_table(FOLDER_FILES)?;
    let existing: Option<Vec<String>> = {
        let result = match index.get(folder_id)? {
            Some(data) => Some(rmp_serde::from_slice(data.value())?),
            None => None,
        };
        result
    };

    if let Some(mut ids) = existing {
        ids.retain(|fid| fid != file_id);
        if ids.is_empty() {
            index.remove(folder_id)?;
        } else {
            let data = rmp_serde::to_vec_named(&ids)?;
            index.insert(folder_id, data.as_slice())?;
        }
    }
    Ok(())
}
