use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{FolderQuery, FolderRecord};
use super::tables::*;

impl Database {
    // ========================================================================
    // Folder operations
    // ========================================================================

    pub fn put_folder(&self, folder: &FolderRecord) -> Result<(), DatabaseError> {
        debug_assert!(!folder.id.is_empty(), "folder id must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(FOLDERS)?;
            let data = rmp_serde::to_vec_named(folder)?;
            table.insert(folder.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_folder(&self, id: &str) -> Result<Option<FolderRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FOLDERS)?;

        match table.get(id)? {
            Some(data) => {
                let folder: FolderRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(folder))
            }
            None => Ok(None),
        }
    }

    /// Delete a single folder record. Contents are not touched.
    pub fn delete_folder(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(FOLDERS)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    pub fn query_folders(&self, query: &FolderQuery) -> Result<Vec<FolderRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FOLDERS)?;

        let mut folders = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let folder: FolderRecord = rmp_serde::from_slice(value.value())?;
            if query.matches(&folder) {
                folders.push(folder);
            }
        }

        Ok(folders)
    }
}
