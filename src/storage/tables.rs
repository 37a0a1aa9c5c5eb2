use redb::TableDefinition;

/// File records: uuid -> FileRecord (msgpack)
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Folder records: uuid -> FolderRecord (msgpack)
pub const FOLDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("folders");

/// Folder index: parent folder uuid -> msgpack Vec of file UUIDs
pub const FOLDER_FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("folder_files");
