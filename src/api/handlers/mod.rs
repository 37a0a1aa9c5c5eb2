mod admin;
mod files;
mod folders;
mod session;
mod static_files;
mod storage;
mod trash;
mod workspace;

pub use admin::health;
pub use files::{
    create_file, favorite_file, file_content, file_preview, get_file, list_files, purge_file,
    restore_file, trash_file, update_file,
};
pub use folders::{create_folder, delete_folder, get_folder, list_folders};
pub use session::{current_user, sign_out};
pub use static_files::serve_blob;
pub use storage::storage_stats;
pub use trash::{list_trash, purge_all, restore_all};
pub use workspace::{
    clear_selection, favorite as workspace_favorite, run_batch, search, share_selection, sort,
    take_notice, toggle_favorites_only, toggle_select_all, toggle_selection,
    trash as workspace_trash, workspace_files,
};
