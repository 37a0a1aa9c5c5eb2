pub mod db;
mod files;
mod folders;
pub mod models;
mod record_store;
mod tables;

pub use db::{Database, DatabaseError};
pub use record_store::{RecordStore, RecordStoreError};
pub use tables::*;
