mod folio;

pub use folio::{CONFIG_FILE, DB_FILE, FolioConfig};
