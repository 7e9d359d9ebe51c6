mod loader;

pub use loader::{BracketCsvRecord, BracketLoader, BracketLoaderError};
