// fedlens: time-aligned research dataset for central-bank speeches
//
// This is the library root. Each module corresponds to one stage of the
// dataset build: date parsing, corpus loading, score aggregation, rate
// alignment, and index construction, plus the ambient pieces around them.

pub mod cache;
pub mod config;
pub mod corpus;
pub mod dates;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod output;
pub mod pipeline;
pub mod rates;
pub mod scores;
pub mod status;

#[cfg(feature = "sqlite")]
pub mod db;

pub use error::{DatasetError, Result};
