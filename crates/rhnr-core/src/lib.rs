pub mod cache;
pub mod columns;
pub mod db;
pub mod error;
pub mod export;
pub mod extraction;
pub mod highlight;
pub mod ingestion;
pub mod objectives;
pub mod proposal;
pub mod reconciliation;
pub mod reports;
pub mod selection;
pub mod session;
pub mod typology;
pub mod values;

pub use error::{Result, RhnrError};
