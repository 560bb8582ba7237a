//! Retrieval collaborators answering questions over historical records.

pub mod lifelog_search;

pub use lifelog_search::LifelogSearchRetrieval;
