use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Answers free-text questions over the user's historical records.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn answer(&self, query: &str) -> DomainResult<String>;
}
