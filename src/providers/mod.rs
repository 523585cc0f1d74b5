pub mod azure_devops;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::work_item::WorkItem;

/// Anything that can look up a single work item by numeric id.
///
/// Implementations make exactly one attempt per call and report failures
/// as-is; callers decide what to do with them.
#[async_trait]
pub trait WorkItemSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, id: u32) -> Result<WorkItem>;
}
