use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::core::SdkError;

/// Lazily initialized pipeline handle owned by a single model instance.
///
/// Concurrent first callers wait on the same in-flight load. A failed load
/// leaves the cell empty so the next call tries again.
pub struct PipelineCell<P: ?Sized> {
    cell: OnceCell<Arc<P>>,
}

impl<P: ?Sized> Default for PipelineCell<P> {
    fn default() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }
}

impl<P: ?Sized + Send + Sync> PipelineCell<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    pub fn get(&self) -> Option<Arc<P>> {
        self.cell.get().cloned()
    }

    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<P>, SdkError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<P>, SdkError>>,
    {
        self.cell.get_or_try_init(load).await.map(Arc::clone)
    }
}
