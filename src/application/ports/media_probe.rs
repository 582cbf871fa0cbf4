use std::path::Path;

use async_trait::async_trait;

/// Best-effort container introspection. Implementations must never surface
/// an error; an unreadable duration is simply `None`.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn duration_secs(&self, path: &Path) -> Option<f64>;
}
