use crate::error::Result;
use crate::types::{DueWindow, ItemId, ScheduledItem};

/// What the alert engine needs from persistence, and nothing more.
///
/// Implementations must be callable from the poller task; they are never
/// invoked while the alert stack lock is held.
pub trait StoreGateway: Send + Sync {
    /// Not-yet-notified items whose instant lies in `window`, ordered by
    /// scheduled instant ascending.
    fn fetch_due(&self, window: &DueWindow) -> Result<Vec<ScheduledItem>>;

    /// Flag `id` as notified so later polls skip it.
    fn mark_notified(&self, id: ItemId) -> Result<()>;
}

impl<T: StoreGateway + ?Sized> StoreGateway for std::sync::Arc<T> {
    fn fetch_due(&self, window: &DueWindow) -> Result<Vec<ScheduledItem>> {
        (**self).fetch_due(window)
    }

    fn mark_notified(&self, id: ItemId) -> Result<()> {
        (**self).mark_notified(id)
    }
}
