//! Last-seen external post id shared between modules.
//!
//! The social-stream watcher publishes the id of the newest post it relayed; the
//! feed poller reads it to avoid double-posting the same item.

use tokio::sync::watch;

use crate::domain::traits::ExternalIdSource;

#[derive(Clone)]
pub struct SharedExternalId {
    tx: watch::Sender<Option<i64>>,
}

impl SharedExternalId {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Writer side. The stream watcher that calls this lives outside this crate.
    #[allow(dead_code)]
    pub fn publish(&self, id: i64) {
        self.tx.send_replace(Some(id));
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Change notifications for watchers that want to react to new ids.
    #[allow(dead_code)]
    pub fn subscribe(&self) -> watch::Receiver<Option<i64>> {
        self.tx.subscribe()
    }
}

impl Default for SharedExternalId {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalIdSource for SharedExternalId {
    fn current_external_id(&self) -> Option<i64> {
        *self.tx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_is_visible_to_readers() {
        let shared = SharedExternalId::new();
        let reader = shared.clone();
        let mut rx = shared.subscribe();
        assert_eq!(reader.current_external_id(), None);

        shared.publish(1234567890123);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(1234567890123));
        assert_eq!(reader.current_external_id(), Some(1234567890123));

        shared.clear();
        assert_eq!(reader.current_external_id(), None);
    }
}
