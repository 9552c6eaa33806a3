//! Single-slot tracking of in-flight operations.

use tokio::sync::watch;

/// Counts in-flight operations of one kind.
///
/// [`InFlight::try_begin`] claims the slot only when it is idle, as one
/// atomic check-and-set. [`InFlight::begin`] always claims it. Neither
/// serializes work: two forced loads may overlap.
#[derive(Debug)]
pub struct InFlight {
    count: watch::Sender<usize>,
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl InFlight {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        InFlight { count }
    }

    /// Claim the slot if nothing is in flight.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        let claimed = self.count.send_if_modified(|n| {
            if *n == 0 {
                *n = 1;
                true
            } else {
                false
            }
        });
        claimed.then_some(InFlightGuard { slot: self })
    }

    /// Claim the slot regardless of what is already in flight.
    pub fn begin(&self) -> InFlightGuard<'_> {
        self.count.send_modify(|n| *n += 1);
        InFlightGuard { slot: self }
    }

    pub fn is_active(&self) -> bool {
        *self.count.borrow() > 0
    }

    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Resolve once nothing is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

/// Releases its claim on drop, whether the operation succeeded or not.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    slot: &'a InFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slot.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}
