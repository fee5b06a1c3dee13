use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

const MIN_WAIT_SLICE: Duration = Duration::from_millis(200);

/// Returns how long to sleep before checking a condition again.
///
/// Any wake-up of the awaited [Notify] short-circuits the slice.
pub(crate) fn wait_slice(remaining: Duration) -> Duration {
    (remaining / 10).max(MIN_WAIT_SLICE).min(remaining)
}

/// Polls `ready` until it returns `true` or `deadline` is reached.
///
/// `ready` is evaluated at least once, and again after each wake-up of
/// `notify` or wait slice. Returns the last value of `ready`.
pub(crate) async fn poll_until(
    notify: &Notify,
    deadline: Instant,
    mut ready: impl FnMut() -> bool,
) -> bool {
    loop {
        // registered before checking, so that no wake-up is missed
        let notified = notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if ready() {
            return true;
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }

        let _ = tokio::time::timeout(wait_slice(deadline - now), notified).await;
    }
}
