use std::time::Duration;
use tokio::time::Instant;

/// Trailing-edge debounce. Only tracks the deadline; the owning loop waits
/// on [`wait_for`] and calls [`TrailingDebounce::take_due`].
#[derive(Debug, Clone)]
pub struct TrailingDebounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl TrailingDebounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

pub async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_repeated_triggers_fire_once_after_last() {
        let mut debounce = TrailingDebounce::new(Duration::from_millis(300));
        debounce.schedule();
        tokio::time::advance(Duration::from_millis(200)).await;
        debounce.schedule();
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(!debounce.take_due(Instant::now()));

        wait_for(debounce.deadline()).await;
        assert!(debounce.take_due(Instant::now()));
        assert!(!debounce.is_pending());
        assert!(!debounce.take_due(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let mut debounce = TrailingDebounce::new(Duration::from_millis(50));
        debounce.schedule();
        debounce.cancel();
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(!debounce.take_due(Instant::now()));
        assert_eq!(debounce.deadline(), None);
    }
}
