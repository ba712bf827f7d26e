use tokio::time::Instant;

/// Time source for the failure detector's rounds.
#[async_trait::async_trait]
pub(crate) trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    async fn sleep_until(&mut self, deadline: Instant);
}

#[derive(Copy, Clone)]
pub(crate) struct RealClock;

#[async_trait::async_trait]
impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
pub(crate) use mock::mocked_clock;

#[cfg(test)]
mod mock {
    use super::Clock;
    use tokio::sync::watch;
    use tokio::time::{Duration, Instant};

    /// Time only moves when the controller says so.
    pub(crate) fn mocked_clock() -> (MockClock, MockClockController) {
        let (tx, rx) = watch::channel(Duration::from_millis(0));

        (
            MockClock {
                epoch: Instant::now(),
                elapsed: rx,
            },
            MockClockController { elapsed: tx },
        )
    }

    #[derive(Clone)]
    pub(crate) struct MockClock {
        epoch: Instant,
        elapsed: watch::Receiver<Duration>,
    }

    #[async_trait::async_trait]
    impl Clock for MockClock {
        fn now(&self) -> Instant {
            self.epoch + *self.elapsed.borrow()
        }

        async fn sleep_until(&mut self, deadline: Instant) {
            while self.now() < deadline {
                if self.elapsed.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    pub(crate) struct MockClockController {
        elapsed: watch::Sender<Duration>,
    }

    impl MockClockController {
        pub(crate) fn elapsed_time(&self) -> Duration {
            *self.elapsed.borrow()
        }

        /// A sleeper only learns time moved at the next advance, so step no coarser than you
        /// want to observe.
        pub(crate) fn advance(&mut self, duration: Duration) {
            let elapsed = self.elapsed_time() + duration;
            let _ = self.elapsed.send(elapsed);
        }
    }
}
