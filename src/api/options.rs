use crate::replica::ReplicaNodeOptions;
use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct PaxosOptions {
    pub failure_detector_delay: Option<Duration>,
    pub failure_detector_delta: Option<Duration>,
    pub prepare_timeout: Option<Duration>,
    pub accept_timeout: Option<Duration>,
    pub proposer_retry_delay: Option<Duration>,
    pub client_handle_timeout: Option<Duration>,
}

#[derive(Copy, Clone, Debug)]
pub(super) struct PaxosOptionsValidated {
    pub failure_detector_delay: Duration,
    pub failure_detector_delta: Duration,
    pub prepare_timeout: Duration,
    pub accept_timeout: Duration,
    pub proposer_retry_delay: Duration,
    pub client_handle_timeout: Duration,
}

impl PaxosOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        let all = [
            self.failure_detector_delay,
            self.failure_detector_delta,
            self.prepare_timeout,
            self.accept_timeout,
            self.proposer_retry_delay,
            self.client_handle_timeout,
        ];
        if all.iter().any(|d| *d == Duration::from_millis(0)) {
            return Err("All durations must be non-zero");
        }
        if self.client_handle_timeout <= self.accept_timeout {
            return Err("Client handle timeout must be greater than the accept timeout");
        }
        if self.proposer_retry_delay >= self.prepare_timeout {
            return Err("Proposer retry delay must be less than the prepare timeout");
        }

        Ok(())
    }

    /// RPC deadline for remote nodes. Covers the slowest call we make.
    pub(super) fn rpc_timeout(&self) -> Duration {
        self.client_handle_timeout
            .max(self.prepare_timeout)
            .max(self.accept_timeout)
    }

    pub(super) fn replica_node_options(&self) -> ReplicaNodeOptions {
        ReplicaNodeOptions {
            failure_detector_delay: self.failure_detector_delay,
            failure_detector_delta: self.failure_detector_delta,
            prepare_timeout: self.prepare_timeout,
            accept_timeout: self.accept_timeout,
            retry_delay: self.proposer_retry_delay,
        }
    }
}

impl TryFrom<PaxosOptions> for PaxosOptionsValidated {
    type Error = &'static str;

    fn try_from(options: PaxosOptions) -> Result<Self, Self::Error> {
        let values = PaxosOptionsValidated {
            failure_detector_delay: options.failure_detector_delay.unwrap_or(Duration::from_secs(1)),
            failure_detector_delta: options.failure_detector_delta.unwrap_or(Duration::from_secs(1)),
            prepare_timeout: options.prepare_timeout.unwrap_or(Duration::from_secs(2)),
            accept_timeout: options.accept_timeout.unwrap_or(Duration::from_secs(2)),
            proposer_retry_delay: options.proposer_retry_delay.unwrap_or(Duration::from_millis(500)),
            client_handle_timeout: options.client_handle_timeout.unwrap_or(Duration::from_secs(5)),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = PaxosOptionsValidated::try_from(PaxosOptions::default()).unwrap();

        assert_eq!(options.failure_detector_delay, Duration::from_secs(1));
        assert_eq!(options.prepare_timeout, Duration::from_secs(2));
        assert_eq!(options.proposer_retry_delay, Duration::from_millis(500));
        assert_eq!(options.rpc_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let options = PaxosOptions {
            failure_detector_delta: Some(Duration::from_millis(0)),
            ..PaxosOptions::default()
        };

        assert!(PaxosOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn client_handle_must_outlast_accept() {
        let options = PaxosOptions {
            accept_timeout: Some(Duration::from_secs(3)),
            client_handle_timeout: Some(Duration::from_secs(3)),
            ..PaxosOptions::default()
        };

        assert!(PaxosOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn retry_delay_must_be_below_prepare_timeout() {
        let options = PaxosOptions {
            prepare_timeout: Some(Duration::from_millis(300)),
            proposer_retry_delay: Some(Duration::from_millis(300)),
            ..PaxosOptions::default()
        };

        assert!(PaxosOptionsValidated::try_from(options).is_err());
    }
}
