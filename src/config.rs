pub mod config {
    use std::ops::Range;
    use std::path::PathBuf;
    use std::time::Duration;

    use paging_core::frame_table::frame_table::DEFAULT_FRAMES;
    use paging_core::memory_manager::memory_manager::AccessCosts;
    use paging_core::proc::proc::MAX_PROCESSES;
    use paging_core::scheduler::scheduler::AdmissionPolicy;

    use crate::error::error::{Result, SimError};

    /// When a simulated user process decides to leave.
    #[derive(Clone, Debug, PartialEq)]
    pub struct ClientPolicy {
        /// requests that must be issued before termination is considered.
        pub min_requests: u64,
        pub terminate_probability: f64,
        pub write_probability: f64,
    }

    impl Default for ClientPolicy {
        fn default() -> Self {
            ClientPolicy {
                min_requests: 1000,
                terminate_probability: 0.20,
                write_probability: 0.50,
            }
        }
    }

    #[derive(Clone, Debug)]
    pub struct SimConfig {
        pub frames: usize,
        pub max_concurrent: usize,
        pub max_total: usize,
        pub admission_interval_ns: Range<u64>,
        pub client: ClientPolicy,
        pub run_budget: Duration,
        pub poll_interval: Duration,
        pub costs: AccessCosts,
        pub log_file: PathBuf,
        pub log_line_limit: usize,
        pub seed: Option<u64>,
    }

    impl Default for SimConfig {
        fn default() -> Self {
            SimConfig {
                frames: DEFAULT_FRAMES,
                max_concurrent: MAX_PROCESSES,
                max_total: 100,
                admission_interval_ns: 1_000_000..6_000_000,
                client: ClientPolicy::default(),
                run_budget: Duration::from_secs(2),
                poll_interval: Duration::from_millis(1),
                costs: AccessCosts::default(),
                log_file: PathBuf::from("program.log"),
                log_line_limit: 100_000,
                seed: None,
            }
        }
    }

    impl SimConfig {
        /// Concurrency requests above the hard ceiling are clamped, like the
        /// `-s` flag always has been.
        pub fn with_max_concurrent(mut self, requested: usize) -> SimConfig {
            self.max_concurrent = requested.min(MAX_PROCESSES);
            self
        }

        pub fn admission_policy(&self) -> AdmissionPolicy {
            AdmissionPolicy {
                max_concurrent: self.max_concurrent,
                max_total: self.max_total,
                interval_ns: self.admission_interval_ns.clone(),
            }
        }

        pub fn validate(&self) -> Result<()> {
            if self.frames == 0 {
                return Err(SimError::Config("frame count must be > 0".into()));
            }
            if self.max_concurrent == 0 || self.max_concurrent > MAX_PROCESSES {
                return Err(SimError::Config(format!(
                    "max concurrent processes must be within 1..={MAX_PROCESSES}"
                )));
            }
            if self.admission_interval_ns.start > self.admission_interval_ns.end {
                return Err(SimError::Config("admission interval is inverted".into()));
            }
            for (name, p) in [
                ("terminate probability", self.client.terminate_probability),
                ("write probability", self.client.write_probability),
            ] {
                if !(0.0..=1.0).contains(&p) {
                    return Err(SimError::Config(format!("{name} must be within 0..=1")));
                }
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn defaults_match_legacy_limits() {
            let config = SimConfig::default();
            assert_eq!(config.frames, 256);
            assert_eq!(config.max_concurrent, 18);
            assert_eq!(config.max_total, 100);
            assert_eq!(config.run_budget, Duration::from_secs(2));
            assert!(config.validate().is_ok());
        }

        #[test]
        fn concurrency_is_clamped_to_ceiling() {
            assert_eq!(SimConfig::default().with_max_concurrent(40).max_concurrent, MAX_PROCESSES);
            assert_eq!(SimConfig::default().with_max_concurrent(3).max_concurrent, 3);
        }

        #[test]
        fn validate_rejects_zero_concurrency_and_bad_probability() {
            let config = SimConfig::default().with_max_concurrent(0);
            assert!(matches!(config.validate(), Err(SimError::Config(_))));

            let mut config = SimConfig::default();
            config.client.terminate_probability = 1.5;
            assert!(matches!(config.validate(), Err(SimError::Config(_))));
        }
    }
}
