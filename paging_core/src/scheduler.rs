pub mod scheduler {
    use std::ops::Range;

    use log::debug;
    use rand::Rng;

    use crate::clock::clock::SimClock;
    use crate::proc::proc::{ProcessTable, MAX_PROCESSES};

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct AdmissionPolicy {
        pub max_concurrent: usize,
        pub max_total: usize,
        /// offset, in simulated nanoseconds, drawn for each next admission.
        pub interval_ns: Range<u64>,
    }

    impl Default for AdmissionPolicy {
        fn default() -> Self {
            AdmissionPolicy {
                max_concurrent: MAX_PROCESSES,
                max_total: 100,
                interval_ns: 1_000_000..6_000_000,
            }
        }
    }

    /// Decides when a new process may be admitted and into which slot.
    ///
    /// Admission needs every one of: total cap not reached, a free slot,
    /// and the clock at or past the drawn admission time. A new target is
    /// drawn the moment an admission is granted.
    pub struct Scheduler<R: Rng> {
        policy: AdmissionPolicy,
        rng: R,
        created: usize,
        next_admission: SimClock,
        closed: bool,
    }

    impl<R: Rng> Scheduler<R> {
        pub fn new(policy: AdmissionPolicy, rng: R, now: SimClock) -> Scheduler<R> {
            let mut scheduler = Scheduler {
                policy,
                rng,
                created: 0,
                next_admission: now,
                closed: false,
            };
            scheduler.schedule_next(now);
            scheduler
        }

        pub fn created(&self) -> usize {
            self.created
        }

        pub fn next_admission(&self) -> SimClock {
            self.next_admission
        }

        /// Every process the run will ever create has been created.
        pub fn exhausted(&self) -> bool {
            self.created >= self.policy.max_total
        }

        /// Stop admitting for good; first step of teardown.
        pub fn close(&mut self) {
            self.closed = true;
        }

        fn schedule_next(&mut self, now: SimClock) {
            let offset = if self.policy.interval_ns.is_empty() {
                self.policy.interval_ns.start
            } else {
                self.rng.random_range(self.policy.interval_ns.clone())
            };
            self.next_admission = now.after(offset);
            debug!("next admission at {}", self.next_admission);
        }

        /// Reserve the lowest free slot if admission is allowed at `now`.
        pub fn try_admit(&mut self, now: SimClock, table: &ProcessTable) -> Option<usize> {
            if self.closed || self.exhausted() || now < self.next_admission {
                return None;
            }
            if table.active_count() >= self.policy.max_concurrent {
                return None;
            }

            let slot = table.first_free_slot()?;
            self.created += 1;
            self.schedule_next(now);
            Some(slot)
        }
    }

}
