pub mod user {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use log::{debug, warn};
    use paging_core::channel::channel::ClientEndpoint;
    use paging_core::proc::proc::{Pid, PAGE_COUNT, PAGE_SIZE};
    use paging_core::request::request::{MemoryRequest, RequestKind};
    use rand::Rng;

    use crate::config::config::ClientPolicy;

    /// Shared stop flag; cloning hands out another handle to the same flag.
    #[derive(Clone, Debug, Default)]
    pub struct CancelToken(Arc<AtomicBool>);

    impl CancelToken {
        pub fn new() -> CancelToken {
            CancelToken::default()
        }

        pub fn cancel(&self) {
            self.0.store(true, Ordering::SeqCst);
        }

        pub fn is_cancelled(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Why a user process loop ended.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum Exit {
        Terminated { requests: u64 },
        Cancelled { requests: u64 },
        Disconnected { requests: u64 },
    }

    /// A simulated user process: issues one memory request at a time and
    /// waits for the manager to grant it before issuing the next.
    pub struct UserProcess<R: Rng> {
        pid: Pid,
        slot: usize,
        endpoint: ClientEndpoint,
        policy: ClientPolicy,
        rng: R,
        cancel: CancelToken,
        poll: Duration,
        issued: u64,
    }

    impl<R: Rng> UserProcess<R> {
        pub fn new(
            slot: usize,
            endpoint: ClientEndpoint,
            policy: ClientPolicy,
            rng: R,
            cancel: CancelToken,
            poll: Duration,
        ) -> UserProcess<R> {
            UserProcess {
                pid: endpoint.pid(),
                slot,
                endpoint,
                policy,
                rng,
                cancel,
                poll,
                issued: 0,
            }
        }

        /// Draw the next request. Termination is only possible once the
        /// minimum number of requests has been granted.
        pub fn next_request(&mut self) -> MemoryRequest {
            if self.issued >= self.policy.min_requests
                && self.rng.random_bool(self.policy.terminate_probability)
            {
                return MemoryRequest::terminate(self.pid, self.slot);
            }

            let address = self.rng.random_range(0..PAGE_COUNT as u32 * PAGE_SIZE);
            let kind = if self.rng.random_bool(self.policy.write_probability) {
                RequestKind::Write
            } else {
                RequestKind::Read
            };
            MemoryRequest::access(self.pid, self.slot, address, kind)
        }

        // block for our response, giving up if cancelled.
        fn await_grant(&self) -> Option<Exit> {
            loop {
                if self.cancel.is_cancelled() {
                    return Some(Exit::Cancelled { requests: self.issued });
                }
                match self.endpoint.wait_response(self.poll) {
                    Ok(Some(_)) => return None,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("{}: lost manager while waiting: {}", self.pid, e);
                        return Some(Exit::Disconnected { requests: self.issued });
                    }
                }
            }
        }

        pub fn run(mut self) -> Exit {
            loop {
                if self.cancel.is_cancelled() {
                    return Exit::Cancelled { requests: self.issued };
                }

                let request = self.next_request();
                let terminating = request.terminate;
                if let Err(e) = self.endpoint.send(request) {
                    debug!("{}: send failed: {}", self.pid, e);
                    return Exit::Disconnected { requests: self.issued };
                }
                if terminating {
                    debug!("{}: terminating after {} requests", self.pid, self.issued);
                    return Exit::Terminated { requests: self.issued };
                }

                if let Some(exit) = self.await_grant() {
                    return exit;
                }
                self.issued += 1;
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use paging_core::channel::channel::RequestChannel;
        use paging_core::request::request::MemoryResponse;
        use rand::SeedableRng;
        use rand::rngs::StdRng;
        use std::thread;

        const POLL: Duration = Duration::from_millis(1);

        fn policy(min_requests: u64, terminate_probability: f64) -> ClientPolicy {
            ClientPolicy {
                min_requests,
                terminate_probability,
                write_probability: 0.5,
            }
        }

        #[test]
        fn never_terminates_before_minimum() {
            let mut channel = RequestChannel::new();
            let endpoint = channel.connect(Pid(1));
            let mut user = UserProcess::new(
                0,
                endpoint,
                policy(1000, 1.0),
                StdRng::seed_from_u64(3),
                CancelToken::new(),
                POLL,
            );
            for _ in 0..200 {
                let req = user.next_request();
                assert!(!req.terminate);
                assert!(req.page < PAGE_COUNT);
                assert_eq!(req.slot, 0);
                assert_eq!(req.stamped, None);
            }
        }

        #[test]
        fn terminates_with_certainty_once_eligible() {
            let mut channel = RequestChannel::new();
            let endpoint = channel.connect(Pid(2));
            let mut user = UserProcess::new(
                1,
                endpoint,
                policy(0, 1.0),
                StdRng::seed_from_u64(3),
                CancelToken::new(),
                POLL,
            );
            let req = user.next_request();
            assert!(req.terminate);
            assert_eq!(req.sender, Pid(2));
        }

        #[test]
        fn waits_for_grant_between_requests_then_terminates() {
            let mut channel = RequestChannel::new();
            let endpoint = channel.connect(Pid(5));
            let user = UserProcess::new(
                0,
                endpoint,
                policy(3, 1.0),
                StdRng::seed_from_u64(11),
                CancelToken::new(),
                POLL,
            );
            let handle = thread::spawn(move || user.run());

            for _ in 0..3 {
                let req = channel.receive(Duration::from_secs(5)).unwrap().unwrap();
                assert!(!req.terminate);
                // nothing else may arrive until we answer
                assert_eq!(channel.receive(Duration::from_millis(20)).unwrap(), None);
                channel.reply(MemoryResponse { target: Pid(5), granted: true }).unwrap();
            }
            let last = channel.receive(Duration::from_secs(5)).unwrap().unwrap();
            assert!(last.terminate);
            assert_eq!(handle.join().unwrap(), Exit::Terminated { requests: 3 });
        }

        #[test]
        fn cancel_stops_a_blocked_process() {
            let mut channel = RequestChannel::new();
            let endpoint = channel.connect(Pid(6));
            let token = CancelToken::new();
            let user = UserProcess::new(
                0,
                endpoint,
                policy(1000, 0.2),
                StdRng::seed_from_u64(1),
                token.clone(),
                POLL,
            );
            let handle = thread::spawn(move || user.run());

            channel.receive(Duration::from_secs(5)).unwrap().unwrap();
            token.cancel();
            assert_eq!(handle.join().unwrap(), Exit::Cancelled { requests: 0 });
        }
    }
}
