pub mod kernel {
    use std::collections::HashMap;
    use std::io::Error;
    use std::thread::{self, JoinHandle};
    use std::time::{Duration, Instant};

    use log::{debug, info, warn};
    use paging_core::channel::channel::{ClientEndpoint, RequestChannel};
    use paging_core::clock::clock::SimClock;
    use paging_core::memory_manager::memory_manager::{Handled, MemoryManager, Stats};
    use paging_core::proc::proc::Pid;
    use paging_core::request::request::MemoryRequest;
    use paging_core::scheduler::scheduler::Scheduler;
    use paging_core::spawner::spawner::ClientSpawner;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::config::config::{ClientPolicy, SimConfig};
    use crate::error::error::{Result, SimError};
    use crate::shutdown::shutdown::{ShutdownController, ShutdownReason, ShutdownStage};
    use crate::user::user::{CancelToken, Exit, UserProcess};

    /// Runs each user process on its own named thread.
    pub struct ThreadSpawner {
        policy: ClientPolicy,
        poll: Duration,
        seeds: StdRng,
        running: HashMap<Pid, (CancelToken, JoinHandle<Exit>)>,
        retired: Vec<(Pid, JoinHandle<Exit>)>,
    }

    impl ThreadSpawner {
        pub fn new(policy: ClientPolicy, poll: Duration, seeds: StdRng) -> ThreadSpawner {
            ThreadSpawner {
                policy,
                poll,
                seeds,
                running: HashMap::new(),
                retired: Vec::new(),
            }
        }

        // join whatever already exited so finished threads don't pile up.
        // returns how many were joined.
        fn sweep_retired(&mut self) -> usize {
            let (done, pending): (Vec<_>, Vec<_>) =
                self.retired.drain(..).partition(|(_, handle)| handle.is_finished());
            self.retired = pending;
            let swept = done.len();
            for (pid, handle) in done {
                join_client(pid, handle);
            }
            swept
        }
    }

    // a panicked client is logged, never propagated into the manager.
    fn join_client(pid: Pid, handle: JoinHandle<Exit>) -> Option<Exit> {
        match handle.join() {
            Ok(exit) => {
                debug!("Master: reaped {}: {:?}", pid, exit);
                Some(exit)
            }
            Err(_) => {
                warn!("Master: user process {} panicked", pid);
                None
            }
        }
    }

    impl ClientSpawner for ThreadSpawner {
        fn spawn(&mut self, pid: Pid, slot: usize, endpoint: ClientEndpoint) -> std::result::Result<(), Error> {
            let token = CancelToken::new();
            let user = UserProcess::new(
                slot,
                endpoint,
                self.policy.clone(),
                StdRng::seed_from_u64(self.seeds.random()),
                token.clone(),
                self.poll,
            );

            let handle = thread::Builder::new()
                .name(format!("user-{}", pid.0))
                .spawn(move || user.run())?;
            self.running.insert(pid, (token, handle));
            Ok(())
        }

        fn retire(&mut self, pid: Pid) {
            if let Some((_, handle)) = self.running.remove(&pid) {
                self.retired.push((pid, handle));
            }
            self.sweep_retired();
        }

        fn stop_all(&mut self) -> usize {
            for (token, _) in self.running.values() {
                token.cancel();
            }
            self.running.len()
        }

        fn reap_all(&mut self) -> usize {
            let handles: Vec<(Pid, JoinHandle<Exit>)> = self
                .running
                .drain()
                .map(|(pid, (_, handle))| (pid, handle))
                .chain(self.retired.drain(..))
                .collect();

            let reaped = handles.len();
            for (pid, handle) in handles {
                join_client(pid, handle);
            }
            reaped
        }
    }

    /// What a finished run looked like.
    #[derive(Clone, Debug, PartialEq)]
    pub struct RunReport {
        pub reason: ShutdownReason,
        pub stats: Stats,
        pub clock: SimClock,
        pub wall_time: Duration,
        pub stopped_clients: usize,
        pub reaped_clients: usize,
        pub stages: Vec<ShutdownStage>,
    }

    impl RunReport {
        pub fn summary(&self) -> String {
            format!(
                "{} at {}: {} processes, {} requests, {} page faults ({:.4} per access), {:.0} accesses/sec",
                self.reason,
                self.clock,
                self.stats.processes_created,
                self.stats.requests,
                self.stats.page_faults,
                self.stats.faults_per_access(),
                self.stats.accesses_per_second(self.clock),
            )
        }
    }

    /// The memory manager's event loop: admits processes, resolves one
    /// request per iteration, and owns every shared table while it runs.
    pub struct Kernel<S: ClientSpawner> {
        config: SimConfig,
        manager: Option<MemoryManager>,
        channel: Option<RequestChannel>,
        scheduler: Scheduler<StdRng>,
        spawner: S,
        shutdown: ShutdownController,
        next_pid: u32,
        started: Instant,
        report: Option<RunReport>,
    }

    impl Kernel<ThreadSpawner> {
        pub fn new(config: SimConfig) -> Result<Kernel<ThreadSpawner>> {
            let mut seeds = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let spawner = ThreadSpawner::new(
                config.client.clone(),
                config.poll_interval,
                StdRng::seed_from_u64(seeds.random()),
            );
            let shutdown = ShutdownController::new(config.run_budget);
            Kernel::with_spawner(config, spawner, shutdown, seeds)
        }
    }

    impl<S: ClientSpawner> Kernel<S> {
        pub fn with_spawner(
            config: SimConfig,
            spawner: S,
            shutdown: ShutdownController,
            mut rng: StdRng,
        ) -> Result<Kernel<S>> {
            config.validate()?;
            let manager = MemoryManager::new(config.frames, config.max_concurrent, config.costs.clone())
                .map_err(SimError::Tables)?;
            let scheduler = Scheduler::new(
                config.admission_policy(),
                StdRng::seed_from_u64(rng.random()),
                manager.clock(),
            );

            Ok(Kernel {
                config,
                manager: Some(manager),
                channel: Some(RequestChannel::new()),
                scheduler,
                spawner,
                shutdown,
                next_pid: 1,
                started: Instant::now(),
                report: None,
            })
        }

        pub fn shutdown_controller(&self) -> ShutdownController {
            self.shutdown.clone()
        }

        /// `None` once the tables have been released.
        pub fn manager(&self) -> Option<&MemoryManager> {
            self.manager.as_ref()
        }

        pub fn spawner(&self) -> &S {
            &self.spawner
        }

        pub fn report(&self) -> Option<&RunReport> {
            self.report.as_ref()
        }

        /// Loop until a shutdown trigger fires, then tear down. Fatal errors
        /// tear down before they are returned.
        pub fn run(&mut self) -> Result<RunReport> {
            info!(
                "Master: starting with {} frames, up to {} concurrent / {} total processes",
                self.config.frames, self.config.max_concurrent, self.config.max_total
            );

            let reason = loop {
                match self.step() {
                    Ok(Some(reason)) => break reason,
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Master: fatal: {}", e);
                        self.shutdown(ShutdownReason::Fatal);
                        return Err(e);
                    }
                }
            };

            self.shutdown(reason);
            self.report
                .clone()
                .ok_or_else(|| SimError::Config("kernel was already shut down".into()))
        }

        /// One loop iteration: check triggers, maybe admit, then resolve at
        /// most one request. Returns the reason to stop, if there is one.
        pub fn step(&mut self) -> Result<Option<ShutdownReason>> {
            if let Some(reason) = self.shutdown.pending(Instant::now()) {
                return Ok(Some(reason));
            }
            if self.shutdown.is_torn_down() {
                return Ok(Some(ShutdownReason::Fatal));
            }

            self.admit()?;

            let (Some(manager), Some(channel)) = (self.manager.as_ref(), self.channel.as_ref()) else {
                return Ok(Some(ShutdownReason::Fatal));
            };
            if self.scheduler.exhausted() && manager.procs().active_count() == 0 {
                return Ok(Some(ShutdownReason::Completed));
            }

            match channel.receive(self.config.poll_interval) {
                Ok(Some(request)) => self.dispatch(request),
                Ok(None) => self.idle(),
                Err(e) => warn!("Master: receive failed: {}", e),
            }
            Ok(None)
        }

        fn admit(&mut self) -> Result<()> {
            let (Some(manager), Some(channel)) = (self.manager.as_mut(), self.channel.as_mut()) else {
                return Ok(());
            };
            let Some(slot) = self.scheduler.try_admit(manager.clock(), manager.procs()) else {
                return Ok(());
            };

            let pid = Pid(self.next_pid);
            self.next_pid += 1;
            manager.admit(slot, pid).map_err(SimError::Tables)?;
            let endpoint = channel.connect(pid);
            self.spawner
                .spawn(pid, slot, endpoint)
                .map_err(|source| SimError::Spawn { pid, slot, source })?;
            debug!(
                "Master: {} of {} processes created",
                self.scheduler.created(),
                self.config.max_total
            );
            Ok(())
        }

        fn dispatch(&mut self, request: MemoryRequest) {
            let (Some(manager), Some(channel)) = (self.manager.as_mut(), self.channel.as_mut()) else {
                return;
            };

            match manager.handle(request) {
                Ok(Handled::Granted { response, .. }) => {
                    if let Err(e) = channel.reply(response) {
                        warn!("Master: could not grant {}: {}", response.target, e);
                    }
                }
                Ok(Handled::Terminated { pid, .. }) => {
                    channel.disconnect(pid);
                    self.spawner.retire(pid);
                }
                Err(e) => warn!("Master: dropped request: {}", e),
            }
        }

        // nothing arrived this poll; simulated time still has to move.
        fn idle(&mut self) {
            let Some(manager) = self.manager.as_mut() else { return };
            if manager.procs().active_count() == 0 {
                if !self.scheduler.exhausted() {
                    manager.advance_to(self.scheduler.next_admission());
                }
            } else {
                let tick = manager.costs().idle_tick;
                manager.advance_clock(tick);
            }
        }

        /// Ordered, one-shot teardown. Every call after the first returns
        /// `None` and touches nothing.
        pub fn shutdown(&mut self, reason: ShutdownReason) -> Option<RunReport> {
            if !self.shutdown.begin_teardown() {
                return None;
            }
            info!("Master: shutting down: {}", reason);
            let mut stages = Vec::new();

            enter(&mut stages, ShutdownStage::StopAdmitting);
            self.scheduler.close();

            enter(&mut stages, ShutdownStage::SignalClients);
            let stopped_clients = self.spawner.stop_all();

            enter(&mut stages, ShutdownStage::ReapClients);
            let reaped_clients = self.spawner.reap_all();

            enter(&mut stages, ShutdownStage::ReleaseTables);
            let (stats, clock) = match self.manager.take() {
                Some(mut manager) => (manager.release(), manager.clock()),
                None => (Stats::default(), SimClock::ZERO),
            };

            enter(&mut stages, ShutdownStage::ReleaseChannel);
            drop(self.channel.take());

            let mut report = RunReport {
                reason,
                stats,
                clock,
                wall_time: self.started.elapsed(),
                stopped_clients,
                reaped_clients,
                stages: Vec::new(),
            };
            info!("Master: {}", report.summary());

            enter(&mut stages, ShutdownStage::CloseLog);
            log::logger().flush();

            report.stages = stages;
            self.report = Some(report.clone());
            Some(report)
        }
    }

    fn enter(stages: &mut Vec<ShutdownStage>, stage: ShutdownStage) {
        info!("Master: shutdown stage {:?}", stage);
        stages.push(stage);
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn spawner() -> ThreadSpawner {
            ThreadSpawner::new(ClientPolicy::default(), Duration::from_millis(1), StdRng::seed_from_u64(1))
        }

        fn finished(handle: &JoinHandle<Exit>) {
            while !handle.is_finished() {
                thread::sleep(Duration::from_millis(1));
            }
        }

        #[test]
        fn panicked_client_is_swept_without_propagating() {
            let mut s = spawner();
            let crashed = thread::spawn(|| -> Exit { panic!("client crashed") });
            let clean = thread::spawn(|| Exit::Terminated { requests: 3 });
            finished(&crashed);
            finished(&clean);
            s.retired.push((Pid(1), crashed));
            s.retired.push((Pid(2), clean));

            assert_eq!(s.sweep_retired(), 2);
            assert!(s.retired.is_empty());
        }

        #[test]
        fn join_reports_exit_or_panic() {
            let crashed = thread::spawn(|| -> Exit { panic!("client crashed") });
            assert_eq!(join_client(Pid(1), crashed), None);

            let clean = thread::spawn(|| Exit::Cancelled { requests: 0 });
            assert_eq!(join_client(Pid(2), clean), Some(Exit::Cancelled { requests: 0 }));
        }

        #[test]
        fn reap_all_joins_a_panicked_retired_client() {
            let mut s = spawner();
            let crashed = thread::spawn(|| -> Exit { panic!("client crashed") });
            s.retired.push((Pid(4), crashed));
            assert_eq!(s.reap_all(), 1);
            assert!(s.retired.is_empty());
        }
    }
}
