pub mod memory_manager {
    use std::collections::HashSet;
    use std::io::{Error, ErrorKind};

    use log::{debug, info, trace};

    use crate::clock::clock::{SimClock, NANOS_PER_SECOND};
    use crate::eviction_queue::eviction_queue::EvictionQueue;
    use crate::frame_table::frame_table::{FrameOwner, FrameTable};
    use crate::proc::proc::{Pid, ProcessTable, PAGE_COUNT};
    use crate::request::request::{AccessOutcome, MemoryRequest, MemoryResponse, RequestKind};

    /// Simulated nanoseconds charged per event.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct AccessCosts {
        pub hit: u64,
        pub dirty_read_hit: u64,
        pub fault_free_frame: u64,
        pub eviction_scan_step: u64,
        pub eviction_final: u64,
        pub idle_tick: u64,
    }

    impl Default for AccessCosts {
        fn default() -> Self {
            AccessCosts {
                hit: 10,
                dirty_read_hit: 25,
                fault_free_frame: 14_000,
                eviction_scan_step: 100,
                eviction_final: 14_000,
                idle_tick: 100_000,
            }
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct Stats {
        pub requests: u64,
        pub reads: u64,
        pub writes: u64,
        pub hits: u64,
        pub page_faults: u64,
        pub evictions: u64,
        pub second_chances: u64,
        pub processes_created: u64,
        pub terminations: u64,
    }

    impl Stats {
        pub fn accesses_per_second(&self, clock: SimClock) -> f64 {
            let elapsed = clock.as_nanos() as f64 / NANOS_PER_SECOND as f64;
            if elapsed == 0.0 {
                return 0.0;
            }
            self.requests as f64 / elapsed
        }

        pub fn faults_per_access(&self) -> f64 {
            if self.requests == 0 {
                return 0.0;
            }
            self.page_faults as f64 / self.requests as f64
        }
    }

    /// What the manager did with one dequeued request.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Handled {
        Granted {
            response: MemoryResponse,
            outcome: AccessOutcome,
        },
        /// No response is owed for a termination.
        Terminated {
            pid: Pid,
            slot: usize,
            released: Vec<usize>,
            /// accesses the process made over its lifetime.
            requests: u64,
        },
    }

    /// Single owner of the clock, frame table, process table and eviction
    /// queue. Every mutation goes through `handle`, `admit` or `advance_*`,
    /// all called from the one manager loop.
    pub struct MemoryManager {
        clock: SimClock,
        frames: FrameTable,
        queue: EvictionQueue,
        procs: ProcessTable,
        costs: AccessCosts,
        stats: Stats,
    }

    impl MemoryManager {
        pub fn new(frame_count: usize, max_concurrent: usize, costs: AccessCosts) -> Result<MemoryManager, Error> {
            Ok(MemoryManager {
                clock: SimClock::ZERO,
                frames: FrameTable::new(frame_count)?,
                queue: EvictionQueue::with_capacity(frame_count),
                procs: ProcessTable::new(max_concurrent)?,
                costs,
                stats: Stats::default(),
            })
        }

        pub fn clock(&self) -> SimClock {
            self.clock
        }

        pub fn frames(&self) -> &FrameTable {
            &self.frames
        }

        pub fn queue(&self) -> &EvictionQueue {
            &self.queue
        }

        pub fn procs(&self) -> &ProcessTable {
            &self.procs
        }

        pub fn stats(&self) -> &Stats {
            &self.stats
        }

        pub fn costs(&self) -> &AccessCosts {
            &self.costs
        }

        pub fn advance_clock(&mut self, delta: u64) {
            self.clock.advance(delta);
        }

        pub fn advance_to(&mut self, target: SimClock) {
            self.clock.advance_to(target);
        }

        /// Bind `pid` to a slot the scheduler reserved.
        pub fn admit(&mut self, slot: usize, pid: Pid) -> Result<(), Error> {
            self.procs.admit(slot, pid, self.clock)?;
            self.stats.processes_created += 1;
            info!("Master: admitted {} into slot {} at time {}", pid, slot, self.clock);
            Ok(())
        }

        /// Resolve one request, stamping it with the manager's clock.
        ///
        /// Requests naming a slot the sender does not hold, or a page outside
        /// the address space, are rejected with `InvalidInput` and change no
        /// state.
        pub fn handle(&mut self, mut request: MemoryRequest) -> Result<Handled, Error> {
            request.stamp(self.clock);

            if request.terminate {
                let requests = self.procs.get(request.slot).map_or(0, |s| s.requests);
                let released = self.terminate(request.slot, request.sender);
                return Ok(Handled::Terminated {
                    pid: request.sender,
                    slot: request.slot,
                    released,
                    requests,
                });
            }

            match self.procs.get(request.slot) {
                Some(slot) if slot.pid == request.sender => {}
                _ => {
                    return Err(Error::new(
                        ErrorKind::InvalidInput,
                        format!("{} does not hold slot {}", request.sender, request.slot),
                    ));
                }
            }
            if request.page >= PAGE_COUNT {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("page {} outside address space", request.page),
                ));
            }

            info!(
                "Master: {} requesting {} of address {} (page {}) at time {}",
                request.sender,
                match request.kind {
                    RequestKind::Read => "read",
                    RequestKind::Write => "write",
                },
                request.address,
                request.page,
                self.clock
            );

            let outcome = self.resolve(request.slot, request.sender, request.page, request.kind);
            debug_assert_eq!(self.audit(), Ok(()));

            Ok(Handled::Granted {
                response: MemoryResponse {
                    target: request.sender,
                    granted: true,
                },
                outcome,
            })
        }

        /// Hit or fault-in `page` for the process in `slot`.
        pub fn resolve(&mut self, slot: usize, pid: Pid, page: usize, kind: RequestKind) -> AccessOutcome {
            let write = kind == RequestKind::Write;
            self.stats.requests += 1;
            if write {
                self.stats.writes += 1;
            } else {
                self.stats.reads += 1;
            }

            let mapped = match self.procs.get_mut(slot) {
                Some(entry) => {
                    entry.requests += 1;
                    entry.frame_of(page)
                }
                None => None,
            };
            if let Some(index) = mapped {
                let frame = self
                    .frames
                    .get_mut(index)
                    .expect("page table points past the frame table");
                let dirty_read = !write && frame.dirty;
                frame.reference = true;
                if write {
                    frame.dirty = true;
                }

                self.stats.hits += 1;
                self.clock.advance(if dirty_read {
                    self.costs.dirty_read_hit
                } else {
                    self.costs.hit
                });
                debug!(
                    "Master: {} page {} found in frame {}{} at time {}",
                    pid,
                    page,
                    index,
                    if dirty_read { " (dirty)" } else { "" },
                    self.clock
                );
                return AccessOutcome::Hit { frame: index, dirty_read };
            }

            self.stats.page_faults += 1;
            let owner = FrameOwner { pid, slot, page };

            if let Some(index) = self.frames.first_free() {
                self.load(index, owner, write);
                self.queue.push(index);
                self.clock.advance(self.costs.fault_free_frame);
                info!(
                    "Master: page fault, {} page {} loaded into free frame {} at time {}",
                    pid, page, index, self.clock
                );
                return AccessOutcome::FaultFreeFrame { frame: index };
            }

            let (index, passes) = self.select_victim();
            let victim = self
                .frames
                .release(index)
                .expect("eviction queue held an unoccupied frame");
            if let Some(old) = self.procs.get_mut(victim.slot) {
                debug_assert_eq!(old.pid, victim.pid);
                old.page_table[victim.page] = None;
            }

            self.load(index, owner, write);
            self.queue.push(index);
            self.stats.evictions += 1;
            self.clock.advance(self.costs.eviction_final);
            info!(
                "Master: page fault, evicted {} page {} from frame {} after {} passes; {} page {} loaded at time {}",
                victim.pid, victim.page, index, passes, pid, page, self.clock
            );

            AccessOutcome::FaultEviction {
                frame: index,
                victim: victim.pid,
                victim_page: victim.page,
                passes,
            }
        }

        fn load(&mut self, index: usize, owner: FrameOwner, dirty: bool) {
            self.frames
                .bind(index, owner, dirty)
                .expect("frame index from allocator out of range");
            let slot = self
                .procs
                .get_mut(owner.slot)
                .expect("faulting slot vanished");
            slot.page_table[owner.page] = Some(index);
        }

        /// Second-chance scan: referenced frames at the head lose their bit
        /// and go to the tail; the first unreferenced frame is the victim.
        /// Returns the victim and how many frames were spared on the way.
        fn select_victim(&mut self) -> (usize, usize) {
            let mut passes = 0;
            loop {
                let index = self
                    .queue
                    .pop()
                    .expect("page fault with no free frame and an empty eviction queue");
                let frame = self
                    .frames
                    .get_mut(index)
                    .expect("eviction queue index past the frame table");

                if !frame.reference {
                    return (index, passes);
                }

                frame.reference = false;
                self.queue.push(index);
                passes += 1;
                self.stats.second_chances += 1;
                self.clock.advance(self.costs.eviction_scan_step);
                trace!("Master: frame {} given a second chance", index);
            }
        }

        /// Reclaim a terminating process: every frame it held is cleared
        /// and leaves the eviction queue, then the slot is freed.
        ///
        /// Panics if `slot` is not held by `pid`.
        pub fn terminate(&mut self, slot: usize, pid: Pid) -> Vec<usize> {
            let entry = match self.procs.get_mut(slot) {
                Some(entry) if entry.pid == pid => entry,
                _ => panic!("termination of slot {slot} which {pid} does not hold"),
            };
            let (requests, created_at) = (entry.requests, entry.created_at);
            let released: Vec<usize> = entry.mapped_pages().map(|(_, frame)| frame).collect();
            entry.clear_page_table();

            for &index in &released {
                let owner = self.frames.release(index);
                debug_assert_eq!(owner.map(|o| o.pid), Some(pid));
                self.queue.remove(index);
            }
            self.procs.free(slot);
            self.stats.terminations += 1;

            info!(
                "Master: {} terminated after {} requests (admitted at {}), released {} frames, slot {} free at time {}",
                pid,
                requests,
                created_at,
                released.len(),
                slot,
                self.clock
            );
            debug_assert_eq!(self.audit(), Ok(()));
            released
        }

        /// Drop every mapping at teardown and return the final statistics.
        pub fn release(&mut self) -> Stats {
            self.frames.reset();
            self.procs.clear();
            self.queue.clear();
            self.stats.clone()
        }

        /// Check the structural invariants tying the tables together.
        pub fn audit(&self) -> Result<(), String> {
            if self.clock.nanoseconds() >= NANOS_PER_SECOND {
                return Err(format!("clock nanoseconds out of range: {}", self.clock));
            }
            if self.procs.active_count() > self.procs.capacity() {
                return Err("more active slots than capacity".to_string());
            }

            let mut occupied = 0;
            for (index, frame) in self.frames.iter().enumerate() {
                let Some(owner) = frame.owner else { continue };
                occupied += 1;
                let slot = self
                    .procs
                    .get(owner.slot)
                    .ok_or_else(|| format!("frame {index} owned by free slot {}", owner.slot))?;
                if slot.pid != owner.pid {
                    return Err(format!("frame {index} owner {} but slot holds {}", owner.pid, slot.pid));
                }
                if slot.frame_of(owner.page) != Some(index) {
                    return Err(format!("frame {index} not mapped back by {} page {}", owner.pid, owner.page));
                }
            }
            if occupied > self.frames.len() {
                return Err("more occupied frames than frames".to_string());
            }

            for (slot_index, slot) in self.procs.iter_active() {
                for (page, index) in slot.mapped_pages() {
                    let expected = FrameOwner { pid: slot.pid, slot: slot_index, page };
                    match self.frames.get(index) {
                        Some(frame) if frame.owner == Some(expected) => {}
                        _ => {
                            return Err(format!("{} page {} maps frame {index} it does not own", slot.pid, page));
                        }
                    }
                }
            }

            let mut seen = HashSet::new();
            for index in self.queue.iter() {
                if !seen.insert(index) {
                    return Err(format!("frame {index} queued twice"));
                }
                if !self.frames.get(index).is_some_and(|f| f.occupied()) {
                    return Err(format!("unoccupied frame {index} in eviction queue"));
                }
            }
            if seen.len() != occupied {
                return Err(format!("{} occupied frames but {} queued", occupied, seen.len()));
            }

            Ok(())
        }
    }

}
