pub mod request {
    use crate::clock::clock::SimClock;
    use crate::proc::proc::{Pid, PAGE_SIZE};

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum RequestKind {
        Read,
        Write,
    }

    /// Manager-bound message.
    ///
    /// Clients never read the clock; `stamped` is filled in by the manager
    /// with its own clock when the request is dequeued.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct MemoryRequest {
        pub sender: Pid,
        pub slot: usize,
        pub page: usize,
        pub address: u32,
        pub kind: RequestKind,
        pub terminate: bool,
        pub stamped: Option<SimClock>,
    }

    impl MemoryRequest {
        pub fn access(sender: Pid, slot: usize, address: u32, kind: RequestKind) -> MemoryRequest {
            MemoryRequest {
                sender,
                slot,
                page: (address / PAGE_SIZE) as usize,
                address,
                kind,
                terminate: false,
                stamped: None,
            }
        }

        pub fn terminate(sender: Pid, slot: usize) -> MemoryRequest {
            MemoryRequest {
                sender,
                slot,
                page: 0,
                address: 0,
                kind: RequestKind::Read,
                terminate: true,
                stamped: None,
            }
        }

        pub fn stamp(&mut self, now: SimClock) {
            self.stamped = Some(now);
        }
    }

    /// Process-bound message; carries nothing but permission to proceed.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct MemoryResponse {
        pub target: Pid,
        pub granted: bool,
    }

    /// How the manager resolved a single access.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum AccessOutcome {
        Hit { frame: usize, dirty_read: bool },
        FaultFreeFrame { frame: usize },
        FaultEviction { frame: usize, victim: Pid, victim_page: usize, passes: usize },
    }

    impl AccessOutcome {
        pub fn frame(&self) -> usize {
            match *self {
                AccessOutcome::Hit { frame, .. }
                | AccessOutcome::FaultFreeFrame { frame }
                | AccessOutcome::FaultEviction { frame, .. } => frame,
            }
        }

        pub fn is_fault(&self) -> bool {
            !matches!(self, AccessOutcome::Hit { .. })
        }
    }

}
