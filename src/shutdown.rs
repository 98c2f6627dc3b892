pub mod shutdown {
    use std::fmt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    use log::warn;

    use crate::error::error::Result;

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum ShutdownReason {
        /// the wall-clock run budget ran out.
        Deadline,
        Interrupt,
        /// every process that will ever exist has been created and reaped.
        Completed,
        Fatal,
    }

    impl fmt::Display for ShutdownReason {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let text = match self {
                ShutdownReason::Deadline => "run time limit reached",
                ShutdownReason::Interrupt => "interrupted",
                ShutdownReason::Completed => "all processes finished",
                ShutdownReason::Fatal => "fatal error",
            };
            f.write_str(text)
        }
    }

    /// Teardown steps, in the order they run.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum ShutdownStage {
        StopAdmitting,
        SignalClients,
        ReapClients,
        ReleaseTables,
        ReleaseChannel,
        CloseLog,
    }

    struct Inner {
        deadline: Instant,
        interrupted: AtomicBool,
        torn_down: AtomicBool,
    }

    /// Shared between the manager loop and the interrupt handler.
    ///
    /// The handler only raises a flag; teardown itself always runs on the
    /// manager's thread, at most once, whichever trigger gets there first.
    #[derive(Clone)]
    pub struct ShutdownController {
        inner: Arc<Inner>,
    }

    impl ShutdownController {
        pub fn new(budget: Duration) -> ShutdownController {
            ShutdownController {
                inner: Arc::new(Inner {
                    deadline: Instant::now() + budget,
                    interrupted: AtomicBool::new(false),
                    torn_down: AtomicBool::new(false),
                }),
            }
        }

        pub fn deadline(&self) -> Instant {
            self.inner.deadline
        }

        pub fn interrupt(&self) {
            self.inner.interrupted.store(true, Ordering::SeqCst);
        }

        /// Route SIGINT to `interrupt`. Only one handler may be installed
        /// per process.
        pub fn install_interrupt_handler(&self) -> Result<()> {
            let controller = self.clone();
            ctrlc::set_handler(move || {
                warn!("Master: interrupt received");
                controller.interrupt();
            })?;
            Ok(())
        }

        /// An external trigger that has fired, if any. Interrupts win over
        /// the deadline.
        pub fn pending(&self, now: Instant) -> Option<ShutdownReason> {
            if self.inner.interrupted.load(Ordering::SeqCst) {
                return Some(ShutdownReason::Interrupt);
            }
            if now >= self.inner.deadline {
                return Some(ShutdownReason::Deadline);
            }
            None
        }

        /// Claim the right to tear down. True exactly once.
        pub fn begin_teardown(&self) -> bool {
            !self.inner.torn_down.swap(true, Ordering::SeqCst)
        }

        pub fn is_torn_down(&self) -> bool {
            self.inner.torn_down.load(Ordering::SeqCst)
        }
    }

}
