pub mod spawner {
    use std::io::Error;

    use crate::channel::channel::ClientEndpoint;
    use crate::proc::proc::Pid;

    /// Minimal process-creation surface the manager needs.
    ///
    /// The manager decides *when* and *where* a client runs; how it is run
    /// (threads, tasks, a scripted fake in tests) belongs to the implementor.
    pub trait ClientSpawner {
        /// Start a client bound to `slot`. An error here is fatal to the run.
        fn spawn(&mut self, pid: Pid, slot: usize, endpoint: ClientEndpoint) -> Result<(), Error>;
        /// Forget a client that exited on its own after a termination request.
        fn retire(&mut self, pid: Pid);
        /// Ask every running client to stop. Returns how many were signalled.
        fn stop_all(&mut self) -> usize;
        /// Wait for every signalled or retired client. Returns how many were reaped.
        fn reap_all(&mut self) -> usize;
    }
}
