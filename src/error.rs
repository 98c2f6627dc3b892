pub mod error {
    use std::io;

    use paging_core::proc::proc::Pid;
    use thiserror::Error;

    pub type Result<T> = std::result::Result<T, SimError>;

    /// Errors that end the whole simulation. Anything recoverable is logged
    /// by the manager loop and never becomes a `SimError`.
    #[derive(Error, Debug)]
    pub enum SimError {
        #[error("invalid configuration: {0}")]
        Config(String),

        #[error("failed to set up paging tables: {0}")]
        Tables(#[source] io::Error),

        #[error("failed to spawn {pid} into slot {slot}: {source}")]
        Spawn {
            pid: Pid,
            slot: usize,
            #[source]
            source: io::Error,
        },

        #[error("failed to open log: {0}")]
        LogFile(#[source] io::Error),

        #[error("failed to install logger: {0}")]
        Logger(#[from] log::SetLoggerError),

        #[error("failed to install interrupt handler: {0}")]
        Interrupt(#[from] ctrlc::Error),
    }
}
