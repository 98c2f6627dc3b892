pub mod channel;
pub mod clock;
pub mod eviction_queue;
pub mod frame_table;
pub mod memory_manager;
pub mod proc;
pub mod request;
pub mod scheduler;
pub mod spawner;
