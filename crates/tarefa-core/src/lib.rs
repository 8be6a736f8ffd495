pub mod error;
pub mod memory;
pub mod message;
pub mod queue;
pub mod registry;
pub mod runner;
pub mod telemetry;

pub use error::{DeleteError, EnqueueError, ReceiveError};
pub use memory::MemoryQueue;
pub use message::{Message, JOB_KEY};
pub use queue::{DeleteToken, Delivery, Queue, QueueConfig};
pub use registry::{JobError, JobFunc, Registry};
pub use runner::Runner;
