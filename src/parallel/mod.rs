pub mod batch;
pub mod pool;

pub use batch::{batch_count_for, batch_ranges};
pub use pool::WorkerPool;
