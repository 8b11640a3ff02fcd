// Re-export model types and service functions
pub mod model;
pub mod service;
pub mod http;

pub use model::{Category, Task, CreateTaskPayload, UpdateTaskPayload, TaskChanges, NewTask};
pub use service::{PageRequest, TaskPage, UpdateOutcome};
