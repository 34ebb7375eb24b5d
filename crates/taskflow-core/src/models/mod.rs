pub mod definition;
pub mod error;
pub mod instance;
pub mod task;

pub use definition::ProcessDefinitionConfig;
pub use error::{CoreError, CoreErrorKind};
pub use instance::{EXTERNAL_KEY_PROPERTY, InstanceId, ProcessInstance};
pub use task::{BpmTask, TaskId};
