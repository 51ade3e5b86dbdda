pub mod backend;
pub mod bus;
pub mod error;
pub mod intake;
pub mod metrics;
pub mod orchestrator;
pub mod publisher;
pub mod router;
pub mod store;

pub mod prelude {
    pub use crate::backend::{Backend, BackendError, BackendRef};
    pub use crate::bus::{BusError, Message, Messenger, NotificationBus, Transport};
    pub use crate::error::CoreError;
    pub use crate::intake::{JobCompletion, JobIntake};
    pub use crate::metrics::{MetricsBackend, MetricsHandle, Outcome};
    pub use crate::orchestrator::{LaunchService, TerminationService};
    pub use crate::publisher::{CycleReport, Publisher};
    pub use crate::router::{LabelRouter, RouteTarget};
    pub use crate::store::{JobStore, MemoryJobStore, PutOutcome, StoreError};
}
