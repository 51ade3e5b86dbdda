mod launch;
pub use launch::LaunchRequest;

mod termination;
pub use termination::TerminationRequest;
