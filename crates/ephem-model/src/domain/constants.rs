//! Common model-level constants.
//!
//! Well-known label values shared by the router, the intake and the backends.

/// Marker label carried by every job that asks for a self-hosted worker.
///
/// The launch router strips this label before comparing a job's labels with a route target,
/// so a target declared as `[vm, ubuntu]` matches jobs labelled `[self-hosted, ubuntu, vm]`.
pub const SELF_HOSTED_LABEL: &str = "self-hosted";

/// Separator between the runner name prefix and the job ID (`<prefix>-<id>`).
pub const RUNNER_NAME_SEPARATOR: char = '-';
