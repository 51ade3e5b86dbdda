mod host;
pub use host::HostOption;
