pub mod event_log;
pub mod provisioning;
