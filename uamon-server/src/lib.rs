//! Data change monitoring engine for an OPC UA style server.
//!
//! The crate provides the server-side machinery behind the
//! CreateMonitoredItems family of services: subscriptions, monitored
//! items with bounded notification queues, timer driven sampling and
//! encoded-value change detection. The wire protocol, sessions and the
//! publish response path live elsewhere; this crate exposes the queue
//! surface they drain ([`subscriptions::Subscription`]) and consumes an
//! [`address_space::AddressSpaceReader`] to resolve attribute reads.
//!
//! The `subscriptions` cargo feature (on by default) gates the whole
//! monitoring subsystem.

pub mod address_space;
pub mod config;
pub mod constants;
#[cfg(feature = "subscriptions")]
pub mod subscriptions;

pub use config::MonitorLimits;
#[cfg(feature = "subscriptions")]
pub use subscriptions::MonitoringEngine;
