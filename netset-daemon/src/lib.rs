/*!
 * NETSET Host Network Settings Daemon
 * Queries and reconfigures the host's interfaces, WI-FI and DNS by
 * driving the OS network tooling through one serialized command channel.
 */

pub mod config;
pub mod error;
pub mod exec;
pub mod ipc;
pub mod network;
pub mod table;
