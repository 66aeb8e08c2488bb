/// node-mail-sender: email step for Proxeus workflows
///
/// An external workflow node that sends an email through SparkPost whenever the
/// orchestrator reaches it, then hands the workflow payload back unchanged.

// Environment-driven configuration
pub mod config;

// Provider-neutral email types and the SparkPost sender
pub mod email;

// Per-node settings, body substitution, config store client and settings form
pub mod node;

// Announcement to the parent orchestrator
pub mod registration;

// HTTP API layer - node callbacks behind the JWT gate
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use config::Config;
pub use email::{Email, EmailSender};
pub use node::NodeConfig;
pub use server::start_server;
