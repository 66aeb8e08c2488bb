/// HTTP API Layer
///
/// Endpoints the orchestrator calls on this node:
/// - Token verification for all node routes
/// - Workflow step execution (send email, pass payload on)
/// - Settings form for per-node email configuration

// JWT gate for /node/{id}/* routes
pub mod auth;

// Node callback and settings endpoints
pub mod nodes;

// Re-export router builders
pub use auth::JwtVerifier;
pub use nodes::{create_node_routes, AppState};
