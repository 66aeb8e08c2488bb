/// Settings page for a node
///
/// A bare HTML form the orchestrator embeds so users can edit a node's email
/// settings. The form posts back to `/node/{id}/config` with the same token.

use super::NodeConfig;
use askama::Template;

#[derive(Template)]
#[template(path = "config.html")]
struct ConfigPage<'a> {
    id: &'a str,
    auth_token: &'a str,
    config: &'a NodeConfig,
}

/// Render the settings form for `node_id`, pre-filled with `config`
pub fn render_config_page(
    node_id: &str,
    auth_token: &str,
    config: &NodeConfig,
) -> Result<String, askama::Error> {
    ConfigPage {
        id: node_id,
        auth_token,
        config,
    }
    .render()
}
