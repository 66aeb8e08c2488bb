/// Token gate for node routes
///
/// The orchestrator calls every `/node/{id}/...` route with an HS256 JWT in the
/// `auth` query parameter, signed with the secret exchanged at registration.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Query parameter carrying the token
pub const AUTH_QUERY_PARAM: &str = "auth";

/// Claims the orchestrator puts into node tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeClaims {
    /// Node id the call is made for; may be empty
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Verified token attached to the request for handlers
#[derive(Debug, Clone)]
pub struct NodeAuth {
    pub claims: NodeClaims,
    /// Raw token, forwarded to the config store and the settings form
    pub token: String,
}

impl NodeAuth {
    /// Node id from the claims, falling back to the path segment
    pub fn node_id(&self, path_id: &str) -> String {
        if self.claims.id.is_empty() {
            path_id.to_string()
        } else {
            self.claims.id.clone()
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::MissingToken => (StatusCode::BAD_REQUEST, "missing or malformed jwt"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid or expired jwt"),
        };
        let body = Json(json!({
            "error": error_message,
        }));
        (status, body).into_response()
    }
}

/// HS256 verifier for node tokens
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Orchestrator tokens may come without `exp`; it is still checked when present.
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<NodeClaims, AuthError> {
        decode::<NodeClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("🔒 Rejected node token: {}", e);
                AuthError::InvalidToken
            })
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    #[serde(default)]
    auth: Option<String>,
}

/// Middleware rejecting node calls without a valid token
pub async fn require_node_token(
    State(verifier): State<Arc<JwtVerifier>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match Query::<TokenQuery>::try_from_uri(request.uri()) {
        Ok(Query(TokenQuery { auth: Some(token) })) if !token.is_empty() => token,
        _ => return AuthError::MissingToken.into_response(),
    };

    let claims = match verifier.verify(&token) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(NodeAuth { claims, token });
    next.run(request).await
}
