//! API key authentication middleware.
//!
//! Every protected request passes through here:
//! 1. Extract the API key from the Authorization header
//! 2. Hash it and look the hash up through the ledger store
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::{
    error::AppError,
    store::{SharedStore, StoreError},
};

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers can extract it with
/// `Extension<AuthContext>` when they need to know which client is calling.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated API key
    pub api_key_id: i64,

    /// Name of the business making the request
    pub business_name: String,
}

/// API key authentication middleware function.
///
/// Expects `Authorization: Bearer <key>`. The presented key is hashed with
/// SHA-256 and looked up against active keys; a miss is a 401, never a
/// detail about why.
pub async fn auth_middleware(
    State(store): State<SharedStore>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidApiKey)?;

    let api_key = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::InvalidApiKey)?;

    // Only the hash ever touches storage.
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    let key_hash = hex::encode(hasher.finalize());

    let record = match store.get_api_key_by_hash(&key_hash).await {
        Ok(record) => record,
        Err(StoreError::NotFound) => return Err(AppError::InvalidApiKey),
        Err(err) => return Err(err.into()),
    };

    let auth_context = AuthContext {
        api_key_id: record.id,
        business_name: record.business_name,
    };
    tracing::debug!(
        api_key_id = auth_context.api_key_id,
        business = %auth_context.business_name,
        "authenticated request"
    );

    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}
