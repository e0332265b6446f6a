//! Tenant identity header extractor.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;

use courier_domain::id::TenantId;

pub const TENANT_HEADER: &str = "x-courier-tenant-id";

/// Operator tenant injected upstream via `x-courier-tenant-id`.
///
/// Returns 401 if the header is absent or not a UUID.
#[derive(Debug, Clone, Copy)]
pub struct TenantIdentity {
    pub tenant_id: TenantId,
}

impl<S> FromRequestParts<S> for TenantIdentity
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // Header is read synchronously so the returned future borrows nothing.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let tenant_id = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<TenantId>().ok());

        async move {
            let tenant_id = tenant_id.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self { tenant_id })
        }
    }
}
