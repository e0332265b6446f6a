//! Header helpers for integration tests.
//!
//! Operator routes expect `x-courier-tenant-id`; the scheduler trigger expects
//! `x-scheduler-secret`. Tests build these directly.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use courier_core::identity::TENANT_HEADER;
use courier_domain::id::TenantId;

pub const SCHEDULER_SECRET_HEADER: &str = "x-scheduler-secret";

/// Tenant identity injected into test requests.
pub struct MockTenant {
    pub tenant_id: TenantId,
}

impl MockTenant {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn header(&self) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static(TENANT_HEADER),
            HeaderValue::from_str(&self.tenant_id.to_string()).unwrap(),
        )
    }

    pub fn headers(&self) -> HeaderMap {
        let (name, value) = self.header();
        let mut map = HeaderMap::new();
        map.insert(name, value);
        map
    }
}

/// `x-scheduler-secret` header carrying `secret`.
pub fn scheduler_secret_header(secret: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(SCHEDULER_SECRET_HEADER),
        HeaderValue::from_str(secret).unwrap(),
    )
}
