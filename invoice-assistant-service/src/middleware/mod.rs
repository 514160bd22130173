pub mod identity;

pub use identity::{identity_middleware, TenantClaims, TenantIdentity};
