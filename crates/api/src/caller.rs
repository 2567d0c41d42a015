//! Caller identity taken from request headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use domain::{Operation, OwnerId, Role, authorize};

use crate::error::ApiError;

/// Header carrying the opaque user key from the identity provider.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the caller's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Who is calling, as far as the identity collaborator told us.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub id: Option<OwnerId>,
    pub role: Option<Role>,
}

impl Caller {
    /// Checks the caller's role against the access policy.
    pub fn authorize(&self, operation: Operation) -> Result<(), ApiError> {
        let role = self.role.ok_or_else(|| {
            ApiError::Unauthorized(format!("missing {USER_ROLE_HEADER} header"))
        })?;
        authorize(role, operation)?;
        Ok(())
    }

    /// Returns true when the caller's role may act on any order.
    pub fn sees_all_orders(&self) -> bool {
        self.role
            .is_some_and(|role| authorize(role, Operation::ViewAllOrders).is_ok())
    }

    /// Returns the caller's identity, if any.
    pub fn owner(&self) -> Option<&OwnerId> {
        self.id.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_value(parts, USER_ID_HEADER)?.map(OwnerId::new);
        let role = header_value(parts, USER_ROLE_HEADER)?
            .map(|raw| raw.parse::<Role>())
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(Self { id, role })
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, ApiError> {
    let Some(value) = parts.headers.get(name) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("invalid {name} header")))?
        .trim();
    Ok((!value.is_empty()).then_some(value))
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    use super::*;

    async fn extract(headers: &[(&str, &str)]) -> Result<Caller, ApiError> {
        let mut builder = Request::builder().uri("/api/foods");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_identity_and_role() {
        let caller = extract(&[("x-user-id", "alice"), ("x-user-role", "ROLE_STAFF")])
            .await
            .unwrap();

        assert_eq!(caller.owner(), Some(&OwnerId::new("alice")));
        assert_eq!(caller.role, Some(Role::Staff));
        assert!(caller.sees_all_orders());
    }

    #[tokio::test]
    async fn blank_headers_count_as_missing() {
        let caller = extract(&[("x-user-id", "  ")]).await.unwrap();
        assert_eq!(caller, Caller::default());

        let err = caller.authorize(Operation::ViewCatalog).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_role_is_a_bad_request() {
        let err = extract(&[("x-user-role", "chef")]).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn customer_is_denied_staff_operations() {
        let caller = extract(&[("x-user-role", "customer")]).await.unwrap();

        assert!(caller.authorize(Operation::PlaceOrder).is_ok());
        assert!(!caller.sees_all_orders());
        let err = caller.authorize(Operation::FulfillOrder).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }
}
