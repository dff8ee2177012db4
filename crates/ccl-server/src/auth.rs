use async_trait::async_trait;
use axum::http::HeaderMap;

use ccl_types::{Actor, FacilityId, FacilityType, Role};

use crate::error::{ServerError, ServerResult};

/// Boundary to the external identity provider.
///
/// CCL authenticates no one; whatever sits in front of it (gateway, IdP
/// middleware) asserts the caller's identity and this trait turns that
/// assertion into an [`Actor`].
#[async_trait]
pub trait ActorProvider: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> ServerResult<Actor>;
}

/// Resolves the actor from gateway-asserted headers: `x-actor-id`,
/// `x-facility-id`, `x-facility-type`, `x-role`.
pub struct HeaderActorProvider;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> ServerResult<&'a str> {
    headers
        .get(name)
        .ok_or_else(|| ServerError::Unauthenticated(format!("missing {name} header")))?
        .to_str()
        .map_err(|_| ServerError::Unauthenticated(format!("{name} header is not valid text")))
}

#[async_trait]
impl ActorProvider for HeaderActorProvider {
    async fn resolve(&self, headers: &HeaderMap) -> ServerResult<Actor> {
        let user_id = header(headers, "x-actor-id")?;
        let facility = header(headers, "x-facility-id")?;
        let facility_type: FacilityType = header(headers, "x-facility-type")?
            .parse()
            .map_err(|e| ServerError::Unauthenticated(format!("{e}")))?;
        let role: Role = header(headers, "x-role")?
            .parse()
            .map_err(|e| ServerError::Unauthenticated(format!("{e}")))?;
        Ok(Actor::new(
            user_id,
            FacilityId::new(facility),
            facility_type,
            role,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("x-actor-id", HeaderValue::from_static("u1"));
        h.insert("x-facility-id", HeaderValue::from_static("fac-ph"));
        h.insert("x-facility-type", HeaderValue::from_static("pharmacy"));
        h.insert("x-role", HeaderValue::from_static("operator"));
        h
    }

    #[tokio::test]
    async fn resolves_full_actor() {
        let actor = HeaderActorProvider.resolve(&headers()).await.unwrap();
        assert_eq!(actor.user_id, "u1");
        assert_eq!(actor.facility, FacilityId::new("fac-ph"));
        assert_eq!(actor.facility_type, FacilityType::Pharmacy);
        assert_eq!(actor.role, Role::Operator);
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let mut h = headers();
        h.remove("x-role");
        let err = HeaderActorProvider.resolve(&h).await.unwrap_err();
        assert!(matches!(err, ServerError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn bad_role_is_unauthenticated() {
        let mut h = headers();
        h.insert("x-role", HeaderValue::from_static("admin"));
        let err = HeaderActorProvider.resolve(&h).await.unwrap_err();
        assert!(matches!(err, ServerError::Unauthenticated(_)));
    }
}
