use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Role forwarded by the identity provider. Anything unrecognized is
/// treated as a plain user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Host,
    Superadmin,
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s {
            "host" => Role::Host,
            "superadmin" => Role::Superadmin,
            _ => Role::User,
        }
    }
}

/// The authenticated principal, extracted from the identity headers the
/// auth gateway forwards (`x-user-id`, `x-user-email`, `x-user-role`,
/// `x-host-approved`). This service trusts them as given; absence means
/// an anonymous request. Extraction never fails, authorization decisions
/// live in the handlers.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub role: Role,
    pub host_approved: bool,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Superadmin
    }

    /// Whether this principal may create or manage scooter listings.
    pub fn can_manage_fleet(&self) -> bool {
        match self.role {
            Role::Superadmin => true,
            Role::Host => self.host_approved,
            Role::User => false,
        }
    }

    /// The owning rider of a booking: matched by user id when the booking
    /// was made logged-in, by rider email otherwise.
    pub fn owns_booking(&self, booking_user_id: Option<Uuid>, rider_email: Option<&str>) -> bool {
        if let (Some(me), Some(owner)) = (self.user_id, booking_user_id) {
            if me == owner {
                return true;
            }
        }
        matches!((self.email.as_deref(), rider_email), (Some(a), Some(b)) if a == b)
    }

    fn from_parts(parts: &Parts) -> Self {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Principal {
            user_id: header("x-user-id").and_then(|v| Uuid::parse_str(&v).ok()),
            email: header("x-user-email"),
            role: header("x-user-role")
                .map(|v| Role::parse(&v))
                .unwrap_or(Role::User),
            host_approved: header("x-host-approved").as_deref() == Some("true"),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Principal::from_parts(parts))
    }
}
