//! Authenticated-actor extraction.
//!
//! Token issuance and validation happen upstream (the API gateway terminates authentication); by the time a request
//! reaches this server the actor's identity, role and supplier affiliation have been resolved and are attached as
//! trusted headers. [`AuthClaims`] lifts that triple out of the request so handlers can guard on it.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use scp_engine::db_types::Role;

use crate::errors::{AuthError, ServerError};

pub const USER_ID_HEADER: &str = "x-scp-user-id";
pub const ROLE_HEADER: &str = "x-scp-role";
pub const SUPPLIER_ID_HEADER: &str = "x-scp-supplier-id";

#[derive(Debug, Clone)]
pub struct AuthClaims {
    pub user_id: String,
    pub role: Role,
    pub supplier_id: Option<String>,
}

impl AuthClaims {
    fn try_from_request(req: &HttpRequest) -> Result<Self, ServerError> {
        let user_id = header_value(req, USER_ID_HEADER).ok_or(AuthError::MissingIdentity)?;
        let role = header_value(req, ROLE_HEADER).ok_or(AuthError::MissingIdentity)?;
        let role: Role = role.parse().map_err(|_| AuthError::PoorlyFormattedRole(role))?;
        let supplier_id = header_value(req, SUPPLIER_ID_HEADER);
        Ok(Self { user_id, role, supplier_id })
    }

    /// The acting consumer's id, or a permission error for staff callers.
    pub fn require_consumer(&self) -> Result<&str, ServerError> {
        if self.role == Role::Consumer {
            Ok(&self.user_id)
        } else {
            Err(AuthError::InsufficientPermissions("This action is for consumers.".to_string()).into())
        }
    }

    /// The acting staff member's supplier id, or a permission error for consumers (or unaffiliated staff).
    pub fn require_staff(&self) -> Result<&str, ServerError> {
        if !self.role.is_staff() {
            return Err(AuthError::InsufficientPermissions("This action is for supplier staff.".to_string()).into());
        }
        self.supplier_id.as_deref().ok_or_else(|| AuthError::MissingSupplierAffiliation.into())
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers().get(name).and_then(|v| v.to_str().ok()).filter(|s| !s.is_empty()).map(String::from)
}

impl FromRequest for AuthClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::try_from_request(req))
    }
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn claims_require_identity_and_role() {
        let req = TestRequest::get().to_http_request();
        assert!(AuthClaims::try_from_request(&req).is_err());

        let req = TestRequest::get()
            .insert_header((USER_ID_HEADER, "user-1"))
            .insert_header((ROLE_HEADER, "manager"))
            .insert_header((SUPPLIER_ID_HEADER, "supplier-1"))
            .to_http_request();
        let claims = AuthClaims::try_from_request(&req).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.require_staff().unwrap(), "supplier-1");
        assert!(claims.require_consumer().is_err());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let req = TestRequest::get()
            .insert_header((USER_ID_HEADER, "user-1"))
            .insert_header((ROLE_HEADER, "superadmin"))
            .to_http_request();
        let err = AuthClaims::try_from_request(&req).unwrap_err();
        assert!(matches!(err, ServerError::AuthenticationError(AuthError::PoorlyFormattedRole(_))));
    }

    #[test]
    fn staff_without_affiliation_cannot_act_for_a_supplier() {
        let req = TestRequest::get()
            .insert_header((USER_ID_HEADER, "rep-1"))
            .insert_header((ROLE_HEADER, "sales_rep"))
            .to_http_request();
        let claims = AuthClaims::try_from_request(&req).unwrap();
        assert!(matches!(
            claims.require_staff().unwrap_err(),
            ServerError::AuthenticationError(AuthError::MissingSupplierAffiliation)
        ));
    }
}
