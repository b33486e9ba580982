//! Request and response bodies specific to the QKart REST API.
//!
//! Shared domain objects (products, cart entries, addresses) live in
//! `qkart-core`; this module only holds envelope types.

use serde::{Deserialize, Serialize};

use qkart_core::{AddressId, Price, ProductId};

use super::ApiError;

/// Body for `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful `POST /auth/login` response.
///
/// ```json
/// { "success": true, "token": "eyJhbGciOi...", "username": "crio.do", "balance": 5000 }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default = "accepted")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub token: String,
    pub username: String,
    pub balance: Price,
}

/// Generic `{ "success": true }` acknowledgement.
///
/// A missing `success` field counts as accepted; only an explicit `false`
/// is a refusal.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default = "accepted")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    /// Turn an explicit `"success": false` into [`ApiError::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] carrying the body's message.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                message: self.message,
            })
        }
    }
}

const fn accepted() -> bool {
    true
}

/// Body for `POST /cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUpsert<'a> {
    pub product_id: &'a ProductId,
    pub qty: u32,
}

/// Body for `POST /user/addresses`.
#[derive(Debug, Serialize)]
pub struct NewAddress<'a> {
    pub address: &'a str,
}

/// Body for `POST /cart/checkout`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest<'a> {
    pub address_id: &'a AddressId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response() {
        let body = r#"{"success":true,"token":"abc.def.ghi","username":"crio.do","balance":5000}"#;
        let login: LoginResponse = serde_json::from_str(body).unwrap();
        assert!(login.success);
        assert_eq!(login.username, "crio.do");
        assert_eq!(login.balance, Price::from_units(5000));
    }

    #[test]
    fn test_ack_refusal_is_an_error() {
        let ack: Ack = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(ack.into_result().is_ok());

        let ack: Ack = serde_json::from_str("{}").unwrap();
        assert!(ack.into_result().is_ok());

        let ack: Ack =
            serde_json::from_str(r#"{"success":false,"message":"Address not set"}"#).unwrap();
        let err = ack.into_result().unwrap_err();
        assert!(matches!(err, ApiError::Rejected { .. }));
        assert_eq!(err.backend_message(), Some("Address not set"));
    }

    #[test]
    fn test_request_bodies_use_camel_case() {
        let id = ProductId::new("p1");
        let body = serde_json::to_value(CartUpsert {
            product_id: &id,
            qty: 2,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"productId": "p1", "qty": 2}));

        let address = AddressId::new("a1");
        let body = serde_json::to_value(CheckoutRequest {
            address_id: &address,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"addressId": "a1"}));
    }
}
