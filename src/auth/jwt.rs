use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Claims issued by the identity provider. Tokens are minted elsewhere; this
/// service only verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Auth-provider user id
    pub sub: String,
    /// `admin` or `employee`
    pub role: String,
    /// Present only if this user is linked to an employee record
    #[serde(default)]
    pub employee_id: Option<u64>,
    pub exp: usize,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(secret: &str, exp: usize) -> String {
        let claims = Claims {
            sub: "5b1f6a34-0c1e-4c43-9d7e-0c3f3a1d2b11".into(),
            role: "employee".into(),
            employee_id: Some(7),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_token_signed_with_the_shared_secret() {
        let claims = verify_token(&token("s3cret", 4_000_000_000), "s3cret").unwrap();
        assert_eq!(claims.employee_id, Some(7));
        assert_eq!(claims.role, "employee");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        assert!(verify_token(&token("other", 4_000_000_000), "s3cret").is_err());
        assert!(verify_token(&token("s3cret", 1_000), "s3cret").is_err());
    }
}
