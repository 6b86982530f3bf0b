use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::Response,
};
use jsonwebtoken::TokenData;
use tracing::warn;

use crate::{
    AppState,
    config::Constants,
    structure::users::Claims,
    utils::{error_response, jwt::verify_jwt},
};

/// Caller holding a valid administrator token.
#[derive(Debug)]
pub struct AdminUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || error_response(StatusCode::UNAUTHORIZED, "Not authorized, no token");

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(unauthorized)?
            .to_str()
            .map_err(|_| unauthorized())?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(unauthorized)?;

        let token_data: TokenData<Claims> = verify_jwt(&state.jwt_secret, token).map_err(|e| {
            warn!(error = %e, "rejected bearer token");
            error_response(StatusCode::UNAUTHORIZED, "Not authorized, token failed")
        })?;

        if token_data.claims.role != Constants::ADMIN_ROLE {
            return Err(error_response(
                StatusCode::FORBIDDEN,
                "Access denied. Admin only.",
            ));
        }

        Ok(AdminUser {
            user_id: token_data.claims.sub,
        })
    }
}
