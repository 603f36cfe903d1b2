//! Request extractors: authenticated users and rejection-mapped bodies.

use axum::extract::{Form, FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shopfront_auth::authorize;
use shopfront_core::error::ShopError;
use shopfront_core::models::user::{Role, User};
use shopfront_core::repository::{DEFAULT_PAGE_SIZE, Pagination};

use crate::error::ApiError;
use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// JSON body whose rejections use the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Body accepted as either JSON or `application/x-www-form-urlencoded`.
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state).await?;
            Ok(Self(value))
        } else {
            let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
            Ok(Self(value))
        }
    }
}

/// `?page=&limit=` with 1-based pages.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn pagination(&self, default_limit: u64) -> Pagination {
        Pagination::page(self.page.unwrap_or(1), self.limit.unwrap_or(default_limit))
    }

    pub fn default_pagination(&self) -> Pagination {
        self.pagination(DEFAULT_PAGE_SIZE)
    }
}

/// The access token from the `accessToken` cookie, falling back to an
/// `Authorization: Bearer` header.
fn access_token(parts: &Parts, jar: &CookieJar) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// The signed-in user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = access_token(parts, &jar).ok_or_else(|| {
            ApiError::unauthorized("User not authorized, Please login to access resource")
        })?;
        let user = state.auth.authenticate(&token).await?;
        Ok(Self(user))
    }
}

/// A signed-in administrator.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        authorize(&user, &[Role::Admin]).map_err(ShopError::from)?;
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request as HttpRequest;

    use super::*;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = HttpRequest::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn cookie_wins_over_header() {
        let p = parts(&[
            ("cookie", "accessToken=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        let jar = CookieJar::from_headers(&p.headers);
        assert_eq!(access_token(&p, &jar).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_header_is_fallback() {
        let p = parts(&[("authorization", "Bearer abc.def")]);
        let jar = CookieJar::from_headers(&p.headers);
        assert_eq!(access_token(&p, &jar).as_deref(), Some("abc.def"));

        let p = parts(&[("authorization", "Basic dXNlcjpwYXNz")]);
        let jar = CookieJar::from_headers(&p.headers);
        assert!(access_token(&p, &jar).is_none());
    }

    #[test]
    fn page_query_defaults() {
        let query = PageQuery::default();
        assert_eq!(query.pagination(5), Pagination::page(1, 5));
        let query = PageQuery {
            page: Some(3),
            limit: Some(2),
        };
        assert_eq!(query.default_pagination().offset, 4);
    }
}
