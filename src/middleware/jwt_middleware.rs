/// JWT Authentication Middleware
///
/// Runs the authentication gate in front of protected resources and injects
/// the resolved `PublicIdentity` into request extensions for route handlers
/// (`web::ReqData<PublicIdentity>`).

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::{authenticate, extract_access_token, AuthService, ACCESS_TOKEN_COOKIE};

/// JWT middleware for protecting routes
///
/// Token comes from the `accessToken` cookie or `Authorization: Bearer`,
/// cookie first. Requests that fail the gate never reach the handler.
#[derive(Clone)]
pub struct JwtMiddleware {
    auth: Arc<AuthService>,
}

impl JwtMiddleware {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            auth: self.auth.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    auth: Arc<AuthService>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let cookie = req.cookie(ACCESS_TOKEN_COOKIE);
        let token = extract_access_token(
            cookie.as_ref().map(|c| c.value()),
            req.headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok()),
        );

        let auth = self.auth.clone();
        let service = self.service.clone();

        Box::pin(async move {
            // logged once by LoggerMiddleware
            let identity = authenticate(auth.store(), auth.issuer(), token.as_deref()).await?;

            tracing::debug!(
                user_id = %identity.id,
                username = %identity.username,
                "Access token validated"
            );
            req.extensions_mut().insert(identity);

            service.call(req).await
        })
    }
}
