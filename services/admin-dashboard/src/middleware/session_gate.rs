use crate::auth::SESSION_VALUE;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Redirects requests without the session cookie to `/login`.
///
/// `/login` and everything under `/api/auth` stay reachable.
pub struct SessionGate {
    cookie_name: Rc<str>,
}

impl SessionGate {
    pub fn new(cookie_name: &str) -> Self {
        Self {
            cookie_name: Rc::from(cookie_name),
        }
    }
}

/// Paths reachable without a session
pub fn is_public(path: &str) -> bool {
    path == "/login" || path.starts_with("/api/auth")
}

impl<S, B> Transform<S, ServiceRequest> for SessionGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionGateMiddleware {
            service: Rc::new(service),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct SessionGateMiddleware<S> {
    service: Rc<S>,
    cookie_name: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for SessionGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let authenticated = req
            .cookie(&self.cookie_name)
            .map_or(false, |c| c.value() == SESSION_VALUE);

        if authenticated || is_public(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        tracing::debug!(path = req.path(), "No session, redirecting to login");
        let response = HttpResponse::Found()
            .insert_header((header::LOCATION, "/login"))
            .finish()
            .map_into_right_body();
        Box::pin(async move { Ok(req.into_response(response)) })
    }
}
