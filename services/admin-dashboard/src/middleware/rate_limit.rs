use crate::errors::DashboardError;
use crate::metrics::LOGIN_ATTEMPTS_TOTAL;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error,
};
use futures_util::future::LocalBoxFuture;
use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota,
    RateLimiter as GovernorRateLimiter,
};
use std::future::{ready, Ready};
use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::Arc;

type Limiter = GovernorRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Tracked clients before idle entries are pruned
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Throttles `POST /api/auth` per client address; every other request
/// passes untouched.
///
/// Clones share the same quotas, so build it once and clone into each worker.
#[derive(Clone)]
pub struct LoginRateLimiter {
    limiter: Arc<Limiter>,
}

impl LoginRateLimiter {
    pub fn new(attempts_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(per_minute);
        Self {
            limiter: Arc::new(GovernorRateLimiter::keyed(quota)),
        }
    }

    /// Take one login attempt from `client`'s quota; false when exhausted
    pub fn check(&self, client: &str) -> bool {
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&client.to_string()).is_ok()
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoginRateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoginRateLimiterMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoginRateLimiterMiddleware {
            service: Rc::new(service),
            limiter: self.clone(),
        }))
    }
}

pub struct LoginRateLimiterMiddleware<S> {
    service: Rc<S>,
    limiter: LoginRateLimiter,
}

impl<S, B> Service<ServiceRequest> for LoginRateLimiterMiddleware<S>
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
        let is_login = *req.method() == Method::POST && req.path() == "/api/auth";

        if is_login {
            let client = req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string();

            if !self.limiter.check(&client) {
                LOGIN_ATTEMPTS_TOTAL.with_label_values(&["rate_limited"]).inc();
                tracing::warn!(peer = %client, "Login rate limit exceeded");
                let error = Error::from(DashboardError::RateLimited);
                return Box::pin(async move { Err(error) });
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}
