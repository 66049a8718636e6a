//! Request capability used by the guard and the claims accessors.
//!
//! The core never looks at a concrete request type. Anything that can read a
//! header, read a cookie and hold the verified `Claims` can be authenticated.

use std::borrow::Cow;

use axum::http::{Extensions, HeaderMap, Request, header::COOKIE, request::Parts};

use crate::services::auth::claims::Claims;

pub trait AuthRequest {
    /// Case-insensitive lookup of one header.
    fn header(&self, name: &str) -> Option<Cow<'_, str>>;

    fn cookie(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Claims attached by the guard, if any.
    fn claims(&self) -> Option<&Claims>;

    fn set_claims(&mut self, claims: Claims);
}

/// Finds the request among a handler's arguments.
///
/// `None` means the handler was called without a request, which is an
/// integration bug rather than an authentication failure.
pub trait FindRequest {
    fn find_request(&mut self) -> Option<&mut dyn AuthRequest>;
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    // Non UTF-8 bytes are kept (lossy) so a present header is never reported as missing.
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| Cow::Borrowed(value.trim()))
        })
}

fn stored_claims(extensions: &Extensions) -> Option<&Claims> {
    extensions.get::<Claims>()
}

impl<B> AuthRequest for Request<B> {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        header_value(self.headers(), name)
    }

    fn cookie(&self, name: &str) -> Option<Cow<'_, str>> {
        cookie_value(self.headers(), name)
    }

    fn claims(&self) -> Option<&Claims> {
        stored_claims(self.extensions())
    }

    fn set_claims(&mut self, claims: Claims) {
        self.extensions_mut().insert(claims);
    }
}

impl AuthRequest for Parts {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        header_value(&self.headers, name)
    }

    fn cookie(&self, name: &str) -> Option<Cow<'_, str>> {
        cookie_value(&self.headers, name)
    }

    fn claims(&self) -> Option<&Claims> {
        stored_claims(&self.extensions)
    }

    fn set_claims(&mut self, claims: Claims) {
        self.extensions.insert(claims);
    }
}

impl<B> FindRequest for Request<B> {
    fn find_request(&mut self) -> Option<&mut dyn AuthRequest> {
        Some(self)
    }
}

impl FindRequest for Parts {
    fn find_request(&mut self) -> Option<&mut dyn AuthRequest> {
        Some(self)
    }
}

impl<T: FindRequest> FindRequest for &mut T {
    fn find_request(&mut self) -> Option<&mut dyn AuthRequest> {
        (**self).find_request()
    }
}

impl<T: FindRequest> FindRequest for Option<T> {
    fn find_request(&mut self) -> Option<&mut dyn AuthRequest> {
        self.as_mut().and_then(|inner| inner.find_request())
    }
}

// Handlers with extra arguments take the request first: `(request, path, ...)`.
macro_rules! impl_find_request_for_tuple {
    ($($ty:ident),*) => {
        impl<R: FindRequest, $($ty),*> FindRequest for (R, $($ty),*) {
            fn find_request(&mut self) -> Option<&mut dyn AuthRequest> {
                self.0.find_request()
            }
        }
    };
}

impl_find_request_for_tuple!(T1);
impl_find_request_for_tuple!(T1, T2);
impl_find_request_for_tuple!(T1, T2, T3);
