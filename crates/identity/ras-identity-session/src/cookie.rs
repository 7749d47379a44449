//! A typed value stored in a single private cookie.

use crate::{SessionConfig, SessionError, SessionResult};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;

/// Named private cookie holding a JSON-encoded `T`.
pub struct CookieSlot<T> {
    name: String,
    path: String,
    max_age: chrono::Duration,
    secure: bool,
    same_site: SameSite,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for CookieSlot<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            path: self.path.clone(),
            max_age: self.max_age,
            secure: self.secure,
            same_site: self.same_site,
            _value: PhantomData,
        }
    }
}

impl<T> CookieSlot<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            path: config.path.clone(),
            max_age: config.max_age,
            secure: config.secure,
            same_site: config.same_site,
            _value: PhantomData,
        }
    }

    /// Same attributes as `config` but a different name and lifetime.
    pub fn named(name: impl Into<String>, max_age: chrono::Duration, config: &SessionConfig) -> Self {
        Self {
            name: name.into(),
            max_age,
            ..Self::new(config)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the value. `Ok(None)` when the cookie is absent or fails to
    /// decrypt; `Err` when it decrypts but does not decode.
    pub fn read(&self, jar: &PrivateCookieJar) -> SessionResult<Option<T>> {
        let Some(cookie) = jar.get(&self.name) else {
            return Ok(None);
        };

        serde_json::from_str(cookie.value())
            .map(Some)
            .map_err(SessionError::Decode)
    }

    pub fn write(&self, jar: PrivateCookieJar, value: &T) -> SessionResult<PrivateCookieJar> {
        let payload = serde_json::to_string(value).map_err(SessionError::Encode)?;

        let cookie = Cookie::build((self.name.clone(), payload))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path(self.path.clone())
            .max_age(time::Duration::seconds(self.max_age.num_seconds()))
            .build();

        Ok(jar.add(cookie))
    }

    pub fn clear(&self, jar: PrivateCookieJar) -> PrivateCookieJar {
        let cookie = Cookie::build((self.name.clone(), ""))
            .path(self.path.clone())
            .build();
        jar.remove(cookie)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::http::{HeaderMap, HeaderValue};
    use axum::response::IntoResponse;
    use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar};

    /// Parsed `Set-Cookie` headers a jar would emit.
    pub fn set_cookies(jar: PrivateCookieJar) -> Vec<Cookie<'static>> {
        let response = jar.into_response();
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| Cookie::parse(value.to_str().unwrap().to_string()).unwrap())
            .collect()
    }

    /// Simulate the browser sending the live cookies back on the next request.
    pub fn next_request(jar: PrivateCookieJar, key: &Key) -> PrivateCookieJar {
        let mut headers = HeaderMap::new();
        for cookie in set_cookies(jar) {
            if cookie.value().is_empty() {
                continue;
            }
            headers.append(
                COOKIE,
                HeaderValue::from_str(&format!("{}={}", cookie.name(), cookie.value())).unwrap(),
            );
        }
        PrivateCookieJar::from_headers(&headers, key.clone())
    }
}
