// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use http::header::{self, HeaderMap, HeaderValue, InvalidHeaderValue};
use http::Method;
use snafu::{ResultExt, Snafu};

const ALLOWED_METHODS: &str = "POST, GET, DELETE, PUT, OPTIONS";
const ALLOWED_HEADERS: &str = "Authorization, Content-Type, Accept";
/// Seconds a browser may cache a preflight answer.
const MAX_AGE: &str = "3600";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("allowed origin must not be empty"))]
    EmptyOrigin,

    #[snafu(display("allowed origin '{}' is not a valid header value: {}", origin, source))]
    InvalidOrigin {
        origin: String,
        source: InvalidHeaderValue,
    },
}

/// What to do with a request, based on its `Origin` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No `Origin` header: same-origin or non-browser caller.
    NoOrigin,
    /// Allowed origin, substantive request: continue and add CORS headers.
    Allow,
    /// Allowed origin, `OPTIONS`: answer here.
    Preflight,
    /// Some other origin: continue without CORS headers.
    Reject,
}

/// Single-origin CORS policy.
#[derive(Debug, Clone)]
pub struct OriginGuard {
    allowed: HeaderValue,
}

impl OriginGuard {
    pub fn new(allowed_origin: &str) -> Result<Self, Error> {
        if allowed_origin.trim().is_empty() {
            return EmptyOriginSnafu.fail();
        }
        let allowed = HeaderValue::from_str(allowed_origin).context(InvalidOriginSnafu {
            origin: allowed_origin,
        })?;
        Ok(Self { allowed })
    }

    /// Exact byte comparison, no wildcard, prefix or suffix matching.
    pub fn decide(&self, method: &Method, origin: Option<&HeaderValue>) -> Decision {
        match origin {
            None => Decision::NoOrigin,
            Some(origin) if origin.as_bytes() != self.allowed.as_bytes() => Decision::Reject,
            Some(_) if method == Method::OPTIONS => Decision::Preflight,
            Some(_) => Decision::Allow,
        }
    }

    pub fn apply_allow_headers(&self, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allowed.clone());
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }

    pub fn apply_preflight_headers(&self, headers: &mut HeaderMap) {
        self.apply_allow_headers(headers);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
    }
}
