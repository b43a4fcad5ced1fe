use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::{DescriptorError, InvalidDescriptor, Params, QueryValues};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Immutable description of one outbound HTTP call.
///
/// Builder steps never fail: invalid input is recorded in an error
/// accumulator and the chain continues. The [`crate::Engine`] refuses to
/// execute a descriptor whose accumulator is non-empty.
///
/// ```
/// use demand_http::{Descriptor, JSON_CONTENT_TYPE};
///
/// let descriptor = Descriptor::create("GET", "https://api.example.com", "/v1/items", [("q", "x")])
///     .content_type(JSON_CONTENT_TYPE)
///     .authorization_bearer("secret")
///     .header("X-Trace", "1");
///
/// assert!(descriptor.is_valid());
/// assert_eq!(descriptor.url_string(), "https://api.example.com/v1/items?q=x");
/// ```
#[derive(Clone, PartialEq)]
pub struct Descriptor {
    url: Option<Url>,
    method: String,
    media_type: String,
    token: String,
    headers: HashMap<String, String>,
    errors: Vec<DescriptorError>,
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("Descriptor")
            .field("method", &self.method)
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("media_type", &self.media_type)
            .field("token", &token)
            .field("headers", &self.headers)
            .field("errors", &self.errors)
            .finish()
    }
}

impl Descriptor {
    /// Creates a descriptor from a raw absolute URL.
    ///
    /// `path` is appended verbatim to the parsed URL path. `params` are set
    /// into the query, overwriting existing values with the same key. Pass
    /// `()` for no parameters.
    ///
    /// `method` is not checked against a fixed set of verbs.
    pub fn create(
        method: impl Into<String>,
        raw_url: &str,
        path: &str,
        params: impl Into<Params>,
    ) -> Self {
        let mut descriptor = Self {
            url: None,
            method: method.into(),
            media_type: String::new(),
            token: String::new(),
            headers: HashMap::new(),
            errors: Vec::new(),
        };

        let mut url = match parse_absolute(raw_url) {
            Ok(url) => url,
            Err(err) => {
                descriptor.errors.push(err);
                return descriptor;
            }
        };

        if !path.is_empty() {
            append_path(&mut url, path);
        }

        let params = params.into();
        if !params.is_empty() {
            match params.to_query_values() {
                Ok(values) => {
                    let mut query = query_of(&url);
                    query.merge_set(values);
                    set_query(&mut url, &query);
                }
                Err(err) => descriptor.errors.push(err),
            }
        }

        descriptor.url = Some(url);
        descriptor
    }

    /// Sets the `Content-Type`. An empty value records an error.
    pub fn content_type(mut self, ctype: impl AsRef<str>) -> Self {
        let ctype = ctype.as_ref();
        if ctype.is_empty() {
            self.errors.push(DescriptorError::EmptyContentType);
            return self;
        }
        self.media_type = ctype.to_owned();
        self
    }

    /// Sets `Authorization: Bearer <token>`. An empty token records an error.
    pub fn authorization_bearer(mut self, token: impl AsRef<str>) -> Self {
        let token = token.as_ref();
        if token.is_empty() {
            self.errors.push(DescriptorError::EmptyToken);
            return self;
        }
        self.token = format!("Bearer {token}");
        self
    }

    /// Sets `Authorization` to `token` verbatim. An empty token records an error.
    pub fn authorization(mut self, token: impl AsRef<str>) -> Self {
        let token = token.as_ref();
        if token.is_empty() {
            self.errors.push(DescriptorError::EmptyToken);
            return self;
        }
        self.token = token.to_owned();
        self
    }

    /// Sets an extra header; the last value for a name wins.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds query parameters without overwriting existing values.
    ///
    /// An empty payload records [`DescriptorError::EmptyParams`]; a payload
    /// that cannot be flattened into query values records
    /// [`DescriptorError::UnsupportedParameter`] or
    /// [`DescriptorError::UnsupportedPayload`].
    pub fn parameter(mut self, params: impl Into<Params>) -> Self {
        let params = params.into();
        if params.is_empty() {
            self.errors.push(DescriptorError::EmptyParams);
            return self;
        }
        let values = match params.to_query_values() {
            Ok(values) => values,
            Err(err) => {
                self.errors.push(err);
                return self;
            }
        };
        if let Some(url) = self.url.as_mut() {
            let mut query = query_of(url);
            query.merge_add(values);
            set_query(url, &query);
        }
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Parsed target; `None` when the raw URL failed to parse.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Target URL as a string, empty when the raw URL failed to parse.
    pub fn url_string(&self) -> String {
        self.url.as_ref().map(Url::to_string).unwrap_or_default()
    }

    /// Configured content type, empty when unset.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Configured `Authorization` value, empty when unset.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn errors(&self) -> &[DescriptorError] {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.url.is_some()
    }

    /// Returns the target URL, or every accumulated construction error.
    pub fn validate(&self) -> Result<&Url, InvalidDescriptor> {
        match (&self.url, self.errors.is_empty()) {
            (Some(url), true) => Ok(url),
            (None, true) => Err(InvalidDescriptor {
                errors: vec![DescriptorError::InvalidUrl {
                    url: String::new(),
                    reason: "no target url".to_owned(),
                }],
            }),
            _ => Err(InvalidDescriptor {
                errors: self.errors.clone(),
            }),
        }
    }

    pub(crate) fn record(&mut self, err: DescriptorError) {
        self.errors.push(err);
    }
}

fn parse_absolute(raw_url: &str) -> Result<Url, DescriptorError> {
    let url = Url::parse(raw_url).map_err(|err| DescriptorError::InvalidUrl {
        url: raw_url.to_owned(),
        reason: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(DescriptorError::InvalidUrl {
            url: raw_url.to_owned(),
            reason: "not a hierarchical absolute URI".to_owned(),
        });
    }
    Ok(url)
}

/// Concatenates `path` onto the URL path without normalization.
///
/// A root path of `/` counts as empty when `path` starts with `/`. This covers
/// both a bare origin (`https://host`) and an explicit trailing slash
/// (`https://host/`), so `https://host/` + `/v1` gives `https://host/v1`
/// rather than `https://host//v1`.
fn append_path(url: &mut Url, path: &str) {
    let current = url.path();
    let joined = if current == "/" && path.starts_with('/') {
        path.to_owned()
    } else {
        format!("{current}{path}")
    };
    url.set_path(&joined);
}

fn query_of(url: &Url) -> QueryValues {
    url.query().map(QueryValues::parse).unwrap_or_default()
}

fn set_query(url: &mut Url, query: &QueryValues) {
    let encoded = query.encode();
    if encoded.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&encoded));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use crate::{Descriptor, DescriptorError, QueryValues, JSON_CONTENT_TYPE};

    #[test]
    fn create_appends_path_and_sets_params() {
        let descriptor = Descriptor::create(
            "GET",
            "https://api.example.com/base?q=old&keep=1",
            "/v1/items",
            [("q", "new")],
        );
        assert!(descriptor.is_valid());
        assert_eq!(
            descriptor.url_string(),
            "https://api.example.com/base/v1/items?keep=1&q=new"
        );
    }

    #[test]
    fn create_on_bare_origin() {
        let descriptor = Descriptor::create("GET", "https://api.example.com", "/v1/items", ());
        assert_eq!(descriptor.url_string(), "https://api.example.com/v1/items");
    }

    #[test]
    fn create_records_unparseable_url() {
        let descriptor = Descriptor::create("GET", "not a url", "/v1", [("a", "b")]);
        assert!(descriptor.url().is_none());
        assert_eq!(descriptor.url_string(), "");
        assert!(matches!(
            descriptor.errors(),
            [DescriptorError::InvalidUrl { .. }]
        ));
    }

    #[test]
    fn create_rejects_relative_and_opaque_urls() {
        assert!(!Descriptor::create("GET", "/relative/path", "", ()).is_valid());
        assert!(!Descriptor::create("GET", "mailto:kit@example.com", "", ()).is_valid());
    }

    #[test]
    fn chain_on_invalid_url_keeps_accumulating() {
        let descriptor = Descriptor::create("GET", "::", "", ())
            .content_type("")
            .authorization("")
            .parameter([("a", "1")])
            .header("X-Any", "1");
        assert_eq!(descriptor.errors().len(), 3);
        assert_eq!(descriptor.headers().get("X-Any").map(String::as_str), Some("1"));
        let err = descriptor.validate().expect_err("must be invalid");
        assert_eq!(err.errors.len(), 3);
    }

    #[test]
    fn empty_content_type_leaves_field_unset() {
        let descriptor = Descriptor::create("POST", "https://h", "", ()).content_type("");
        assert_eq!(descriptor.media_type(), "");
        assert_eq!(descriptor.errors(), [DescriptorError::EmptyContentType]);
    }

    #[test]
    fn bearer_and_plain_authorization() {
        let bearer = Descriptor::create("GET", "https://h", "", ()).authorization_bearer("abc");
        assert_eq!(bearer.token(), "Bearer abc");

        let plain = Descriptor::create("GET", "https://h", "", ()).authorization("Basic xyz");
        assert_eq!(plain.token(), "Basic xyz");

        let empty = Descriptor::create("GET", "https://h", "", ()).authorization_bearer("");
        assert_eq!(empty.token(), "");
        assert_eq!(empty.errors(), [DescriptorError::EmptyToken]);
    }

    #[test]
    fn header_last_write_wins() {
        let descriptor = Descriptor::create("GET", "https://h", "", ())
            .header("X-Id", "1")
            .header("X-Id", "2");
        assert_eq!(descriptor.headers().len(), 1);
        assert_eq!(descriptor.headers()["X-Id"], "2");
    }

    #[test]
    fn parameter_adds_without_overwriting() {
        let descriptor = Descriptor::create("GET", "https://h/p", "", [("q", "1")])
            .parameter(HashMap::from([("q", "2"), ("page", "3")]));
        assert_eq!(descriptor.url_string(), "https://h/p?page=3&q=1&q=2");
    }

    #[test]
    fn parameter_accepts_every_payload_shape() {
        let mut multi = QueryValues::new();
        multi.add("m", "1");
        multi.add("m", "2");
        let descriptor = Descriptor::create("GET", "https://h/", "", ())
            .parameter(json!({ "n": 5, "b": false }))
            .parameter(multi)
            .parameter("raw=yes");
        assert!(descriptor.is_valid());
        assert_eq!(
            descriptor.url().and_then(|url| url.query()),
            Some("b=false&m=1&m=2&n=5&raw=yes")
        );
    }

    #[test]
    fn parameter_rejects_empty_and_unsupported_payloads() {
        let descriptor = Descriptor::create("GET", "https://h/", "", ())
            .parameter(())
            .parameter(json!("scalar"));
        assert!(matches!(
            descriptor.errors(),
            [
                DescriptorError::EmptyParams,
                DescriptorError::UnsupportedPayload { .. }
            ]
        ));
        assert_eq!(descriptor.url_string(), "https://h/");
    }

    #[test]
    fn empty_array_keeps_existing_query_values() {
        let created = Descriptor::create("GET", "https://h/p?a=1", "", json!({ "a": [] }));
        assert!(created.is_valid());
        assert_eq!(created.url_string(), "https://h/p?a=1");

        let added = Descriptor::create("GET", "https://h/p", "", ()).parameter(json!({ "a": [] }));
        assert!(added.is_valid());
        assert_eq!(added.url_string(), "https://h/p");
    }

    #[test]
    fn trailing_slash_root_is_folded_when_appending() {
        let descriptor = Descriptor::create("GET", "https://h/", "/v1", ());
        assert_eq!(descriptor.url_string(), "https://h/v1");
    }

    #[test]
    fn call_order_does_not_change_fields() {
        let a = Descriptor::create("GET", "https://h", "", ())
            .content_type(JSON_CONTENT_TYPE)
            .header("H", "V")
            .authorization("t");
        let b = Descriptor::create("GET", "https://h", "", ())
            .authorization("t")
            .header("H", "V")
            .content_type(JSON_CONTENT_TYPE);
        assert_eq!(a, b);
    }

    #[test]
    fn debug_redacts_token() {
        let descriptor =
            Descriptor::create("GET", "https://h", "", ()).authorization_bearer("secret-token");
        let debug = format!("{descriptor:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
