use std::time::Duration;

use serde_json::{Map, Value};

use crate::TransportError;

/// Outcome of a physical attempt that reached the server.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
    /// Raw response bytes.
    pub body: Vec<u8>,
    /// Body decoded as a JSON object, when decoding was attempted and succeeded.
    pub body_object: Option<Map<String, Value>>,
    pub status_code: u16,
    /// `true` only for status 200 exactly, not the whole 2xx range.
    pub is_ok: bool,
}

impl Response {
    /// Body as UTF-8 text, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Telemetry for one logical call spanning every attempt.
#[derive(Debug, Default)]
pub struct Properties {
    /// Duration of the last attempt only.
    pub elapsed: Duration,
    /// Duration of the whole call, including pauses between attempts.
    pub total_elapsed: Duration,
    /// Attempts actually made, 1-based.
    pub retries: usize,
    /// One error per failed attempt, in attempt order.
    pub errors: Vec<TransportError>,
}

impl Properties {
    /// Latest recorded attempt error, if any.
    pub fn last_error(&self) -> Option<&TransportError> {
        self.errors.last()
    }
}

/// Everything an engine entry point returns.
#[derive(Debug, Default)]
pub struct Exchange {
    pub response: Response,
    pub properties: Properties,
    pub success: bool,
}

impl Exchange {
    pub fn into_parts(self) -> (Response, Properties, bool) {
        (self.response, self.properties, self.success)
    }
}
