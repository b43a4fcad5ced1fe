use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::sleep;
use url::Url;

use crate::{
    Descriptor, EngineOptions, Exchange, Params, Properties, ReqwestTransport, Response,
    Transport, TransportError, TransportRequest, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE,
};

/// Executes [`Descriptor`]s under a timeout and a fixed retry schedule.
///
/// The engine holds only immutable configuration, so one instance can serve
/// concurrent callers. Each logical call runs its attempts sequentially.
#[derive(Clone, Debug)]
pub struct Engine<T = ReqwestTransport> {
    transport: T,
    timeout: Duration,
    retry_delays: Vec<Duration>,
}

impl Engine<ReqwestTransport> {
    /// Creates an engine over the default `reqwest` transport.
    ///
    /// `timeout` is clamped to [`crate::MAX_TIMEOUT`]; each entry of
    /// `retry_delays` is one attempt followed, on failure, by that pause.
    pub fn new(timeout: Duration, retry_delays: impl Into<Vec<Duration>>) -> Self {
        Self::with_options(EngineOptions::new(timeout, retry_delays))
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self::with_transport(ReqwestTransport::new(), options)
    }
}

impl<T: Transport> Engine<T> {
    pub fn with_transport(transport: T, options: EngineOptions) -> Self {
        Self {
            transport,
            timeout: options.effective_timeout(),
            retry_delays: options.retry_delays,
        }
    }

    /// Effective per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_delays(&self) -> &[Duration] {
        &self.retry_delays
    }

    /// Sends `data` serialized as JSON.
    ///
    /// A serialization failure sends an empty body instead of failing the call.
    pub async fn send_json<D: Serialize + ?Sized>(
        &self,
        descriptor: Descriptor,
        data: &D,
    ) -> Exchange {
        let body = match serde_json::to_vec(data) {
            Ok(body) => body,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("json serialization failed, sending empty body: {}", _err);
                Vec::new()
            }
        };
        let descriptor = descriptor.content_type(JSON_CONTENT_TYPE);
        self.perform(descriptor, Some(body)).await
    }

    /// Sends `data` as `application/x-www-form-urlencoded`.
    pub async fn send_form(&self, mut descriptor: Descriptor, data: impl Into<Params>) -> Exchange {
        let body = match data.into().to_query_values() {
            Ok(values) => values.encode().into_bytes(),
            Err(err) => {
                descriptor.record(err);
                Vec::new()
            }
        };
        let descriptor = descriptor.content_type(FORM_CONTENT_TYPE);
        self.perform(descriptor, Some(body)).await
    }

    /// Sends the descriptor without a body.
    pub async fn send(&self, descriptor: Descriptor) -> Exchange {
        self.perform(descriptor, None).await
    }

    /// Adds `params` to the query string, then sends without a body.
    pub async fn send_query(&self, descriptor: Descriptor, params: impl Into<Params>) -> Exchange {
        self.perform(descriptor.parameter(params), None).await
    }

    async fn perform(&self, descriptor: Descriptor, body: Option<Vec<u8>>) -> Exchange {
        let url = match descriptor.validate() {
            Ok(url) => url.clone(),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("descriptor rejected before sending: {}", _err);
                return Exchange::default();
            }
        };

        let started = Instant::now();
        let schedule: &[Duration] = if self.retry_delays.is_empty() {
            &[Duration::ZERO]
        } else {
            &self.retry_delays
        };

        let mut properties = Properties::default();
        for (attempt, delay) in schedule.iter().enumerate() {
            let attempt_started = Instant::now();
            let outcome = self.attempt(&descriptor, &url, body.clone()).await;
            properties.elapsed = attempt_started.elapsed();
            properties.retries = attempt + 1;

            match outcome {
                Ok(response) => {
                    properties.total_elapsed = started.elapsed();
                    return Exchange {
                        response,
                        properties,
                        success: true,
                    };
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "attempt {} of {} {} failed: {}",
                        attempt + 1,
                        descriptor.method(),
                        url,
                        err
                    );
                    properties.errors.push(err);
                }
            }

            // No pause after the final attempt.
            if attempt + 1 < schedule.len() {
                #[cfg(feature = "tracing")]
                tracing::debug!("retrying after {} ms", delay.as_millis());
                sleep(*delay).await;
            }
        }

        properties.total_elapsed = started.elapsed();
        Exchange {
            response: Response::default(),
            properties,
            success: false,
        }
    }

    async fn attempt(
        &self,
        descriptor: &Descriptor,
        url: &Url,
        body: Option<Vec<u8>>,
    ) -> Result<Response, TransportError> {
        let mut headers = Vec::with_capacity(descriptor.headers().len() + 2);
        if !descriptor.media_type().is_empty() {
            headers.push((CONTENT_TYPE.as_str().to_owned(), descriptor.media_type().to_owned()));
        }
        if !descriptor.token().is_empty() {
            headers.push(("authorization".to_owned(), descriptor.token().to_owned()));
        }
        headers.extend(
            descriptor
                .headers()
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );

        let response = self
            .transport
            .execute(TransportRequest {
                method: descriptor.method().to_owned(),
                url: url.clone(),
                headers,
                body,
                timeout: self.timeout,
            })
            .await?;

        let wants_json = descriptor.media_type() == JSON_CONTENT_TYPE
            || is_json_media_type(&response.headers);
        let body_object = if wants_json && !response.body.is_empty() {
            serde_json::from_slice::<Map<String, Value>>(&response.body).ok()
        } else {
            None
        };

        Ok(Response {
            body: response.body,
            body_object,
            status_code: response.status,
            is_ok: response.status == 200,
        })
    }
}

fn is_json_media_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
}
