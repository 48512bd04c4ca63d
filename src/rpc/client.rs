//! Outbound RPC boundary.
//!
//! # Responsibilities
//! - Serialize the call and inject the correlation context into its headers
//! - Dispatch exactly once, bounded by the context deadline and the
//!   configured per-call timeout
//! - Turn transport failures into `ErrorKind::Transport` and decode remote
//!   failures with their original kind and text

use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::config::DownstreamConfig;
use crate::error::{PingError, PingResult};
use crate::observability::{propagation, CorrelationContext, Telemetry};
use crate::resilience::timeouts;
use crate::rpc::wire::{PingRequest, PingResponse, RpcErrorBody, PING_PATH};

/// The downstream `Ping` procedure as seen by the edge business layer.
#[async_trait]
pub trait Downstream: Send + Sync {
    async fn ping(&self, ctx: &CorrelationContext, request: PingRequest) -> PingResult<PingResponse>;
}

/// HTTP/JSON client for the work service.
#[derive(Debug, Clone)]
pub struct RpcClient {
    service_name: String,
    address: String,
    endpoint: String,
    timeout: Option<Duration>,
    http: reqwest::Client,
    telemetry: Telemetry,
}

impl RpcClient {
    pub fn new(config: &DownstreamConfig, telemetry: Telemetry) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().no_proxy().build()?;

        Ok(Self {
            service_name: config.name.clone(),
            address: format!("{}:{}", config.host, config.port),
            endpoint: format!("{}{}", config.base_url(), PING_PATH),
            timeout: timeouts::from_millis(config.timeout_ms),
            http,
            telemetry,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn dispatch(
        &self,
        ctx: &CorrelationContext,
        request: &PingRequest,
    ) -> PingResult<PingResponse> {
        let mut headers = HeaderMap::new();
        propagation::inject(ctx, &mut headers);

        let response = self
            .http
            .post(&self.endpoint)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| PingError::transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<PingResponse>()
                .await
                .map_err(|e| {
                    PingError::transport(format!("error sending request: invalid response body: {e}"))
                });
        }

        match response.json::<RpcErrorBody>().await {
            Ok(body) => Err(body.into()),
            Err(_) => Err(PingError::transport(format!(
                "error sending request: {} returned {status}",
                self.service_name
            ))),
        }
    }
}

#[async_trait]
impl Downstream for RpcClient {
    async fn ping(&self, ctx: &CorrelationContext, request: PingRequest) -> PingResult<PingResponse> {
        const OP: &str = "rpc.client.ping";

        let (ctx, mut span) = self.telemetry.recorder.start(ctx, OP);
        let ctx = match self.timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        };

        span.set_attributes([
            ("rpc.system", "http-json"),
            ("rpc.method", "Ping"),
            ("rpc.service", self.service_name.as_str()),
            ("server.address", self.address.as_str()),
        ]);
        span.set_attribute("rpc.input.request", format!("{request:?}"));

        let logger = self.telemetry.logger.with_correlation(&ctx);
        logger.info(
            OP,
            format_args!("sending request to {}: {request:?}", self.service_name),
        );

        let result = ctx
            .guard(OP, self.dispatch(&ctx, &request))
            .await
            .map_err(|e| PingError::transport(format!("error sending request: {}", e.message())))
            .and_then(|inner| inner);

        match &result {
            Ok(response) => logger.info(
                OP,
                format_args!("received response from {}: {response:?}", self.service_name),
            ),
            Err(err) => logger.error(
                OP,
                format_args!("request to {} failed", self.service_name),
                err,
            ),
        }
        span.record_result("rpc.output.response", &result, "rpc call completed successfully");
        span.end();

        result
    }
}
