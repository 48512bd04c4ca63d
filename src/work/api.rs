//! Remote transport boundary of the work service.
//!
//! # Responsibilities
//! - Terminate `POST /rpc/ping`
//! - Continue the caller's trace from `traceparent` and honour its deadline
//! - Map business failures to an RPC error body that keeps the error kind

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{PingError, PingResult};
use crate::model::PingParams;
use crate::observability::{propagation, CorrelationContext, SpanStatus, Telemetry};
use crate::resilience::SyntheticDelay;
use crate::rpc::wire::{PingRequest, PingResponse, RpcErrorBody};
use crate::work::service::WorkService;

pub struct WorkApi {
    telemetry: Telemetry,
    validation: SyntheticDelay,
    service: Arc<WorkService>,
}

impl WorkApi {
    pub fn new(telemetry: Telemetry, validation: SyntheticDelay, service: Arc<WorkService>) -> Self {
        Self {
            telemetry,
            validation,
            service,
        }
    }

    pub async fn ping(&self, ctx: &CorrelationContext, request: PingRequest) -> PingResult<PingResponse> {
        const OP: &str = "api.ping";

        let (ctx, mut span) = self.telemetry.recorder.start(ctx, OP);
        span.set_attributes([
            ("api.operation", "ping"),
            ("rpc.method", "Ping"),
        ]);
        span.set_attribute("api.input.request", format!("{request:?}"));

        let logger = self.telemetry.logger.with_correlation(&ctx);
        logger.info(OP, format_args!("request={request:?}"));

        let result = match self.validation.wait(&ctx).await {
            Ok(()) => {
                let params = PingParams::new(request.message);
                self.service.ping(&ctx, &params).await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(output) => {
                let response = PingResponse {
                    message: output.pong_message,
                };
                span.set_attribute("api.output.response", format!("{response:?}"));
                span.set_status(SpanStatus::ok("request completed successfully"));
                logger.info(OP, format_args!("response={response:?}"));
                span.end();
                Ok(response)
            }
            Err(err) => {
                span.record_error(&err);
                span.set_status(SpanStatus::error(err.message()));
                logger.error(OP, "request failed", &err);
                span.end();
                Err(err)
            }
        }
    }
}

/// `POST /rpc/ping`
pub async fn ping(
    State(api): State<Arc<WorkApi>>,
    headers: HeaderMap,
    body: Result<Json<PingRequest>, JsonRejection>,
) -> Response {
    let ctx = propagation::ensure(&headers);
    // Dropping this handler (caller hung up) cancels everything below it.
    let _cancel_on_drop = ctx.cancellation().clone().drop_guard();

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = PingError::internal(format!("invalid request body: {}", rejection.body_text()));
            api.telemetry
                .logger
                .with_correlation(&ctx)
                .error("api.ping", "request rejected", &err);
            return (StatusCode::BAD_REQUEST, Json(RpcErrorBody::from(&err))).into_response();
        }
    };

    match api.ping(&ctx, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcErrorBody::from(&err)),
        )
            .into_response(),
    }
}
