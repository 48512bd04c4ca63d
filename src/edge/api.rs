//! Inbound transport boundary of the edge service.
//!
//! # Responsibilities
//! - Terminate `GET /ping?message=...`
//! - Establish the correlation context (continue or mint) and the request deadline
//! - Call the business layer and map any failure to a generic 500 body
//! - Expose the correlation id to the client as `x-trace-id`

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::edge::service::EdgeService;
use crate::error::PingResult;
use crate::model::{PingOutput, PingParams};
use crate::observability::{propagation, CorrelationContext, SpanStatus, Telemetry};

#[derive(Debug, Default, Deserialize)]
pub struct PingQuery {
    pub message: Option<String>,
}

/// Success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PongBody {
    pub message: String,
}

/// Failure body. Carries the deepest error's text, never its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub struct EdgeApi {
    telemetry: Telemetry,
    service: Arc<EdgeService>,
    request_timeout: Option<Duration>,
}

impl EdgeApi {
    pub fn new(
        telemetry: Telemetry,
        service: Arc<EdgeService>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            telemetry,
            service,
            request_timeout,
        }
    }

    pub async fn ping(&self, ctx: &CorrelationContext, message: String) -> PingResult<PingOutput> {
        const OP: &str = "api.ping";

        let (ctx, mut span) = self.telemetry.recorder.start(ctx, OP);
        span.set_attributes([("http.route", "/ping"), ("http.method", "GET")]);

        let params = PingParams::new(message);
        span.set_attribute("api.input.params", format!("{params:?}"));

        let logger = self.telemetry.logger.with_correlation(&ctx);
        logger.info(OP, format_args!("params={params:?}"));

        let result = self.service.ping(&ctx, &params).await;

        match &result {
            Ok(output) => {
                span.set_attribute("api.output.result", format!("{output:?}"));
                span.set_status(SpanStatus::ok("request completed successfully"));
                logger.info(OP, format_args!("result={output:?}"));
            }
            Err(err) => {
                span.record_error(err);
                span.set_status(SpanStatus::error(err.message()));
                logger.error(OP, format_args!("params={params:?}"), err);
            }
        }
        span.end();

        result
    }
}

/// `GET /ping`
pub async fn ping(
    State(api): State<Arc<EdgeApi>>,
    headers: HeaderMap,
    Query(query): Query<PingQuery>,
) -> Response {
    let ctx = propagation::ensure(&headers);
    let ctx = match api.request_timeout {
        Some(timeout) => ctx.with_timeout(timeout),
        None => ctx,
    };
    // Client disconnect drops this future; the guard then cancels the downstream call.
    let _cancel_on_drop = ctx.cancellation().clone().drop_guard();

    let mut response = match api.ping(&ctx, query.message.unwrap_or_default()).await {
        Ok(output) => Json(PongBody {
            message: output.pong_message,
        })
        .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: err.message().to_string(),
            }),
        )
            .into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&ctx.trace_id().to_string()) {
        response.headers_mut().insert(propagation::TRACE_ID, value);
    }
    response
}
