//! Local business layer of the edge service.

use std::sync::Arc;

use crate::error::PingResult;
use crate::model::{PingOutput, PingParams};
use crate::observability::{CorrelationContext, Telemetry};
use crate::resilience::SyntheticDelay;
use crate::rpc::{Downstream, PingRequest};

pub struct EdgeService {
    telemetry: Telemetry,
    validation: SyntheticDelay,
    downstream: Arc<dyn Downstream>,
}

impl EdgeService {
    pub fn new(
        telemetry: Telemetry,
        validation: SyntheticDelay,
        downstream: Arc<dyn Downstream>,
    ) -> Self {
        Self {
            telemetry,
            validation,
            downstream,
        }
    }

    /// Validate (synthetic delay), call the downstream once and wrap its pong.
    /// Downstream errors are recorded and returned as they came.
    pub async fn ping(
        &self,
        ctx: &CorrelationContext,
        params: &PingParams,
    ) -> PingResult<PingOutput> {
        const OP: &str = "service.ping";

        let (ctx, mut span) = self.telemetry.recorder.start(ctx, OP);
        span.set_attribute("service.operation", "ping");
        span.set_attribute("service.input.params", format!("{params:?}"));

        let logger = self.telemetry.logger.with_correlation(&ctx);
        logger.info(OP, format_args!("params={params:?}"));

        let result: PingResult<PingOutput> = async {
            self.validation.wait(&ctx).await?;

            let request = PingRequest {
                message: params.ping_message.clone(),
            };
            let response = self.downstream.ping(&ctx, request).await?;

            Ok(PingOutput {
                pong_message: response.message,
            })
        }
        .await;

        match &result {
            Ok(output) => logger.info(OP, format_args!("result={output:?}")),
            Err(err) => logger.error(OP, format_args!("params={params:?}"), err),
        }
        span.record_result(
            "service.output.result",
            &result,
            "service operation completed successfully",
        );
        span.end();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PingError};
    use crate::observability::{InMemoryExporter, MemorySink, SpanId, TraceId};
    use crate::rpc::PingResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Downstream double that remembers the context it was called with.
    struct Scripted {
        reply: PingResult<PingResponse>,
        seen: Mutex<Vec<(TraceId, SpanId)>>,
    }

    impl Scripted {
        fn new(reply: PingResult<PingResponse>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Downstream for Scripted {
        async fn ping(
            &self,
            ctx: &CorrelationContext,
            _request: PingRequest,
        ) -> PingResult<PingResponse> {
            self.seen.lock().unwrap().push((ctx.trace_id(), ctx.span_id()));
            self.reply.clone()
        }
    }

    fn service(
        downstream: Arc<Scripted>,
        validation_ms: u64,
    ) -> (EdgeService, Arc<InMemoryExporter>) {
        let exporter = Arc::new(InMemoryExporter::new());
        let telemetry = Telemetry::new("edge", exporter.clone(), Arc::new(MemorySink::new()));
        let validation = SyntheticDelay::from_millis("validation", validation_ms);
        (EdgeService::new(telemetry, validation, downstream), exporter)
    }

    #[tokio::test]
    async fn wraps_downstream_pong_after_validation_delay() {
        let downstream = Scripted::new(Ok(PingResponse {
            message: "pong hi".into(),
        }));
        let (service, exporter) = service(downstream.clone(), 250);
        let ctx = CorrelationContext::new_root();

        let start = Instant::now();
        let output = service.ping(&ctx, &PingParams::new("hi")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
        assert_eq!(output.pong_message, "pong hi");

        let span = &exporter.spans()[0];
        let seen = downstream.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![(ctx.trace_id(), span.span_id)]);
    }

    #[tokio::test]
    async fn downstream_error_passes_through_verbatim() {
        for err in [
            PingError::domain("error in store.ping"),
            PingError::transport("error sending request: connection refused"),
        ] {
            let (service, exporter) = service(Scripted::new(Err(err.clone())), 0);
            let ctx = CorrelationContext::new_root();

            let got = service.ping(&ctx, &PingParams::new("x")).await.unwrap_err();
            assert_eq!(got, err);

            let span = &exporter.spans()[0];
            assert!(span.status.is_error());
            assert_eq!(
                span.attribute("error.kind").map(|v| v.to_string()),
                Some(err.kind().to_string())
            );
        }
    }

    #[tokio::test]
    async fn cancelled_call_never_reaches_downstream() {
        let downstream = Scripted::new(Ok(PingResponse {
            message: "unused".into(),
        }));
        let (service, _) = service(downstream.clone(), 5_000);
        let ctx = CorrelationContext::new_root();
        ctx.cancellation().cancel();

        let err = service.ping(&ctx, &PingParams::new("x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(downstream.seen.lock().unwrap().is_empty());
    }
}
