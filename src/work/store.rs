//! Storage stub.
//!
//! The ground truth of the chain: a deterministic string transform behind a
//! fixed query latency. Any message containing the literal substring
//! `"error"` is rejected, which is the only domain failure in the system.

use crate::error::{PingError, PingResult};
use crate::observability::{CorrelationContext, SpanHandle, Telemetry};
use crate::resilience::SyntheticDelay;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingArgs {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingData {
    pub pong_message: String,
}

pub struct Store {
    telemetry: Telemetry,
    query_delay: SyntheticDelay,
}

impl Store {
    pub fn new(telemetry: Telemetry, query_delay: SyntheticDelay) -> Self {
        Self {
            telemetry,
            query_delay,
        }
    }

    pub async fn ping(&self, ctx: &CorrelationContext, args: &PingArgs) -> PingResult<PingData> {
        const OP: &str = "store.ping";

        let (ctx, mut span) = self.telemetry.recorder.start(ctx, OP);
        span.set_attributes([
            ("store.operation", "ping"),
            ("store.operation_type", "database_query"),
        ]);
        span.set_attribute("store.input.args", format!("{args:?}"));

        let logger = self.telemetry.logger.with_correlation(&ctx);
        logger.info(OP, format_args!("args={args:?}"));

        let result = self.query(&ctx, &mut span, args).await;

        match &result {
            Ok(data) => logger.info(OP, format_args!("data={data:?}")),
            Err(err) => logger.error(OP, format_args!("args={args:?}"), err),
        }
        span.record_result(
            "store.output.data",
            &result,
            "store operation completed successfully",
        );
        if result.is_ok() {
            let millis = self.query_delay.duration().as_millis() as i64;
            span.set_attribute("store.query_duration_ms", millis);
        }
        span.end();

        result
    }

    async fn query(
        &self,
        ctx: &CorrelationContext,
        span: &mut SpanHandle,
        args: &PingArgs,
    ) -> PingResult<PingData> {
        if args.message.contains("error") {
            return Err(PingError::domain("error in store.ping"));
        }

        let pong_message = format!("pong {}", args.message);

        span.add_event("database_query_start");
        self.query_delay.wait(ctx).await?;
        span.add_event("database_query_end");

        Ok(PingData { pong_message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::observability::{InMemoryExporter, MemorySink};
    use std::sync::Arc;

    fn store() -> (Store, Arc<InMemoryExporter>) {
        let exporter = Arc::new(InMemoryExporter::new());
        let telemetry = Telemetry::new("work", exporter.clone(), Arc::new(MemorySink::new()));
        (Store::new(telemetry, SyntheticDelay::from_millis("storage", 5)), exporter)
    }

    fn args(message: &str) -> PingArgs {
        PingArgs {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn prefixes_pong() {
        let (store, exporter) = store();
        let ctx = CorrelationContext::new_root();

        let data = store.ping(&ctx, &args("hello")).await.unwrap();
        assert_eq!(data.pong_message, "pong hello");

        let data = store.ping(&ctx, &args("")).await.unwrap();
        assert_eq!(data.pong_message, "pong ");

        let spans = exporter.spans();
        assert_eq!(spans.len(), 2);
        let names: Vec<_> = spans[0].events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["database_query_start", "database_query_end"]);
    }

    #[tokio::test]
    async fn rejects_any_occurrence_of_error() {
        let (store, exporter) = store();
        let ctx = CorrelationContext::new_root();

        for message in ["error", "this has an error in it", "errors", "xerrorx"] {
            let err = store.ping(&ctx, &args(message)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Domain);
            assert_eq!(err.message(), "error in store.ping");
        }
        assert!(exporter.spans().iter().all(|s| s.status.is_error()));
    }

    #[tokio::test]
    async fn match_is_case_sensitive() {
        let (store, _) = store();
        let ctx = CorrelationContext::new_root();

        let data = store.ping(&ctx, &args("ERROR Error")).await.unwrap();
        assert_eq!(data.pong_message, "pong ERROR Error");
    }
}
