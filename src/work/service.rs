//! Remote business layer.

use std::sync::Arc;

use crate::error::PingResult;
use crate::model::{PingOutput, PingParams};
use crate::observability::{CorrelationContext, Telemetry};
use crate::resilience::SyntheticDelay;
use crate::work::store::{PingArgs, Store};

pub struct WorkService {
    telemetry: Telemetry,
    processing: SyntheticDelay,
    store: Arc<Store>,
}

impl WorkService {
    pub fn new(telemetry: Telemetry, processing: SyntheticDelay, store: Arc<Store>) -> Self {
        Self {
            telemetry,
            processing,
            store,
        }
    }

    /// Wait the processing delay, then delegate to the store. Errors are recorded and
    /// returned unchanged.
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
            self.processing.wait(&ctx).await?;

            let args = PingArgs {
                message: params.ping_message.clone(),
            };
            let data = self.store.ping(&ctx, &args).await?;

            Ok(PingOutput {
                pong_message: data.pong_message,
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
