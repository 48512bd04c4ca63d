//! Failure injection: unreachable downstream, deadlines, client hang-ups.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use ping_chain::observability::{SpanData, TraceId};

mod common;
use common::{Chain, ChainOptions};

/// Spans are exported when a layer unwinds; give the far side a moment.
async fn wait_for_spans(
    exporter: &ping_chain::observability::InMemoryExporter,
    trace_id: TraceId,
    count: usize,
) -> Vec<SpanData> {
    for _ in 0..100 {
        let spans = exporter.spans_for(trace_id);
        if spans.len() >= count {
            return spans;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    exporter.spans_for(trace_id)
}

#[tokio::test]
async fn test_downstream_unreachable() {
    let port = common::unused_port().await;
    let (addr, edge, shutdown) = common::start_edge_only(port, ChainOptions::fast()).await;

    let res = common::client()
        .get(format!("http://{addr}/ping?message=hello"))
        .send()
        .await
        .unwrap();
    let reply = common::into_reply(res).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = reply.body["error"].as_str().unwrap();
    assert!(error.starts_with("error sending request"), "{error}");

    let trace_id = TraceId::from_hex(reply.trace_id.as_deref().unwrap()).unwrap();
    let spans = edge.spans.spans_for(trace_id);
    assert_eq!(spans.len(), 3);
    for span in &spans {
        assert!(span.status.is_error());
        assert_eq!(span.attribute("error.kind").unwrap().to_string(), "transport");
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_downstream_timeout() {
    let mut options = ChainOptions::fast();
    options.work_delays.storage_ms = 5_000;
    options.downstream_timeout_ms = Some(200);
    let chain = Chain::start(options).await;

    let start = Instant::now();
    let reply = chain.ping("slow").await;
    let elapsed = start.elapsed();

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(elapsed < Duration::from_millis(2_000), "took {elapsed:?}");
    let error = reply.body["error"].as_str().unwrap();
    assert!(error.contains("deadline exceeded"), "{error}");

    let trace_id = TraceId::from_hex(reply.trace_id.as_deref().unwrap()).unwrap();
    let rpc = chain
        .edge
        .spans
        .spans_for(trace_id)
        .into_iter()
        .find(|s| s.name == "rpc.client.ping")
        .unwrap();
    assert_eq!(rpc.attribute("error.kind").unwrap().to_string(), "transport");

    // The budget travelled with the call, so the work side gives up too.
    let work = wait_for_spans(&chain.work.spans, trace_id, 3).await;
    assert_eq!(work.len(), 3);
    assert!(work.iter().all(|s| s.status.is_error()));
}

#[tokio::test]
async fn test_request_deadline_bounds_the_whole_chain() {
    let mut options = ChainOptions::production();
    options.edge_validation_ms = 10;
    options.request_timeout_ms = Some(300);
    let chain = Chain::start(options).await;

    let start = Instant::now();
    let reply = chain.ping("hello").await;
    let elapsed = start.elapsed();

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(elapsed < Duration::from_millis(1_000), "took {elapsed:?}");
    assert!(reply.body["error"]
        .as_str()
        .unwrap()
        .contains("deadline exceeded"));

    // Work validation (250ms) fits in the budget, processing does not.
    let trace_id = TraceId::from_hex(reply.trace_id.as_deref().unwrap()).unwrap();
    let work = wait_for_spans(&chain.work.spans, trace_id, 2).await;
    assert_eq!(work.len(), 2);
    assert!(work.iter().all(|s| s.status.is_error()));
    assert!(work.iter().all(|s| s.name != "store.ping"));
}

#[tokio::test]
async fn test_client_hangup_cancels_the_chain() {
    let chain = Chain::start(ChainOptions::production()).await;
    let traceparent = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";
    let trace_id = TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").unwrap();

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let result = client
        .get(format!("http://{}/ping?message=bye", chain.edge_addr))
        .header("traceparent", traceparent)
        .send()
        .await;
    assert!(result.unwrap_err().is_timeout());

    // Edge validation was still running when the client left: nothing reaches work.
    let edge = wait_for_spans(&chain.edge.spans, trace_id, 2).await;
    assert_eq!(edge.len(), 2);
    assert!(edge.iter().all(|s| s.status.is_error()));
    assert!(edge.iter().all(|s| s.name != "rpc.client.ping"));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(chain.work.spans.spans_for(trace_id).is_empty());
}

#[tokio::test]
async fn test_client_hangup_abandons_the_remote_call() {
    let mut options = ChainOptions::fast();
    options.work_delays.storage_ms = 3_000;
    let chain = Chain::start(options).await;
    let traceparent = "00-5e1f0c6a2b9d4e7f8a3b1c2d3e4f5a6b-1a2b3c4d5e6f7081-01";
    let trace_id = TraceId::from_hex("5e1f0c6a2b9d4e7f8a3b1c2d3e4f5a6b").unwrap();

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let start = Instant::now();
    let result = client
        .get(format!("http://{}/ping?message=bye", chain.edge_addr))
        .header("traceparent", traceparent)
        .send()
        .await;
    assert!(result.unwrap_err().is_timeout());

    // The RPC was in flight; dropping it must unwind the work side long before storage finishes.
    let work = wait_for_spans(&chain.work.spans, trace_id, 3).await;
    assert!(start.elapsed() < Duration::from_millis(2_000), "took {:?}", start.elapsed());

    let mut seen: Vec<_> = work
        .iter()
        .map(|s| (s.name.as_str(), s.status.is_error()))
        .collect();
    seen.sort();
    assert_eq!(
        seen,
        [("api.ping", true), ("service.ping", true), ("store.ping", true)]
    );

    let rpc = chain
        .edge
        .spans
        .spans_for(trace_id)
        .into_iter()
        .find(|s| s.name == "rpc.client.ping")
        .unwrap();
    assert!(rpc.status.is_error());
}
