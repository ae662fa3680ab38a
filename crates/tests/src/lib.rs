//! # Integration Tests
//!
//! End-to-end tests against a local collector.
//!
//! Covers:
//! - Contract smoke tests
//! - HttpTransport wire format (path, credential, body)
//! - Config file -> dispatcher -> collector

#[cfg(test)]
mod collector;

#[cfg(test)]
mod contract_tests {
    use contracts::{Batch, DispatcherConfig, Event};
    use serde_json::json;

    #[test]
    fn test_default_endpoint() {
        let config = DispatcherConfig::new("proj", "key");
        assert_eq!(
            config.endpoint(),
            "https://api.keen.io/3.0/projects/proj/events"
        );
    }

    #[test]
    fn test_batch_wire_shape() {
        let batch: Batch = vec![
            Event::new("test", json!({"hat": 1})),
            Event::new("other", json!(2)),
            Event::new("test", json!({"cheese": "x"})),
        ]
        .into_iter()
        .collect();

        let body: serde_json::Value = serde_json::from_slice(&batch.to_json().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"other": [2], "test": [{"hat": 1}, {"cheese": "x"}]})
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::time::Duration;

    use contracts::{Batch, BatchTransport, ContractError, DispatcherConfig, Event, RequestEvent};
    use dispatcher::{create_dispatcher, HttpTransport, HttpTransportConfig};
    use serde_json::{json, Value};

    use crate::collector::Collector;

    fn config_for(collector: &Collector) -> DispatcherConfig {
        let mut config = DispatcherConfig::new("p", "k");
        config.base_url = format!("http://{}/3.0/projects/", collector.addr());
        config.request_timeout_ms = Some(5_000);
        config
    }

    /// All payloads received for `category`, in arrival order
    fn received_for(collector: &Collector, category: &str) -> Vec<Value> {
        collector
            .requests()
            .iter()
            .flat_map(|r| {
                r.body
                    .get(category)
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_http_transport_wire_format() {
        let collector = Collector::start(200).await;
        let config = HttpTransportConfig {
            endpoint: format!("http://{}/3.0/projects/p/events", collector.addr()),
            write_key: "k".to_string(),
            timeout: Some(Duration::from_secs(5)),
        };
        let mut transport = HttpTransport::new("http", config).unwrap();

        let batch: Batch = vec![
            Event::new("test", json!({"hat": 1})),
            Event::new("test", json!({"cheese": "x"})),
        ]
        .into_iter()
        .collect();
        transport.send(&batch).await.unwrap();

        let requests = collector.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].target, "/3.0/projects/p/events?api_key=k");
        assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(
            requests[0].body,
            json!({"test": [{"hat": 1}, {"cheese": "x"}]})
        );
    }

    #[tokio::test]
    async fn test_only_200_is_success() {
        let collector = Collector::start(201).await;
        let config = HttpTransportConfig {
            endpoint: format!("http://{}/projects/p/events", collector.addr()),
            write_key: "k".to_string(),
            timeout: Some(Duration::from_secs(5)),
        };
        let mut transport = HttpTransport::new("http", config).unwrap();
        let batch: Batch = vec![Event::new("a", json!(1))].into_iter().collect();

        let err = transport.send(&batch).await.unwrap_err();
        assert!(
            matches!(err, ContractError::TransportStatus { status: 201, .. }),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn test_dispatcher_end_to_end() {
        let collector = Collector::start(200).await;
        let dispatcher = create_dispatcher(config_for(&collector)).unwrap();

        for i in 0..250 {
            let category = if i % 2 == 0 { "even" } else { "odd" };
            dispatcher.enqueue(category, json!({ "n": i })).await;
        }
        let report = dispatcher.close().await.unwrap();

        assert_eq!(report.metrics.sent_count, 250);
        assert_eq!(report.metrics.lost_count, 0);

        let requests = collector.requests();
        assert_eq!(requests.len() as u64, report.metrics.flush_count);
        for request in &requests {
            assert_eq!(request.target, "/3.0/projects/p/events?api_key=k");
            let events: usize = request
                .body
                .as_object()
                .unwrap()
                .values()
                .map(|v| v.as_array().unwrap().len())
                .sum();
            assert!(events <= 91, "batch of {events} events");
        }

        let evens: Vec<Value> = (0..250).step_by(2).map(|n| json!({ "n": n })).collect();
        let odds: Vec<Value> = (1..250).step_by(2).map(|n| json!({ "n": n })).collect();
        assert_eq!(received_for(&collector, "even"), evens);
        assert_eq!(received_for(&collector, "odd"), odds);
    }

    #[tokio::test]
    async fn test_rejected_batches_are_lost_not_retried() {
        let collector = Collector::start(500).await;
        let dispatcher = create_dispatcher(config_for(&collector)).unwrap();

        dispatcher.enqueue("a", json!(1)).await;
        dispatcher.enqueue("a", json!(2)).await;
        dispatcher.enqueue("b", json!(3)).await;
        let report = dispatcher.close().await.unwrap();

        assert_eq!(report.metrics.sent_count, 0);
        assert_eq!(report.metrics.lost_count, 3);
        assert_eq!(collector.requests().len() as u64, report.metrics.failure_count);
        assert_eq!(report.summary.batches_failed, report.metrics.failure_count);
    }

    #[tokio::test]
    async fn test_config_file_to_collector() {
        let collector = Collector::start(200).await;

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "project_id = \"site\"\n\
             write_key = \"w\"\n\
             base_url = \"http://{}/3.0/projects\"\n\
             queue_capacity = 16\n\
             flush_threshold = 8\n\
             request_timeout_ms = 5000",
            collector.addr()
        )
        .unwrap();

        let config = config_loader::ConfigLoader::load_from_path(file.path()).unwrap();
        let dispatcher = create_dispatcher(config).unwrap();

        let event = RequestEvent::new("GET", "/pricing?ref=ad")
            .with_status(200)
            .with_duration(Duration::from_millis(3))
            .with_header("User-Agent", "curl/8.0");
        dispatcher.enqueue_serialize("pageviews", &event).await;
        dispatcher.close().await.unwrap();

        let requests = collector.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target, "/3.0/projects/site/events?api_key=w");

        let views = received_for(&collector, "pageviews");
        assert_eq!(views.len(), 1);
        assert_eq!(views[0]["path"], "/pricing");
        assert_eq!(views[0]["user_agent"], "curl/8.0");
        assert_eq!(views[0]["duration_ns"], 3_000_000);
    }
}
