#[cfg(test)]
mod tests {
    use crate::utils::{DEST_DB, DEST_TABLE, FakeEndpoint, MemorySource, settings};
    use engine_config::settings::TransferSettings;
    use engine_runtime::execution::run;
    use serde_json::Value;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn against(
        endpoint: &FakeEndpoint,
        batch_size: usize,
        workers: usize,
        retries: usize,
    ) -> TransferSettings {
        let mut settings = settings(batch_size, workers, retries);
        settings.port = endpoint.port;
        settings
    }

    // Scenario: full run against a loopback HTTP endpoint with an auth token.
    // Expected Outcome: every row is POSTed once, as JSON arrays of records addressed
    // to the destination database and table, with the token header attached.
    #[traced_test]
    #[test]
    fn http_round_trip() {
        let endpoint = FakeEndpoint::start(vec![201]);
        let mut settings = against(&endpoint, 10, 2, 5);
        settings.auth_token = Some("secret-token".to_string());
        let sinks = Arc::new(settings.sink_config());
        let mut source = MemorySource::with_rows(25);

        let report = run(settings, sinks, &mut source).unwrap();

        assert!(report.success);
        assert_eq!(report.rows_uploaded(), 25);

        let bodies = endpoint.bodies();
        assert_eq!(bodies.len(), 3);

        let mut ids = Vec::new();
        for body in &bodies {
            let records: Value = serde_json::from_str(body).unwrap();
            for record in records.as_array().unwrap() {
                assert_eq!(record["database"], DEST_DB);
                assert_eq!(record["table"], DEST_TABLE);
                let id: usize = record["data"]["id"].as_str().unwrap().parse().unwrap();
                assert_eq!(
                    record["data"]["payload"].as_str().unwrap(),
                    format!("value \"{id}\"")
                );
                ids.push(id);
            }
        }
        ids.sort();
        assert_eq!(ids, (0..25).collect::<Vec<_>>());

        for head in endpoint.headers() {
            let lowered = head.to_ascii_lowercase();
            assert!(head.starts_with("POST /api/v1/tables/insert "), "{head}");
            assert!(lowered.contains("authorization: token secret-token"), "{head}");
            assert!(
                lowered.contains("content-type: application/json; charset=utf-8"),
                "{head}"
            );
        }
    }

    // Scenario: the endpoint answers 503 twice before accepting.
    // Expected Outcome: the batch is retried and delivered once.
    #[test]
    fn http_transient_failures_are_retried() {
        let endpoint = FakeEndpoint::start(vec![503, 503, 201]);
        let settings = against(&endpoint, 10, 1, 5);
        let sinks = Arc::new(settings.sink_config());
        let mut source = MemorySource::with_rows(5);

        let report = run(settings, sinks, &mut source).unwrap();

        assert!(report.success);
        assert_eq!(report.metrics.failed_attempts, 2);
        assert_eq!(endpoint.bodies().len(), 1);
    }

    // Scenario: the endpoint answers 200 instead of 201 on every request.
    // Expected Outcome: 200 is not success; retries run out and the run fails.
    #[test]
    fn http_ok_is_not_created() {
        let endpoint = FakeEndpoint::start(vec![200]);
        let settings = against(&endpoint, 10, 1, 2);
        let sinks = Arc::new(settings.sink_config());
        let mut source = MemorySource::with_rows(5);

        let report = run(settings, sinks, &mut source).unwrap();

        assert!(!report.success);
        assert_eq!(report.metrics.failed_attempts, 2);
        assert_eq!(report.rows_uploaded(), 0);
    }
}
