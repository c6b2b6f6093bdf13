#[cfg(test)]
mod tests {
    use crate::utils::{MemorySource, RecordingSinks, Respond, record_ids, settings};
    use engine_runtime::execution::{TransferExecutor, run};
    use model::records::Batch;
    use std::{
        sync::mpsc,
        thread,
        time::{Duration, Instant},
    };
    use tracing_test::traced_test;

    // Scenario: 5 rows, batch size 128, a single worker, endpoint always answers 201.
    // Expected Outcome: exactly one batch of 5 rows is delivered and the run succeeds.
    #[traced_test]
    #[test]
    fn tc01() {
        let sinks = RecordingSinks::new(Respond::Always(201));
        let mut source = MemorySource::with_rows(5);

        let report = run(settings(128, 1, 20), sinks.clone(), &mut source).unwrap();

        assert!(report.success);
        assert_eq!(report.rows_uploaded(), 5);
        let sizes: Vec<usize> = sinks.accepted().iter().map(Batch::row_count).collect();
        assert_eq!(sizes, vec![5]);
        assert_eq!(sinks.attempts(), 1);
        assert!(logs_contain("Upload finished successfully"));
    }

    // Scenario: 300 rows, batch size 128, two workers, endpoint always answers 201.
    // Expected Outcome: batches of 128, 128 and 44 rows; all 300 rows arrive in source order.
    #[traced_test]
    #[test]
    fn tc02() {
        let sinks = RecordingSinks::new(Respond::Always(201));
        let mut source = MemorySource::with_rows(300);

        let report = run(settings(128, 2, 20), sinks.clone(), &mut source).unwrap();

        assert!(report.success);
        assert_eq!(report.rows_uploaded(), 300);

        let accepted = sinks.accepted();
        let sizes: Vec<usize> = accepted.iter().map(Batch::row_count).collect();
        assert_eq!(sizes, vec![128, 128, 44]);

        let ids: Vec<String> = accepted.iter().flat_map(record_ids).collect();
        let expected: Vec<String> = (0..300).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    // Scenario: batch size 10, 3 attempts per batch, endpoint always answers 500.
    // Expected Outcome: the first batch is abandoned after exactly 3 attempts, the
    // producer is released and the run ends with a failure in bounded time.
    #[traced_test]
    #[test]
    fn tc03() {
        let sinks = RecordingSinks::new(Respond::Always(500));
        let mut source = MemorySource::with_rows(1_000);

        let started = Instant::now();
        let report = run(settings(10, 1, 3), sinks.clone(), &mut source).unwrap();

        assert!(!report.success);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(sinks.attempts(), 3);
        assert_eq!(report.metrics.failed_attempts, 3);
        assert_eq!(report.rows_uploaded(), 0);
        assert!(source.rows_streamed < 1_000, "producer kept reading");
        assert!(logs_contain("Upload finished with errors"));
    }

    // Scenario: the source breaks off after 50 of 200 rows; batch size 10, one worker.
    // Expected Outcome: the producer stops, batches already handed over are still
    // delivered, and the run reports failure.
    #[traced_test]
    #[test]
    fn tc04() {
        let sinks = RecordingSinks::new(Respond::Always(201));
        let mut source = MemorySource::with_rows(200).failing_after(50);

        let report = run(settings(10, 1, 20), sinks.clone(), &mut source).unwrap();

        assert!(!report.success);
        assert_eq!(report.metrics.rows_read, 50);

        let delivered = sinks.accepted_rows();
        assert!((40..=50).contains(&delivered), "delivered {delivered} rows");
        assert_eq!(delivered % 10, 0);
        assert_eq!(report.rows_uploaded(), delivered as u64);
        assert!(logs_contain("Extraction failed"));
        assert!(logs_contain("Upload finished with errors"));
    }

    // Scenario: assorted row counts and batch sizes.
    // Expected Outcome: ceil(N / B) batches, every one full except possibly the last,
    // concatenation equals the source order.
    #[test]
    fn tc05() {
        for (rows, batch_size, workers) in [(1, 1, 1), (10, 3, 2), (99, 10, 3), (100, 10, 4)] {
            let sinks = RecordingSinks::new(Respond::Always(201));
            let mut source = MemorySource::with_rows(rows);

            let report = run(settings(batch_size, workers, 20), sinks.clone(), &mut source)
                .unwrap();
            assert!(report.success);

            let accepted = sinks.accepted();
            assert_eq!(accepted.len(), rows.div_ceil(batch_size));
            let (last, full) = accepted.split_last().unwrap();
            assert!(full.iter().all(|b| b.row_count() == batch_size));
            assert!(last.row_count() <= batch_size && last.row_count() > 0);

            let ids: Vec<String> = accepted.iter().flat_map(record_ids).collect();
            let expected: Vec<String> = (0..rows).map(|i| i.to_string()).collect();
            assert_eq!(ids, expected, "rows={rows} batch_size={batch_size}");
        }
    }

    // Scenario: no worker can build its upload client.
    // Expected Outcome: nothing is sent, nobody hangs and the run fails.
    #[traced_test]
    #[test]
    fn tc06() {
        let sinks = RecordingSinks::new(Respond::NoClient);
        let mut source = MemorySource::with_rows(500);

        let started = Instant::now();
        let report = run(settings(10, 4, 20), sinks.clone(), &mut source).unwrap();

        assert!(!report.success);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(sinks.attempts(), 0);
        assert_eq!(report.rows_uploaded(), 0);
    }

    // Scenario: many small batches spread over several slow workers.
    // Expected Outcome: the upload counter ends up equal to the rows read.
    #[test]
    fn tc07() {
        let sinks = RecordingSinks::new(Respond::Slow(Duration::from_millis(1)));
        let mut source = MemorySource::with_rows(1_000);

        let report = run(settings(7, 4, 20), sinks.clone(), &mut source).unwrap();

        assert!(report.success);
        assert_eq!(report.metrics.rows_read, 1_000);
        assert_eq!(report.rows_uploaded(), report.metrics.rows_read);
        assert_eq!(report.metrics.batches_delivered, 143);
        assert_eq!(sinks.accepted_rows(), 1_000);
    }

    // Scenario: the endpoint fails the first five attempts, then recovers.
    // Expected Outcome: retries absorb the failures and the run succeeds.
    #[test]
    fn tc08() {
        let sinks = RecordingSinks::new(Respond::FailFirst(5));
        let mut source = MemorySource::with_rows(40);

        let report = run(settings(10, 2, 20), sinks.clone(), &mut source).unwrap();

        assert!(report.success);
        assert_eq!(report.rows_uploaded(), 40);
        assert_eq!(report.metrics.failed_attempts, 5);
        assert_eq!(sinks.attempts(), 9);
    }

    // Scenario: the run is aborted from another thread while workers are busy.
    // Expected Outcome: every thread exits promptly and the run fails.
    #[test]
    fn tc09() {
        let sinks = RecordingSinks::new(Respond::Slow(Duration::from_millis(20)));
        let mut source = MemorySource::with_rows(10_000);

        let executor = TransferExecutor::new(settings(10, 2, 20), sinks.clone()).unwrap();
        let abort = executor.abort_handle();
        let aborter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            abort.abort()
        });

        let started = Instant::now();
        let report = executor.execute(&mut source).unwrap();
        assert!(aborter.join().unwrap());

        assert!(!report.success);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(report.rows_uploaded() < 10_000);
        assert_eq!(report.rows_uploaded(), sinks.accepted_rows() as u64);
    }

    // Scenario: the source table does not exist.
    // Expected Outcome: the query never runs and the run fails without uploads.
    #[test]
    fn tc10() {
        let sinks = RecordingSinks::new(Respond::Always(201));
        let mut source = MemorySource::with_rows(10);
        let mut settings = settings(10, 2, 20);
        settings.source_table = "no_such_table".to_string();

        let report = run(settings, sinks.clone(), &mut source).unwrap();

        assert!(!report.success);
        assert!(source.queries.is_empty());
        assert_eq!(sinks.attempts(), 0);
    }

    // Scenario: a row filter is configured.
    // Expected Outcome: it ends up in the WHERE clause of the source query.
    #[test]
    fn tc11() {
        let sinks = RecordingSinks::new(Respond::Always(201));
        let mut source = MemorySource::with_rows(3);
        let mut settings = settings(10, 1, 20);
        settings.filter = Some("id > 0".to_string());

        let report = run(settings, sinks, &mut source).unwrap();

        assert!(report.success);
        assert_eq!(source.queries, vec!["SELECT * FROM `events` WHERE id > 0;"]);
    }

    // Scenario: the only upload worker panics on its first batch while 100 rows
    // are still waiting to be extracted.
    // Expected Outcome: the producer is released instead of blocking on the full
    // queue, and the run ends with a failure in bounded time.
    #[test]
    fn tc12() {
        let sinks = RecordingSinks::new(Respond::Panic);
        let (tx, rx) = mpsc::channel();

        let runner = thread::spawn(move || {
            let mut source = MemorySource::with_rows(100);
            let report = run(settings(10, 1, 3), sinks.clone(), &mut source).unwrap();
            let _ = tx.send((report, sinks.accepted_rows()));
        });

        let (report, accepted) = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        runner.join().unwrap();

        assert!(!report.success);
        assert_eq!(report.rows_uploaded(), 0);
        assert_eq!(accepted, 0);
    }
}
