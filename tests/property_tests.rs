//! Property-based tests for monitor_runtime using proptest

use crossbeam_channel::bounded;
use monitor_runtime::prelude::*;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop::sample::select(LogLevel::ALL.to_vec())
}

/// Levels a caller can log at without ending the thread or the process
fn returning_level() -> impl Strategy<Value = LogLevel> {
    prop::sample::select(vec![
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ])
}

#[derive(Clone, Default)]
struct Counter(Arc<Mutex<Vec<String>>>);

impl Appender for Counter {
    fn append(&mut self, line: &str) -> Result<()> {
        self.0.lock().push(line.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "counter"
    }
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Names round-trip through Display and FromStr
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_string().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Parsing ignores case
    #[test]
    fn test_log_level_case_insensitive(level in any_level(), upper in any::<bool>()) {
        let name = if upper {
            level.as_str().to_uppercase()
        } else {
            level.as_str().to_string()
        };
        prop_assert_eq!(name.parse::<LogLevel>().unwrap(), level);
    }

    /// Ordering agrees with the numeric representation
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, (a as u8) <= (b as u8));
        prop_assert_eq!(a < b, (a as u8) < (b as u8));
    }

    /// Unknown names are rejected by the parser and resolve to info in config
    #[test]
    fn test_unknown_level_names(name in "[a-z]{1,12}") {
        prop_assume!(LogLevel::ALL.iter().all(|l| l.as_str() != name) && name != "warning");
        prop_assert!(name.parse::<LogLevel>().is_err());

        let (_logger, level) =
            configure_logger(&LoggingConfig::default().with_level(name)).unwrap();
        prop_assert_eq!(level.level(), LogLevel::Info);
    }
}

// ============================================================================
// Level Gating Tests
// ============================================================================

proptest! {
    /// A record is written exactly when its level is at or above the threshold
    #[test]
    fn test_level_gating(threshold in any_level(), calls in prop::collection::vec(returning_level(), 0..40)) {
        let counter = Counter::default();
        let logger = Logger::builder()
            .level(threshold)
            .appender(counter.clone())
            .build();

        for level in &calls {
            logger.log(*level, "message");
        }

        let expected = calls.iter().filter(|l| **l >= threshold).count();
        prop_assert_eq!(counter.0.lock().len(), expected);
    }

    /// A threshold change applies to the very next call
    #[test]
    fn test_level_mutation_visible(initial in any_level(), updated in any_level(), level in returning_level()) {
        let counter = Counter::default();
        let logger = Logger::builder()
            .level(initial)
            .appender(counter.clone())
            .build();
        let handle = logger.level_handle();

        prop_assert_eq!(handle.set_level(updated), initial);
        logger.log(level, "after change");

        prop_assert_eq!(counter.0.lock().len(), usize::from(level >= updated));
    }

    /// Every emitted record is one line of JSON carrying the message unchanged
    #[test]
    fn test_record_is_single_json_line(message in ".*", key in "[a-z_]{1,8}", value in any::<i64>()) {
        prop_assume!(!["level", "ts", "msg"].contains(&key.as_str()));
        let counter = Counter::default();
        let logger = Logger::builder().appender(counter.clone()).build();

        logger.info_with_context(message.clone(), LogContext::new().with_field(key.clone(), value));

        let lines = counter.0.lock();
        prop_assert_eq!(lines.len(), 1);
        prop_assert!(lines[0].ends_with('\n'));
        prop_assert_eq!(lines[0].matches('\n').count(), 1);

        let record: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        prop_assert_eq!(record["msg"].as_str().unwrap(), message.as_str());
        prop_assert_eq!(record[key.as_str()].as_i64().unwrap(), value);
    }
}

// ============================================================================
// Dispatch Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Each request is either received exactly once or returned to its
    /// sender, never both and never neither
    #[test]
    fn test_at_most_once_delivery(capacity in 0usize..3, requests in 1usize..16, reads in 0usize..16) {
        let dispatcher = Dispatcher::new(Logger::disabled());
        let (tx, rx) = bounded::<usize>(capacity);

        let reader = thread::spawn(move || {
            let mut received = Vec::new();
            for _ in 0..reads {
                match rx.recv_timeout(Duration::from_millis(30)) {
                    Ok(request) => received.push(request),
                    Err(_) => break,
                }
            }
            // Everything accepted before the senders hung up.
            received.extend(rx.iter());
            received
        });

        let mut delivered = HashSet::new();
        let mut returned = HashSet::new();
        for request in 0..requests {
            match dispatcher.send_timeout(&tx, request, Duration::from_millis(5)) {
                Ok(()) => { delivered.insert(request); }
                Err(undelivered) => { returned.insert(undelivered.into_inner()); }
            }
        }
        drop(tx);

        let received = reader.join().unwrap();
        let received_set: HashSet<_> = received.iter().copied().collect();

        prop_assert_eq!(received.len(), received_set.len(), "duplicate delivery");
        prop_assert_eq!(&received_set, &delivered);
        prop_assert!(delivered.is_disjoint(&returned));
        prop_assert_eq!(delivered.len() + returned.len(), requests);
    }

    /// Zero and negative budgets never block
    #[test]
    fn test_non_positive_timeout_never_waits(timeout_secs in i64::MIN..=0) {
        let dispatcher = Dispatcher::new(Logger::disabled());
        let (tx, _rx) = bounded::<u8>(0);

        let started = std::time::Instant::now();
        let outcome = dispatcher.send(&tx, 1, timeout_secs);
        prop_assert!(outcome.is_err());
        prop_assert!(started.elapsed() < Duration::from_millis(100));
    }
}
