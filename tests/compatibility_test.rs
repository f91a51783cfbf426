use msdsort::{RadixKey, parallel_sort_with_threads, sort};

// Simulate an external record type (like a log event with a timestamp key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LogEvent {
    timestamp: i64,
    source: u32,
}

// Implement RadixKey for the external struct. Only the key accessor is
// needed; the default comparison fallback does the rest. This proves the
// trait is implementable by "outside crates".
impl RadixKey for LogEvent {
    fn key(&self) -> i64 {
        self.timestamp
    }
}

#[test]
fn test_external_struct_compatibility() {
    let mut events = vec![
        LogEvent { timestamp: 30, source: 1 },
        LogEvent { timestamp: -10, source: 2 },
        LogEvent { timestamp: 20, source: 3 },
    ];

    sort(&mut events, 0, 3).unwrap();

    let sources: Vec<u32> = events.iter().map(|e| e.source).collect();
    assert_eq!(sources, vec![2, 3, 1]);
}

#[test]
fn test_external_struct_at_radix_scale() {
    let count = 100_000;
    let mut events: Vec<LogEvent> = (0..count)
        .map(|i| LogEvent {
            timestamp: ((i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)) as i64,
            source: i as u32,
        })
        .collect();

    parallel_sort_with_threads(&mut events, 0, count, 4).unwrap();

    for window in events.windows(2) {
        assert!(window[0].timestamp <= window[1].timestamp);
    }
}
