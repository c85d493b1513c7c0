//! Per-thread capture of `log` records for assertions in unit tests.

use std::cell::RefCell;
use std::sync::Once;

thread_local! {
    static RECORDS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        RECORDS.with(|r| {
            r.borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Install the capturing logger and clear this thread's records.
pub fn start() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("another logger is installed");
        log::set_max_level(log::LevelFilter::Trace);
    });
    RECORDS.with(|r| r.borrow_mut().clear());
}

/// Take the records logged on this thread since the last call.
pub fn take() -> Vec<(log::Level, String)> {
    RECORDS.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

/// Number of records at exactly `level` in `records`.
pub fn count(records: &[(log::Level, String)], level: log::Level) -> usize {
    records.iter().filter(|(l, _)| *l == level).count()
}
