#![no_main]

use libfuzzer_sys::fuzz_target;
use lnaudit_core::LOG_TIMESTAMP_FORMAT;
use lnaudit_logs::{LineClass, LineClassifier};

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    let Ok(classifier) = LineClassifier::new() else {
        return;
    };
    if let LineClass::Timestamped(timestamp) = classifier.classify(&line) {
        let rendered = timestamp.format(LOG_TIMESTAMP_FORMAT).to_string();
        assert!(line.starts_with(&rendered));
    }
});
