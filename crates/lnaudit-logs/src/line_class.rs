use chrono::NaiveDateTime;
use lnaudit_core::LOG_TIMESTAMP_FORMAT;
use regex::Regex;

const LOG_RECORD_START_PATTERN: &str = r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\..+";

/// Outcome of inspecting one raw log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Starts a record with a valid timestamp.
    Timestamped(NaiveDateTime),
    /// Has the record-start shape but the timestamp does not parse.
    Malformed,
    /// Belongs to the preceding record (stack traces, wrapped output).
    Continuation,
}

/// Recognizes the leading timestamp of lnd log records.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    record_start: Regex,
}

impl LineClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            record_start: Regex::new(LOG_RECORD_START_PATTERN)?,
        })
    }

    pub fn classify(&self, line: &str) -> LineClass {
        let Some(captures) = self.record_start.captures(line) else {
            return LineClass::Continuation;
        };
        let raw = captures.get(1).map(|group| group.as_str()).unwrap_or_default();
        match NaiveDateTime::parse_from_str(raw, LOG_TIMESTAMP_FORMAT) {
            Ok(timestamp) => LineClass::Timestamped(timestamp),
            Err(_) => LineClass::Malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::{LineClass, LineClassifier};

    #[test]
    fn unit_classify_parses_leading_timestamp() {
        let classifier = LineClassifier::new().expect("classifier");
        let class = classifier.classify("2024-02-11 09:15:42.118 [INF] HSWC: started");
        assert_eq!(
            class,
            LineClass::Timestamped(
                NaiveDateTime::parse_from_str("2024-02-11 09:15:42", "%Y-%m-%d %H:%M:%S")
                    .expect("timestamp")
            )
        );
    }

    #[test]
    fn unit_classify_flags_impossible_dates_as_malformed() {
        let classifier = LineClassifier::new().expect("classifier");
        assert_eq!(
            classifier.classify("2024-13-45 09:15:42.118 [INF] HSWC: broken clock"),
            LineClass::Malformed
        );
        assert_eq!(
            classifier.classify("2024-02-11 25:61:00.000 [INF] HSWC: broken clock"),
            LineClass::Malformed
        );
    }

    #[test]
    fn unit_classify_treats_unstamped_lines_as_continuations() {
        let classifier = LineClassifier::new().expect("classifier");
        assert_eq!(
            classifier.classify("goroutine 1 [running]:"),
            LineClass::Continuation
        );
        assert_eq!(classifier.classify(""), LineClass::Continuation);
        // The fractional part is required by the record-start shape.
        assert_eq!(
            classifier.classify("2024-02-11 09:15:42 [INF] no fraction"),
            LineClass::Continuation
        );
        assert_eq!(
            classifier.classify("  2024-02-11 09:15:42.000 indented"),
            LineClass::Continuation
        );
    }
}
