#![no_main]

use libfuzzer_sys::fuzz_target;
use lnaudit_core::ReportKind;
use lnaudit_logs::{AuditEvent, EventExtractor};

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    for kind in ReportKind::ALL {
        let Ok(extractor) = EventExtractor::new(kind) else {
            return;
        };
        match extractor.extract(&line) {
            Some(AuditEvent::RoutingFailure(event)) => {
                assert!(kind.requires_channel_metadata());
                assert!(line.contains(&event.channel_point));
            }
            Some(AuditEvent::PeerConnect(event)) => {
                assert_eq!(kind, ReportKind::WatchtowerPeers);
                assert!(line.contains(&event.address));
            }
            Some(AuditEvent::DialFailure(event)) => {
                assert_eq!(kind, ReportKind::WtclientFailures);
                assert!(line.contains(&event.address));
                assert!(line.contains(&event.error));
            }
            None => {}
        }
    }
});
