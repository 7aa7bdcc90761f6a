//! Per-request action records and client IP attribution.
//!
//! Every page view produces one [`LogRecord`]: the action label plus the
//! IP signals seen on the request. The best-effort real client IP is chosen
//! in this order:
//!
//! 1. `CF-Connecting-IP`, set by the edge proxy and trusted as-is
//! 2. the first `X-Forwarded-For` hop that does not look private, unless
//!    that hop is empty
//! 3. the directly connected peer
//!
//! "Looks private" is a plain string-prefix check against `10.`, `172.` and
//! `192.168.`. It is approximate: `172.` covers all of 172/8,
//! not just 172.16/12.

use std::net::IpAddr;

use tracing::info;

/// Address prefixes treated as private when scanning `X-Forwarded-For`.
const PRIVATE_PREFIXES: [&str; 3] = ["10.", "172.", "192.168."];

/// One logged action with the IP signals of the request behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub action: String,
    pub real_ip: Option<String>,
    pub cf_ip: Option<String>,
    pub xff: Option<String>,
    pub remote: Option<IpAddr>,
}

impl LogRecord {
    /// Builds a record, resolving the real IP from the raw signals.
    pub fn new(
        action: impl Into<String>,
        cf_ip: Option<String>,
        xff: Option<String>,
        remote: Option<IpAddr>,
    ) -> Self {
        let real_ip = resolve_real_ip(cf_ip.as_deref(), xff.as_deref(), remote);
        LogRecord {
            action: action.into(),
            real_ip,
            cf_ip,
            xff,
            remote,
        }
    }
}

/// Picks the best-effort client IP. Returns `None` only when no signal is
/// available at all.
pub fn resolve_real_ip(
    cf_ip: Option<&str>,
    xff: Option<&str>,
    remote: Option<IpAddr>,
) -> Option<String> {
    if let Some(ip) = cf_ip.map(str::trim).filter(|ip| !ip.is_empty()) {
        return Some(ip.to_string());
    }

    let public_hop = xff
        .and_then(|chain| chain.split(',').map(str::trim).find(|hop| !is_private(hop)))
        .filter(|hop| !hop.is_empty());

    public_hop
        .map(str::to_string)
        .or_else(|| remote.map(|addr| addr.to_string()))
}

fn is_private(ip: &str) -> bool {
    PRIVATE_PREFIXES.iter().any(|prefix| ip.starts_with(prefix))
}

/// Sink for action records.
///
/// The site holds one of these for its whole lifetime; handlers never reach
/// for a global logger.
pub trait ActionLog: Send + Sync + 'static {
    fn record(&self, record: &LogRecord);
}

/// Emits each record as an INFO event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActionLog;

impl ActionLog for TracingActionLog {
    fn record(&self, record: &LogRecord) {
        let remote = record.remote.map(|addr| addr.to_string());
        info!(
            real_ip = or_none(record.real_ip.as_deref()),
            cf_ip = or_none(record.cf_ip.as_deref()),
            xff = or_none(record.xff.as_deref()),
            remote = or_none(remote.as_deref()),
            "{}",
            record.action
        );
    }
}

fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or("None")
}

/// Keeps records in memory so tests can inspect them.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingActionLog {
    records: std::sync::Mutex<Vec<LogRecord>>,
}

#[cfg(test)]
impl RecordingActionLog {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl ActionLog for RecordingActionLog {
    fn record(&self, record: &LogRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::net::Ipv4Addr;

    fn peer() -> Option<IpAddr> {
        Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)))
    }

    #[test]
    fn edge_header_wins() {
        let ip = resolve_real_ip(Some("1.2.3.4"), Some("8.8.8.8"), peer());
        assert_eq!(ip.as_deref(), Some("1.2.3.4"));
    }

    #[test]
    fn first_public_forwarded_hop() {
        let ip = resolve_real_ip(None, Some("10.0.0.5, 8.8.8.8"), peer());
        assert_eq!(ip.as_deref(), Some("8.8.8.8"));
    }

    #[test]
    fn skips_every_private_prefix() {
        let ip = resolve_real_ip(
            None,
            Some("192.168.1.1,172.31.0.2 , 10.1.1.1, 9.9.9.9, 1.1.1.1"),
            peer(),
        );
        assert_eq!(ip.as_deref(), Some("9.9.9.9"));
    }

    #[test]
    fn prefix_check_is_approximate() {
        // 172.32.x.x is public, but the prefix check still treats it as private.
        let ip = resolve_real_ip(None, Some("172.32.0.1"), peer());
        assert_eq!(ip, Some("203.0.113.9".to_string()));
    }

    #[test]
    fn all_private_hops_fall_back_to_peer() {
        let ip = resolve_real_ip(None, Some("10.0.0.1, 192.168.0.1"), peer());
        assert_eq!(ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn no_proxy_headers_uses_peer() {
        assert_eq!(
            resolve_real_ip(None, None, peer()).as_deref(),
            Some("203.0.113.9")
        );
    }

    #[test]
    fn empty_leading_hop_ends_the_search() {
        let ip = resolve_real_ip(None, Some(", 8.8.8.8"), peer());
        assert_eq!(ip.as_deref(), Some("203.0.113.9"));

        let ip = resolve_real_ip(None, Some("10.0.0.5,,8.8.8.8"), peer());
        assert_eq!(ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn empty_edge_header_is_ignored() {
        let ip = resolve_real_ip(Some(""), Some("8.8.4.4"), peer());
        assert_eq!(ip.as_deref(), Some("8.8.4.4"));
    }

    #[test]
    fn nothing_known() {
        assert_eq!(resolve_real_ip(None, None, None), None);
    }

    #[test]
    fn record_keeps_raw_signals() {
        let record = LogRecord::new(
            "Viewed Home Page",
            None,
            Some("10.0.0.5, 8.8.8.8".to_string()),
            peer(),
        );

        assert_eq!(record.real_ip.as_deref(), Some("8.8.8.8"));
        assert_eq!(record.xff.as_deref(), Some("10.0.0.5, 8.8.8.8"));
        assert_eq!(record.cf_ip, None);
        assert_eq!(record.remote, peer());
    }

    #[test]
    fn recording_log_collects_in_order() {
        let log = RecordingActionLog::default();
        log.record(&LogRecord::new("first", None, None, None));
        log.record(&LogRecord::new("second", None, None, None));

        let actions: Vec<_> = log.records().into_iter().map(|r| r.action).collect();
        assert_eq!(actions, ["first", "second"]);
    }

    fn arb_ipv4() -> impl Strategy<Value = String> {
        (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>())
            .prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}"))
    }

    proptest! {
        #[test]
        fn edge_header_always_wins(
            cf in arb_ipv4(),
            chain in prop::collection::vec(arb_ipv4(), 0..5),
        ) {
            let xff = chain.join(", ");
            let ip = resolve_real_ip(Some(cf.as_str()), Some(xff.as_str()), peer());
            prop_assert_eq!(ip, Some(cf));
        }

        #[test]
        fn resolved_hop_is_never_private(chain in prop::collection::vec(arb_ipv4(), 1..6)) {
            let xff = chain.join(",");
            let ip = resolve_real_ip(None, Some(xff.as_str()), None);
            match ip {
                Some(ip) => {
                    prop_assert!(!is_private(&ip));
                    prop_assert!(chain.contains(&ip));
                }
                None => prop_assert!(chain.iter().all(|hop| is_private(hop))),
            }
        }
    }
}
