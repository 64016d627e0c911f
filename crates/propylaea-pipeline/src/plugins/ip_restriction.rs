//! IP restriction plugin.
//!
//! Rules are dotted IP patterns where a `*` segment matches any value,
//! e.g. `192.168.*.*`. A whitelist match admits the caller outright; only
//! then is the blacklist consulted.

use propylaea_core::{ApiPlugin, GatewayError, GatewayResult, PluginCodec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// The registry kind of the IP restriction plugin.
pub const IP_RESTRICTION_KIND: &str = "ip.restriction";

/// Per-definition IP admission rules.
///
/// # Example
///
/// ```
/// use propylaea_pipeline::plugins::IpRestrictionPlugin;
///
/// let plugin = IpRestrictionPlugin::new(
///     vec!["10.4.7.*".to_string()],
///     vec!["10.4.*.*".to_string()],
/// );
/// // Whitelist wins over the broader blacklist rule.
/// assert!(plugin.permits("10.4.7.15"));
/// assert!(!plugin.permits("10.4.8.15"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRestrictionPlugin {
    /// Patterns that always admit a caller.
    #[serde(default)]
    whitelist: Vec<String>,
    /// Patterns that deny a caller not whitelisted.
    #[serde(default)]
    blacklist: Vec<String>,
}

impl IpRestrictionPlugin {
    /// Creates a plugin from whitelist and blacklist rules.
    #[must_use]
    pub fn new(whitelist: Vec<String>, blacklist: Vec<String>) -> Self {
        Self {
            whitelist,
            blacklist,
        }
    }

    /// Returns the whitelist rules.
    #[must_use]
    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    /// Returns the blacklist rules.
    #[must_use]
    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    /// Decides whether the caller IP is admitted.
    ///
    /// Whitelist first: a whitelisted IP is admitted even when a blacklist
    /// rule also covers it. An IP matching neither list is admitted.
    #[must_use]
    pub fn permits(&self, ip: &str) -> bool {
        if self.whitelist.iter().any(|rule| rule_matches(rule, ip)) {
            return true;
        }
        !self.blacklist.iter().any(|rule| rule_matches(rule, ip))
    }
}

impl ApiPlugin for IpRestrictionPlugin {
    fn kind(&self) -> &'static str {
        IP_RESTRICTION_KIND
    }

    fn encode(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches a dotted rule against a dotted IP, segment by segment.
fn rule_matches(rule: &str, ip: &str) -> bool {
    if rule == "*" {
        return true;
    }
    let rule_segments: Vec<&str> = rule.split('.').collect();
    let ip_segments: Vec<&str> = ip.split('.').collect();
    if rule_segments.len() != ip_segments.len() {
        return false;
    }
    rule_segments
        .iter()
        .zip(&ip_segments)
        .all(|(r, i)| *r == "*" || r == i)
}

/// Codec for [`IpRestrictionPlugin`].
#[derive(Debug, Default)]
pub struct IpRestrictionCodec;

impl PluginCodec for IpRestrictionCodec {
    fn kind(&self) -> &'static str {
        IP_RESTRICTION_KIND
    }

    fn decode(&self, doc: &Value) -> GatewayResult<Arc<dyn ApiPlugin>> {
        let plugin: IpRestrictionPlugin = serde_json::from_value(doc.clone())
            .map_err(|e| GatewayError::validation(format!("invalid ip.restriction plugin: {e}")))?;
        Ok(Arc::new(plugin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_rule() {
        let plugin = IpRestrictionPlugin::new(Vec::new(), vec!["10.4.7.15".to_string()]);
        assert!(!plugin.permits("10.4.7.15"));
        assert!(plugin.permits("10.4.7.16"));
    }

    #[test]
    fn test_wildcard_segments() {
        let plugin = IpRestrictionPlugin::new(Vec::new(), vec!["192.168.*.*".to_string()]);
        assert!(!plugin.permits("192.168.1.1"));
        assert!(!plugin.permits("192.168.250.9"));
        assert!(plugin.permits("192.169.1.1"));
    }

    #[test]
    fn test_whitelist_wins_over_blacklist() {
        let plugin = IpRestrictionPlugin::new(
            vec!["10.4.7.*".to_string()],
            vec!["10.4.*.*".to_string()],
        );
        assert!(plugin.permits("10.4.7.1"));
        assert!(!plugin.permits("10.4.8.1"));
    }

    #[test]
    fn test_unlisted_ip_is_admitted() {
        let plugin = IpRestrictionPlugin::new(
            vec!["10.0.0.1".to_string()],
            vec!["10.0.0.2".to_string()],
        );
        assert!(plugin.permits("172.16.0.1"));
    }

    #[test]
    fn test_bare_star_matches_everything() {
        let plugin = IpRestrictionPlugin::new(Vec::new(), vec!["*".to_string()]);
        assert!(!plugin.permits("1.2.3.4"));
    }

    #[test]
    fn test_codec_round_trip() {
        let plugin = IpRestrictionPlugin::new(
            vec!["10.4.7.*".to_string()],
            vec!["10.4.*.*".to_string()],
        );
        let decoded = IpRestrictionCodec
            .decode(&plugin.encode())
            .unwrap();
        let concrete = decoded
            .as_any()
            .downcast_ref::<IpRestrictionPlugin>()
            .unwrap();
        assert_eq!(concrete, &plugin);
    }

    #[test]
    fn test_codec_defaults_missing_lists() {
        let decoded = IpRestrictionCodec.decode(&json!({})).unwrap();
        let concrete = decoded
            .as_any()
            .downcast_ref::<IpRestrictionPlugin>()
            .unwrap();
        assert!(concrete.whitelist().is_empty());
        assert!(concrete.blacklist().is_empty());
    }
}
