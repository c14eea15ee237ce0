use serde_json::json;
use tracing::{debug, warn};

use limit_battery_platform::{BatterySource, LEVEL_UNAVAILABLE};
use limit_battery_protocol::{ErrorEnvelope, GET_BATTERY_LEVEL, MSG_LEVEL_UNAVAILABLE};

/// Outcome of a method call on the battery channel.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodReply {
    Success(serde_json::Value),
    Error(ErrorEnvelope),
}

/// Handler for the `plugins.limit.io/battery` method channel.
///
/// A single synchronous read per call, no retries: the sentinel and any
/// platform failure both answer `UNAVAILABLE`, and unrecognized method names
/// answer `NOT_IMPLEMENTED`.
pub struct BatteryLevelHandler<S: BatterySource> {
    source: S,
}

impl<S: BatterySource> BatteryLevelHandler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn on_method_call(&mut self, method: &str) -> MethodReply {
        match method {
            GET_BATTERY_LEVEL => self.get_battery_level(),
            other => {
                debug!(method = other, "unrecognized method");
                MethodReply::Error(ErrorEnvelope::not_implemented(other))
            }
        }
    }

    fn get_battery_level(&mut self) -> MethodReply {
        match self.source.level_percent() {
            Ok(LEVEL_UNAVAILABLE) => {
                MethodReply::Error(ErrorEnvelope::unavailable(MSG_LEVEL_UNAVAILABLE))
            }
            Ok(level) => MethodReply::Success(json!(level)),
            Err(e) => {
                warn!(error = %e, "battery level read failed");
                MethodReply::Error(ErrorEnvelope::unavailable(MSG_LEVEL_UNAVAILABLE))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockSource;
    use limit_battery_protocol::{CODE_NOT_IMPLEMENTED, CODE_UNAVAILABLE};

    #[test]
    fn returns_level_unchanged() {
        let mut handler = BatteryLevelHandler::new(MockSource::level(87));
        assert_eq!(
            handler.on_method_call(GET_BATTERY_LEVEL),
            MethodReply::Success(json!(87))
        );
    }

    #[test]
    fn zero_is_a_valid_level() {
        let mut handler = BatteryLevelHandler::new(MockSource::level(0));
        assert_eq!(
            handler.on_method_call(GET_BATTERY_LEVEL),
            MethodReply::Success(json!(0))
        );
    }

    #[test]
    fn full_range_is_identity() {
        for level in [1, 42, 99, 100] {
            let mut handler = BatteryLevelHandler::new(MockSource::level(level));
            assert_eq!(
                handler.on_method_call(GET_BATTERY_LEVEL),
                MethodReply::Success(json!(level))
            );
        }
    }

    #[test]
    fn sentinel_maps_to_unavailable() {
        let mut handler = BatteryLevelHandler::new(MockSource::level(LEVEL_UNAVAILABLE));
        match handler.on_method_call(GET_BATTERY_LEVEL) {
            MethodReply::Error(error) => {
                assert_eq!(error.code, CODE_UNAVAILABLE);
                assert_eq!(error.message, MSG_LEVEL_UNAVAILABLE);
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn platform_failure_maps_to_unavailable() {
        let mut handler = BatteryLevelHandler::new(MockSource::failing());
        match handler.on_method_call(GET_BATTERY_LEVEL) {
            MethodReply::Error(error) => assert_eq!(error.code, CODE_UNAVAILABLE),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let mut handler = BatteryLevelHandler::new(MockSource::level(50));
        match handler.on_method_call("getBatteryTemperature") {
            MethodReply::Error(error) => {
                assert_eq!(error.code, CODE_NOT_IMPLEMENTED);
                assert!(error.message.contains("getBatteryTemperature"));
            }
            other => panic!("expected error, got {:?}", other),
        }
    }
}
