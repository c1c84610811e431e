use serde::{Deserialize, Deserializer};
use std::fmt;

/// A sensor value as the device reports it, rendered verbatim
///
/// Firmware revisions differ on whether readings are JSON numbers or
/// preformatted strings, so both are accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measurement(String);

impl Measurement {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Measurement {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Measurement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// Binary actuator output (relay/LED)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActuatorState {
    On,
    #[default]
    Off,
}

impl ActuatorState {
    /// Display class of the actuator indicator
    pub fn class(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl<'de> Deserialize<'de> for ActuatorState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Number(f64),
            Text(String),
            Nothing(()),
        }

        // the device page compares loosely against 1
        let on = match Raw::deserialize(deserializer)? {
            Raw::Flag(flag) => flag,
            Raw::Number(n) => n == 1.0,
            Raw::Text(s) => s.trim().parse::<f64>().is_ok_and(|n| n == 1.0),
            Raw::Nothing(()) => false,
        };

        Ok(if on { Self::On } else { Self::Off })
    }
}

/// Payload of `GET /dhtSensor.json`
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SensorReadings {
    #[serde(default)]
    pub temp: Option<Measurement>,
    #[serde(default)]
    distance: Option<Measurement>,
    // older firmware reports the distance under the DHT era field name
    #[serde(default)]
    humidity: Option<Measurement>,
    #[serde(default)]
    pub actuator: ActuatorState,
}

impl SensorReadings {
    pub fn new(
        temp: Option<Measurement>,
        distance: Option<Measurement>,
        actuator: ActuatorState,
    ) -> Self {
        Self {
            temp,
            distance,
            humidity: None,
            actuator,
        }
    }

    /// Distance reading, falling back to the legacy `humidity` field
    pub fn distance(&self) -> Option<&Measurement> {
        self.distance.as_ref().or(self.humidity.as_ref())
    }
}

/// Payload of `GET /localTime.json`
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct LocalTime {
    pub time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SensorReadings {
        serde_json::from_str(json).unwrap()
    }

    mod distance {
        use super::*;

        #[test]
        fn prefers_distance_field() {
            let readings = parse(r#"{"temp": 21.5, "distance": 42, "humidity": 7}"#);
            assert_eq!(readings.distance().map(Measurement::as_str), Some("42"));
        }

        #[test]
        fn falls_back_to_humidity() {
            let readings = parse(r#"{"temp": "21.5", "humidity": "30.2"}"#);
            assert_eq!(readings.distance().map(Measurement::as_str), Some("30.2"));
        }

        #[test]
        fn keeps_zero_distance() {
            let readings = parse(r#"{"distance": 0, "humidity": 5}"#);
            assert_eq!(readings.distance().map(Measurement::as_str), Some("0"));
        }

        #[test]
        fn missing_both_fields_is_none() {
            let readings = parse(r#"{"temp": 20}"#);
            assert!(readings.distance().is_none());
        }
    }

    mod actuator {
        use super::*;

        fn actuator(value: &str) -> ActuatorState {
            parse(&format!(r#"{{"actuator": {value}}}"#)).actuator
        }

        #[test]
        fn one_is_on() {
            assert_eq!(actuator("1"), ActuatorState::On);
            assert_eq!(actuator("\"1\""), ActuatorState::On);
            assert_eq!(actuator("true"), ActuatorState::On);
            assert_eq!(actuator("1.0"), ActuatorState::On);
        }

        #[test]
        fn anything_else_is_off() {
            assert_eq!(actuator("0"), ActuatorState::Off);
            assert_eq!(actuator("2"), ActuatorState::Off);
            assert_eq!(actuator("\"x\""), ActuatorState::Off);
            assert_eq!(actuator("false"), ActuatorState::Off);
            assert_eq!(actuator("null"), ActuatorState::Off);
        }

        #[test]
        fn absent_is_off() {
            assert_eq!(parse("{}").actuator, ActuatorState::Off);
        }

        #[test]
        fn classes_match_indicator_styles() {
            assert_eq!(ActuatorState::On.class(), "on");
            assert_eq!(ActuatorState::Off.class(), "off");
        }
    }

    #[test]
    fn measurement_renders_verbatim() {
        let readings = parse(r#"{"temp": 23.40}"#);
        // serde_json keeps the shortest float representation
        assert_eq!(readings.temp.unwrap().to_string(), "23.4");
        assert_eq!(parse(r#"{"temp": "23.40"}"#).temp.unwrap().as_str(), "23.40");
    }

    #[test]
    fn parses_local_time() {
        let time: LocalTime = serde_json::from_str(r#"{"time": "18/10/2026 12:00:01"}"#).unwrap();
        assert_eq!(time.time, "18/10/2026 12:00:01");
    }
}
