//! Interference power measurement type and reply parsing

use crate::error::{CellError, CellResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pattern for the measurement unit attribute, e.g. `Unit="dBm"`
static UNIT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"Unit="([a-zA-Z]+)""#).expect("invalid unit pattern"));

/// Pattern for one power sample attribute, e.g. `P12="-101.52"`
static POWER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"P[0-9]+="(-?[0-9]+\.[0-9]+)""#).expect("invalid power pattern"));

/// Interference power trace reported by the instrument
///
/// The instrument answers a measurement query with an XML-like attribute
/// list carrying the unit and one `P<n>` attribute per trace sample.
/// Serialized field names match the upstream JSON contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterferencePower {
    #[serde(rename = "Unit")]
    pub unit: String,
    #[serde(rename = "Powertrace")]
    pub powertrace: Vec<f32>,
}

impl InterferencePower {
    /// Parse an interference power trace from a raw measurement reply.
    ///
    /// # Errors
    /// Returns `CellError::Parse` if the reply carries no unit or no power
    /// samples, or if a sample value is not a valid float.
    pub fn parse(reply: &[u8]) -> CellResult<Self> {
        let text = String::from_utf8_lossy(reply);

        let unit = UNIT_PATTERN
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        let mut powertrace = Vec::new();
        for capture in POWER_PATTERN.captures_iter(&text) {
            let value = capture[1]
                .parse::<f32>()
                .map_err(|e| CellError::Parse(format!("bad power sample: {}", e)))?;
            powertrace.push(value);
        }

        match unit {
            Some(unit) if !powertrace.is_empty() => Ok(Self { unit, powertrace }),
            _ => Err(CellError::Parse(
                "not an interference power source".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply() {
        let reply = br#"<trace Unit="dBm" P0="-101.52" P1="-99.10" P2="-100.00"/>"#;
        let power = InterferencePower::parse(reply).unwrap();
        assert_eq!(power.unit, "dBm");
        assert_eq!(power.powertrace, vec![-101.52, -99.10, -100.00]);
    }

    #[test]
    fn test_parse_rejects_foreign_reply() {
        let err = InterferencePower::parse(b"ANRITSU,MT8212E,ready").unwrap_err();
        assert!(matches!(err, CellError::Parse(_)));
    }

    #[test]
    fn test_parse_requires_samples() {
        // A unit without any P<n> attributes is not a power trace.
        let err = InterferencePower::parse(br#"<trace Unit="dBm"/>"#).unwrap_err();
        assert!(matches!(err, CellError::Parse(_)));
    }

    #[test]
    fn test_json_field_names() {
        let power = InterferencePower {
            unit: "dBm".to_string(),
            powertrace: vec![-1.5],
        };
        let json = serde_json::to_string(&power).unwrap();
        assert!(json.contains(r#""Unit":"dBm""#));
        assert!(json.contains(r#""Powertrace":[-1.5]"#));
    }
}
