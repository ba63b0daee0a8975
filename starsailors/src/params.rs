//! Request parameter parsing for `/deploy`

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use starsailors_core::{AutomatonKind, DeploymentMode, Result};

/// Parse a query string into a map; later duplicates win.
pub fn parse_query_params(query: &str) -> HashMap<String, String> {
    if query.is_empty() {
        return HashMap::new();
    }

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = decode(parts.next()?)?;
            let value = decode(parts.next().unwrap_or(""))?;
            Some((key, value))
        })
        .collect()
}

/// Borrow a parameter value by name
pub fn lookup<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

fn decode(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|s| s.into_owned())
}

/// Deployment mode from an optional raw value; missing is invalid
pub fn deployment_mode(raw: Option<&str>) -> Result<DeploymentMode> {
    raw.unwrap_or_default().parse()
}

/// Automaton from an optional raw value; missing means `Telescope`
pub fn automaton(raw: Option<&str>) -> Result<AutomatonKind> {
    match raw {
        None | Some("") => Ok(AutomatonKind::Telescope),
        Some(name) => name.parse(),
    }
}

/// JSON body of `POST /deploy`.
///
/// Fields are kept loose and validated afterwards, so a wrong type reports
/// the same error as a missing field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployBody {
    #[serde(default)]
    pub deployment_type: Option<Value>,
    #[serde(default)]
    pub anomaly_ids: Option<Value>,
    #[serde(default)]
    pub automaton: Option<Value>,
}

impl DeployBody {
    /// Anything that is not a JSON object parses as an empty body.
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    pub fn deployment_mode(&self) -> Result<DeploymentMode> {
        deployment_mode(self.deployment_type.as_ref().and_then(Value::as_str))
    }

    pub fn automaton(&self) -> Result<AutomatonKind> {
        match &self.automaton {
            None | Some(Value::Null) => Ok(AutomatonKind::Telescope),
            Some(value) => automaton(Some(value.as_str().unwrap_or("?"))),
        }
    }

    /// Requested anomaly ids, keeping only integral numbers and numeric strings
    pub fn anomaly_ids(&self) -> Vec<i64> {
        match &self.anomaly_ids {
            Some(Value::Array(items)) => items.iter().filter_map(coerce_id).collect(),
            _ => Vec::new(),
        }
    }
}

fn coerce_id(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(n) => {
            if let Some(id) = n.as_i64() {
                return Some(id);
            }
            n.as_f64()?
        }
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    integral(number)
}

fn integral(number: f64) -> Option<i64> {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Some(number as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_params() {
        let params = parse_query_params("action=anomalies&deploymentType=planetary");
        assert_eq!(params.get("action").map(String::as_str), Some("anomalies"));
        assert_eq!(
            params.get("deploymentType").map(String::as_str),
            Some("planetary")
        );

        let params = parse_query_params("action=skill%2Dprogress&flag&&note=a+b");
        assert_eq!(
            params.get("action").map(String::as_str),
            Some("skill-progress")
        );
        assert_eq!(params.get("flag").map(String::as_str), Some(""));
        assert_eq!(params.get("note").map(String::as_str), Some("a b"));

        assert!(parse_query_params("").is_empty());
    }

    #[test]
    fn test_automaton_defaults_to_telescope() {
        assert_eq!(automaton(None).unwrap(), AutomatonKind::Telescope);
        assert_eq!(
            automaton(Some("WeatherSatellite")).unwrap(),
            AutomatonKind::WeatherSatellite
        );
        assert_eq!(automaton(Some("Zeppelin")).unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_body_coerces_ids() {
        let body = DeployBody::parse(
            br#"{"deploymentType":"planetary","anomalyIds":[1,"2"," 3 ",4.0,4.5,"x",null,true]}"#,
        );
        assert_eq!(body.deployment_mode().unwrap(), DeploymentMode::Planetary);
        assert_eq!(body.anomaly_ids(), vec![1, 2, 3, 4]);
        assert_eq!(body.automaton().unwrap(), AutomatonKind::Telescope);
    }

    #[test]
    fn test_body_not_json_is_empty() {
        let body = DeployBody::parse(b"deploymentType=planetary");
        let err = body.deployment_mode().unwrap_err();
        assert_eq!(err.to_string(), "Invalid deploymentType");
        assert!(body.anomaly_ids().is_empty());

        let body = DeployBody::parse(br#"["planetary",[1]]"#);
        assert!(body.deployment_mode().is_err());
    }

    #[test]
    fn test_body_wrong_types() {
        let body = DeployBody::parse(br#"{"deploymentType":7,"anomalyIds":"1,2","automaton":3}"#);
        assert!(body.deployment_mode().is_err());
        assert!(body.anomaly_ids().is_empty());
        assert!(body.automaton().is_err());
    }
}
