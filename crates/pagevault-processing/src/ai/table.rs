use super::AiError;
use serde_json::Value;

/// Result of asking the model whether a page contains a table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableDetection {
    pub table_detected: bool,
    pub confidence: f64,
}

impl TableDetection {
    pub fn none() -> Self {
        Self {
            table_detected: false,
            confidence: 0.0,
        }
    }

    /// Parse `{"tableDetected": bool, "confidenceScore": number}`.
    pub fn from_json(value: &Value) -> Result<Self, AiError> {
        let table_detected = value
            .get("tableDetected")
            .and_then(Value::as_bool)
            .ok_or_else(|| AiError::InvalidResponse("missing boolean tableDetected".to_string()))?;

        let raw = value
            .get("confidenceScore")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                AiError::InvalidResponse("missing numeric confidenceScore".to_string())
            })?;

        let confidence = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
        if confidence != raw {
            tracing::warn!(
                confidence_score = raw,
                clamped = confidence,
                "Confidence score out of range, clamped"
            );
        }

        Ok(Self {
            table_detected,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_detection() {
        let d = TableDetection::from_json(&json!({"tableDetected": true, "confidenceScore": 0.8}))
            .unwrap();
        assert!(d.table_detected);
        assert_eq!(d.confidence, 0.8);
    }

    #[test]
    fn test_clamps_confidence() {
        let d = TableDetection::from_json(&json!({"tableDetected": false, "confidenceScore": 7}))
            .unwrap();
        assert_eq!(d.confidence, 1.0);

        let d = TableDetection::from_json(&json!({"tableDetected": false, "confidenceScore": -2.5}))
            .unwrap();
        assert_eq!(d.confidence, 0.0);
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert!(TableDetection::from_json(&json!({"tableDetected": "yes", "confidenceScore": 1}))
            .is_err());
        assert!(TableDetection::from_json(&json!({"tableDetected": true})).is_err());
        assert!(TableDetection::from_json(&json!([1, 2])).is_err());
    }
}
