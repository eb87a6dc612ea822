use serde::{Deserialize, Serialize};

use super::subject::Subject;

/// Kept by the bus for up to 12 hours or until superseded.
pub const RETAINED_TTL: i64 = -12 * 60 * 60;

/// One line on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Frame {
    Subscribe {
        subject: Subject,
    },
    Publish {
        subject: Subject,
        #[serde(default)]
        payload: String,
        /// Retention in seconds. Negative values keep the message until it is
        /// superseded, but at most for the absolute value.
        #[serde(default)]
        ttl: i64,
    },
}

impl Frame {
    pub fn publish(subject: &[&str], payload: String, ttl: i64) -> Self {
        Self::Publish {
            subject: Subject::new(subject),
            payload,
            ttl,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn decode(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let frame = Frame::Subscribe {
            subject: Subject::new(&["CFG", "Postmarks"]),
        };
        assert_eq!(
            frame.encode().unwrap(),
            "{\"op\":\"subscribe\",\"subject\":[\"CFG\",\"Postmarks\"]}\n"
        );

        let frame = Frame::decode(r#"{"op":"publish","subject":["Here","Postmarks"]}"#).unwrap();
        assert_eq!(frame, Frame::publish(&["Here", "Postmarks"], String::new(), 0));

        assert!(Frame::decode(r#"{"op":"unknown"}"#).is_err());
    }
}
