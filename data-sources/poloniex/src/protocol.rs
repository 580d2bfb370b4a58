use serde::{Deserialize, Serialize};

/// Every public endpoint answers either with the payload itself or with an
/// object carrying an `error` key. The error arm goes first so it wins over
/// payloads that would also accept arbitrary keys.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum Response<T> {
    Error {
        error: serde_json::Value,
        #[serde(flatten)]
        rest: serde_json::Map<String, serde_json::Value>,
    },
    Success(T),
}

impl<T> Response<T> {
    /// On error the whole payload is handed back, `error` key included.
    pub fn into_result(self) -> Result<T, serde_json::Value> {
        match self {
            Response::Success(t) => Ok(t),
            Response::Error { error, mut rest } => {
                rest.insert("error".to_string(), error);
                Err(serde_json::Value::Object(rest))
            }
        }
    }
}

#[derive(Serialize, Debug)]
pub struct PublicQuery {
    pub command: &'static str,
}

impl PublicQuery {
    pub fn return_ticker() -> Self {
        Self {
            command: "returnTicker",
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::{PublicQuery, Response};

    #[test]
    fn error_arm_wins() {
        let raw = r#"{"error": "Invalid command."}"#;
        let resp: Response<HashMap<String, serde_json::Value>> = serde_json::from_str(raw).unwrap();
        let Response::Error { error, rest } = resp else {
            panic!("nope");
        };
        assert_eq!(error, "Invalid command.");
        assert!(rest.is_empty());
    }

    #[test]
    fn error_payload_is_kept_whole() {
        let raw = r#"{"error": "Too many requests", "retryAfter": 3}"#;
        let resp: Response<HashMap<String, serde_json::Value>> = serde_json::from_str(raw).unwrap();
        let payload = resp.into_result().unwrap_err();
        assert_eq!(payload["error"], "Too many requests");
        assert_eq!(payload["retryAfter"], 3);
    }

    #[test]
    fn query_string() {
        let qs = serde_qs::to_string(&PublicQuery::return_ticker()).unwrap();
        assert_eq!(qs, "command=returnTicker");
    }
}
