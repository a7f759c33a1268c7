//! JSON-RPC 2.0 envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Block reference for read calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
    #[default]
    Latest,
    Number(u64),
}

impl BlockTag {
    /// Wire form: `latest` or a hex quantity.
    pub fn to_param(&self) -> String {
        match self {
            BlockTag::Latest => "latest".to_string(),
            BlockTag::Number(n) => format!("0x{n:x}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// `{to, data}` call object.
#[derive(Debug, Clone, Serialize)]
pub struct CallObject {
    pub to: String,
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

/// Parses a hex quantity such as `0x1b4`.
pub fn parse_quantity(value: &str) -> Option<u64> {
    let digits = value.strip_prefix("0x")?;
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_tag_param() {
        assert_eq!(BlockTag::Latest.to_param(), "latest");
        assert_eq!(BlockTag::Number(19_000_000).to_param(), "0x121eac0");
    }

    #[test]
    fn test_request_envelope() {
        let call = CallObject {
            to: "0xabc".to_string(),
            data: "0x3850c7bd".to_string(),
        };
        let req = JsonRpcRequest::new(1, "eth_call", json!([call, "latest"]));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "eth_call",
                "params": [{"to": "0xabc", "data": "0x3850c7bd"}, "latest"]
            })
        );
    }

    #[test]
    fn test_response_with_error() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":3,"message":"execution reverted: Invalid token ID"}}"#,
        )
        .unwrap();
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, 3);
        assert!(err.message.contains("Invalid token ID"));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1b4"), Some(436));
        assert_eq!(parse_quantity("0x"), None);
        assert_eq!(parse_quantity("12"), None);
    }
}
