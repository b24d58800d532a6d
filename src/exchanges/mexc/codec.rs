use crate::core::errors::ExchangeError;
use crate::core::kernel::{LoginSignature, WsCodec};
use crate::exchanges::mexc::types::{InboundFrame, MexcRequestParam, MexcWsRequest};

/// Correlation id of the login reply
pub const LOGIN_CHANNEL: &str = "rs.login";
/// Venue-side failure report, e.g. a rejected signature
pub const ERROR_CHANNEL: &str = "rs.error";
pub const PONG_CHANNEL: &str = "pong";

/// MEXC contract WebSocket codec
#[derive(Debug, Clone, Copy, Default)]
pub struct MexcCodec;

impl MexcCodec {
    pub const fn new() -> Self {
        Self
    }

    pub fn login_request(signed: &LoginSignature) -> MexcWsRequest {
        MexcWsRequest {
            method: "login".to_string(),
            param: Some(MexcRequestParam {
                api_key: Some(signed.api_key.clone()),
                req_time: Some(signed.timestamp.to_string()),
                signature: Some(signed.signature.clone()),
                ..MexcRequestParam::default()
            }),
        }
    }

    pub fn ping_request() -> MexcWsRequest {
        MexcWsRequest {
            method: "ping".to_string(),
            param: None,
        }
    }
}

impl WsCodec for MexcCodec {
    type Request = MexcWsRequest;
    type Frame = InboundFrame;

    fn encode_request(&self, request: &Self::Request) -> Result<String, ExchangeError> {
        Ok(serde_json::to_string(request)?)
    }

    fn decode_frame(&self, raw: &[u8]) -> Result<Self::Frame, ExchangeError> {
        serde_json::from_slice(raw).map_err(|e| {
            ExchangeError::decode(format!(
                "malformed frame envelope ({}): {}",
                e,
                String::from_utf8_lossy(raw)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_login_request_shape() {
        let request = MexcCodec::login_request(&LoginSignature {
            api_key: "key".to_string(),
            timestamp: 1_611_038_237_237,
            signature: "c2lnbmF0dXJl".to_string(),
        });
        let text = MexcCodec.encode_request(&request).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(
            value,
            json!({
                "method": "login",
                "param": {"apiKey": "key", "reqTime": "1611038237237", "signature": "c2lnbmF0dXJl"}
            })
        );
    }

    #[test]
    fn test_ping_has_no_param() {
        let text = MexcCodec.encode_request(&MexcCodec::ping_request()).unwrap();
        assert_eq!(text, r#"{"method":"ping"}"#);
    }

    #[test]
    fn test_decode_push_frame() {
        let frame = MexcCodec
            .decode_frame(
                br#"{"channel":"push.deal","data":{"p":6866.5},"symbol":"BTC_USDT","ts":1587442049632}"#,
            )
            .unwrap();
        assert_eq!(frame.channel, "push.deal");
        assert_eq!(frame.symbol.as_deref(), Some("BTC_USDT"));
        assert_eq!(frame.ts, Some(1_587_442_049_632));
        assert!(frame.data.is_object());
    }

    #[test]
    fn test_malformed_envelope_is_decode_error() {
        for raw in [&b"not json"[..], b"[1,2]", b"{\"channel\":5}"] {
            assert!(matches!(
                MexcCodec.decode_frame(raw),
                Err(ExchangeError::DecodeError(_))
            ));
        }
    }
}
