//! This module contains the request and response objects exchanged between the web front end, the
//! gateway and the PIX provider. All of these structs are serializable and deserializable using serde.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{amount::Amount, error::PixCoreError};

pub const DEFAULT_VALUE_CENTAVOS: u64 = Amount::DEFAULT_CHARGE.centavos();
pub const DEFAULT_WEBHOOK_URL: &str = "https://seu-site.com/webhook";

/// Field names the provider has used for the copy-paste payment code, in priority order.
pub const QR_CODE_FIELDS: [&str; 4] = ["qr_code", "payload", "qrCode", "emv"];

/// Field names the provider has used for the QR image, in priority order.
pub const QR_CODE_IMAGE_FIELDS: [&str; 3] = ["qr_code_base64", "qrCodeBase64", "qr_code_image"];

/// Body of `POST /pix` as sent by the front end. Every field is optional and loosely typed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PostPixRequest {
    /// amount in centavos
    #[serde(default)]
    #[schema(value_type = Option<u64>, example = 1500)]
    pub value: Option<Value>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub webhook_url: Option<Value>,

    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub split_rules: Option<Value>,
}

impl PostPixRequest {
    pub fn with_value(value: u64) -> Self {
        Self {
            value: Some(Value::from(value)),
            ..Default::default()
        }
    }

    /// Parses a raw request body. An empty body is treated as `{}`.
    pub fn from_slice(body: &[u8]) -> Result<Self, PixCoreError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }

    /// Validates the request and fills in defaults for absent fields.
    pub fn into_charge(self, defaults: &PixChargeDefaults) -> Result<CreatePixCharge, PixCoreError> {
        let value = match self.value {
            None | Some(Value::Null) => defaults.value,
            Some(ref value) => Amount::from_json(value)?,
        };

        let webhook_url = match self.webhook_url {
            Some(Value::String(url)) if !url.is_empty() => url,
            _ => defaults.webhook_url.clone(),
        };

        let split_rules = match self.split_rules {
            Some(Value::Array(rules)) => rules,
            _ => vec![],
        };

        Ok(CreatePixCharge {
            value,
            webhook_url,
            split_rules,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixChargeDefaults {
    pub value: Amount,
    pub webhook_url: String,
}

impl Default for PixChargeDefaults {
    fn default() -> Self {
        Self {
            value: Amount::DEFAULT_CHARGE,
            webhook_url: DEFAULT_WEBHOOK_URL.to_owned(),
        }
    }
}

/// Payload sent to the provider's cash-in endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatePixCharge {
    pub value: Amount,
    pub webhook_url: String,
    pub split_rules: Vec<Value>,
}

/// Normalized charge returned to the front end.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PixChargeResponse {
    #[schema(value_type = Option<String>)]
    pub id: Option<Value>,
    #[schema(value_type = Option<String>, example = "created")]
    pub status: Option<Value>,
    /// amount in centavos as echoed by the provider
    #[schema(value_type = Option<u64>)]
    pub value: Option<Value>,
    /// copy-paste payment code
    pub qr_code: Option<String>,
    /// QR image as a PNG data url
    pub qr_code_base64: Option<String>,
}

impl PixChargeResponse {
    /// Reshapes the provider's response body. Missing fields are returned as `None`.
    pub fn from_provider(body: &Value) -> Self {
        Self {
            id: field(body, "id"),
            status: field(body, "status"),
            value: field(body, "value"),
            qr_code: first_string(body, &QR_CODE_FIELDS),
            qr_code_base64: first_string(body, &QR_CODE_IMAGE_FIELDS),
        }
    }
}

fn field(body: &Value, name: &str) -> Option<Value> {
    body.get(name).filter(|value| !value.is_null()).cloned()
}

fn first_string(body: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| body.get(*name).and_then(Value::as_str))
        .map(str::to_owned)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
    #[serde(rename = "hasToken")]
    pub has_token: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::{
        amount::Amount,
        error::PixCoreError,
        fixture::read_fixture_as,
        primitives::{PixChargeDefaults, PixChargeResponse, PostPixRequest},
    };

    #[test]
    fn test_into_charge_forwards_value_unchanged() -> anyhow::Result<()> {
        for value in [1_u64, 99, 1500, 1_000_000, 9_007_199_254_740_991] {
            let charge = PostPixRequest::with_value(value).into_charge(&Default::default())?;
            assert_eq!(value, charge.value.centavos());
        }
        Ok(())
    }

    #[test]
    fn test_into_charge_defaults() -> anyhow::Result<()> {
        let charge = PostPixRequest::default().into_charge(&PixChargeDefaults::default())?;
        assert_eq!(1000, charge.value.centavos());
        assert_eq!("https://seu-site.com/webhook", charge.webhook_url);
        assert!(charge.split_rules.is_empty());
        Ok(())
    }

    #[test]
    fn test_into_charge_custom_defaults() -> anyhow::Result<()> {
        let defaults = PixChargeDefaults {
            value: Amount::new(250)?,
            webhook_url: "https://example.com/hook".to_owned(),
        };
        let request: PostPixRequest =
            serde_json::from_value(json!({ "value": null, "webhook_url": "" }))?;
        let charge = request.into_charge(&defaults)?;
        assert_eq!(250, charge.value.centavos());
        assert_eq!("https://example.com/hook", charge.webhook_url);
        Ok(())
    }

    #[test]
    fn test_into_charge_coerces_split_rules() -> anyhow::Result<()> {
        let request: PostPixRequest =
            serde_json::from_value(json!({ "split_rules": { "value": 50 } }))?;
        assert!(request.into_charge(&Default::default())?.split_rules.is_empty());

        let rules = json!([{ "value": 50, "account_id": "a" }, { "value": 25, "account_id": "b" }]);
        let request: PostPixRequest =
            serde_json::from_value(json!({ "split_rules": rules.clone() }))?;
        let charge = request.into_charge(&Default::default())?;
        assert_eq!(rules, serde_json::to_value(&charge.split_rules)?);
        Ok(())
    }

    #[test]
    fn test_into_charge_rejects_invalid_value() {
        let request = PostPixRequest {
            value: Some(json!("dez reais")),
            ..Default::default()
        };
        let result = request.into_charge(&Default::default());
        assert!(matches!(result, Err(PixCoreError::InvalidAmount(_))));
    }

    #[test]
    fn test_serialize_create_charge() -> anyhow::Result<()> {
        let charge = PostPixRequest::with_value(1500).into_charge(&Default::default())?;
        assert_eq!(
            r#"{"value":1500,"webhook_url":"https://seu-site.com/webhook","split_rules":[]}"#,
            serde_json::to_string(&charge)?
        );
        Ok(())
    }

    #[test]
    fn test_from_slice_empty_body() -> anyhow::Result<()> {
        assert_eq!(PostPixRequest::default(), PostPixRequest::from_slice(b"  \n")?);
        assert!(PostPixRequest::from_slice(b"{not json").is_err());
        Ok(())
    }

    #[test]
    fn test_from_provider() -> anyhow::Result<()> {
        let body = read_fixture_as::<serde_json::Value>("upstream_charge.json")?;
        let response = PixChargeResponse::from_provider(&body);
        assert_eq!(
            Some(json!("9c29870c-9f69-4bb6-90d3-2dce9453bb45")),
            response.id
        );
        assert_eq!(Some(json!("created")), response.status);
        assert_eq!(Some(json!(1000)), response.value);
        assert!(response.qr_code.unwrap().starts_with("000201"));
        assert!(response
            .qr_code_base64
            .unwrap()
            .starts_with("data:image/png;base64,"));
        Ok(())
    }

    #[test]
    fn test_from_provider_alternate_field_names() -> anyhow::Result<()> {
        let body = read_fixture_as::<serde_json::Value>("upstream_charge_emv.json")?;
        let response = PixChargeResponse::from_provider(&body);
        assert_eq!(Some(json!(48213)), response.id);
        assert!(response.qr_code.unwrap().starts_with("00020126"));
        assert!(response.qr_code_base64.unwrap().starts_with("iVBOR"));
        Ok(())
    }

    #[test]
    fn test_qr_code_priority() {
        let cases = [
            (json!({ "qr_code": "a", "payload": "b", "qrCode": "c", "emv": "d" }), "a"),
            (json!({ "payload": "b", "qrCode": "c", "emv": "d" }), "b"),
            (json!({ "qr_code": null, "qrCode": "c", "emv": "d" }), "c"),
            (json!({ "emv": "d" }), "d"),
        ];
        for (body, expected) in cases {
            assert_eq!(
                Some(expected.to_owned()),
                PixChargeResponse::from_provider(&body).qr_code
            );
        }
    }

    #[test]
    fn test_from_provider_missing_fields() -> anyhow::Result<()> {
        let response = PixChargeResponse::from_provider(&json!({ "id": "abc" }));
        assert_eq!(
            r#"{"id":"abc","status":null,"value":null,"qr_code":null,"qr_code_base64":null}"#,
            serde_json::to_string(&response)?
        );
        Ok(())
    }

    #[test]
    fn test_serialize_health() -> anyhow::Result<()> {
        let health = super::HealthResponse {
            ok: true,
            has_token: false,
        };
        assert_eq!(r#"{"ok":true,"hasToken":false}"#, serde_json::to_string(&health)?);
        Ok(())
    }
}
