use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The body of every proxy response: `{ "ok": bool, "message"?: string, "taxExempt"?: bool }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "taxExempt", default, skip_serializing_if = "Option::is_none")]
    pub tax_exempt: Option<bool>,
}

impl JsonResponse {
    pub fn success() -> Self {
        Self { ok: true, message: None, tax_exempt: None }
    }

    pub fn tax_exempt(tax_exempt: bool) -> Self {
        Self { ok: true, message: None, tax_exempt: Some(tax_exempt) }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { ok: false, message: Some(message.to_string()), tax_exempt: None }
    }
}
