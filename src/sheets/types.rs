use serde::{Deserialize, Serialize};

pub(super) const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(super) struct AssertionHeader {
    pub(super) alg: String,
    pub(super) typ: String,
}

impl Default for AssertionHeader {
    fn default() -> Self {
        Self {
            alg: "RS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

// https://developers.google.com/identity/protocols/oauth2/service-account#authorizingrequests
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(super) struct AssertionClaims {
    pub(super) iss: String,
    pub(super) scope: String,
    pub(super) aud: String,
    pub(super) exp: i64,
    pub(super) iat: i64,
}

/// Both the success and error shape of the token endpoint response.
#[derive(Debug, Default, Deserialize)]
pub(super) struct TokenResponse {
    pub(super) access_token: Option<String>,
    pub(super) expires_in: Option<i64>,
    pub(super) error: Option<String>,
    pub(super) error_description: Option<String>,
}

// https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ValueRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) major_dimension: Option<String>,
    #[serde(default)]
    pub(super) values: Option<Vec<Vec<serde_json::Value>>>,
}

impl ValueRange {
    /// A single-cell range holding one string
    pub(super) fn single_cell(range: &str, text: String) -> Self {
        Self {
            range: Some(range.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values: Some(vec![vec![serde_json::Value::String(text)]]),
        }
    }

    pub(super) fn first_cell(&self) -> Option<&serde_json::Value> {
        self.values.as_ref()?.first()?.first()
    }
}
