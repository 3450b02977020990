//! Google Sheets v4 client authenticated with a service-account key.
//!
//! The key's RSA private key signs a short-lived JWT, which is exchanged for
//! an OAuth access token once per connection.

use super::{SheetError, SheetService};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

pub struct GoogleSheetsClient {
    http: Client,
    access_token: String,
    spreadsheet_id: String,
}

impl GoogleSheetsClient {
    /// Parse the key, sign a JWT, and exchange it for an access token.
    pub fn connect(credentials_json: &str, spreadsheet_id: &str) -> Result<Self, SheetError> {
        let key: ServiceAccountKey = serde_json::from_str(credentials_json)
            .map_err(|e| SheetError::InvalidCredentials(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SheetError::Network(e.to_string()))?;

        let access_token = fetch_access_token(&http, &key)?;

        Ok(Self {
            http,
            access_token,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }

    fn spreadsheet_url(&self) -> String {
        format!("{SHEETS_BASE}/{}", urlencoding::encode(&self.spreadsheet_id))
    }

    fn values_url(&self, range: &str, action: &str) -> String {
        format!(
            "{}/values/{}:{action}",
            self.spreadsheet_url(),
            urlencoding::encode(range)
        )
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<Response, SheetError> {
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .map_err(|e| SheetError::Network(e.to_string()))?;
        check_status(resp)
    }
}

/// A1 reference to a whole sheet. Titles are quoted so spaces and symbols
/// survive.
fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn check_status(resp: Response) -> Result<Response, SheetError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(SheetError::Http {
        status: status.as_u16(),
        body,
    })
}

fn fetch_access_token(http: &Client, key: &ServiceAccountKey) -> Result<String, SheetError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        iss: &key.client_email,
        scope: SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + 3600,
    };

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SheetError::InvalidCredentials(format!("private key: {e}")))?;
    let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| SheetError::Auth(format!("sign JWT: {e}")))?;

    let resp = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .map_err(|e| SheetError::Network(e.to_string()))?;

    let resp = check_status(resp).map_err(|e| SheetError::Auth(e.to_string()))?;
    let token: TokenResponse = resp
        .json()
        .map_err(|e| SheetError::Payload(format!("token response: {e}")))?;
    Ok(token.access_token)
}

impl SheetService for GoogleSheetsClient {
    fn sheet_exists(&self, title: &str) -> Result<bool, SheetError> {
        let url = format!("{}?fields=sheets.properties.title", self.spreadsheet_url());
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .map_err(|e| SheetError::Network(e.to_string()))?;
        let meta: SpreadsheetMeta = check_status(resp)?
            .json()
            .map_err(|e| SheetError::Payload(format!("spreadsheet metadata: {e}")))?;
        Ok(meta.sheets.iter().any(|s| s.properties.title == title))
    }

    fn add_sheet(&self, title: &str, rows: u32, cols: u32) -> Result<(), SheetError> {
        let url = format!("{}:batchUpdate", self.spreadsheet_url());
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });
        self.post_json(&url, &body).map(|_| ())
    }

    fn clear(&self, title: &str) -> Result<(), SheetError> {
        let url = self.values_url(&sheet_range(title), "clear");
        self.post_json(&url, &json!({})).map(|_| ())
    }

    fn append_rows(&self, title: &str, rows: &[Vec<Value>]) -> Result<(), SheetError> {
        let url = format!(
            "{}?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.values_url(&format!("{}!A1", sheet_range(title)), "append")
        );
        self.post_json(&url, &json!({ "values": rows })).map(|_| ())
    }
}
