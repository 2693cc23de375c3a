use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "pdf-excel-converter";
pub const SESSION_COOKIE: &str = "pdfxl_session";
pub const EXTRACTION_PATH_HEADER: &str = "x-extraction-path";

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

pub const PDF_EXTENSIONS: &[&str] = &["pdf"];
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiInfoResponse {
    pub message: String,
    pub endpoints: BTreeMap<String, String>,
}

impl ApiInfoResponse {
    pub fn describe() -> Self {
        let endpoints = [
            ("/pdf-to-excel", "POST - Convert PDF to Excel"),
            ("/excel-to-pdf", "POST - Convert Excel to PDF"),
            ("/health", "GET - Health check"),
            ("/login", "GET/POST - Sign in"),
            ("/logout", "GET - Sign out"),
        ]
        .into_iter()
        .map(|(path, description)| (path.to_string(), description.to_string()))
        .collect();

        Self {
            message: "PDF ↔ Excel Converter API".to_string(),
            endpoints,
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
