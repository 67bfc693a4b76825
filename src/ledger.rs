use crate::error::WriteError;
use crate::models::AllocatedRow;

/// Append-only destination for allocated rows. One call per receipt; a
/// failure is attributed to the file being processed, never retried here.
pub trait LedgerWriter {
    fn append(&self, rows: &[AllocatedRow]) -> Result<(), WriteError>;
}

/// Google Sheets `values:append` client writing the fixed 8-column range.
pub struct SheetsLedger {
    client: reqwest::blocking::Client,
    token: String,
    spreadsheet_id: String,
    range: String,
}

impl SheetsLedger {
    pub fn new(token: &str, spreadsheet_id: &str, range: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            token: token.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
        }
    }
}

impl LedgerWriter for SheetsLedger {
    fn append(&self, rows: &[AllocatedRow]) -> Result<(), WriteError> {
        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED",
            self.spreadsheet_id, self.range
        );
        let values: Vec<Vec<serde_json::Value>> = rows.iter().map(|r| r.to_cells()).collect();
        let body = serde_json::json!({ "values": values });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .map_err(|e| WriteError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WriteError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(())
    }
}
