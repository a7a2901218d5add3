//! Spreadsheet-backed endpoint that held the schedule before the database did.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::appointment::normalize::normalize_outcome;
use crate::models::appointment::{Appointment, RawAppointment, Rejected, partition};

/// Row 1 of the sheet is the header.
pub const FIRST_DATA_ROW: i64 = 2;

#[derive(Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    #[serde(rename = "rowId")]
    row_id: i64,
    observacao: &'a str,
}

/// Outcome edit for one sheet row.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyUpdate {
    #[serde(rename = "rowId", alias = "row_id")]
    pub row_id: i64,
    #[serde(default)]
    pub observacao: String,
}

pub fn validate_row_id(row_id: i64) -> Result<(), AppError> {
    if row_id < FIRST_DATA_ROW {
        Err(AppError::validation(format!("Linha inválida: {row_id}")))
    } else {
        Ok(())
    }
}

fn envelope(body: &str) -> Result<Envelope, AppError> {
    let env: Envelope = serde_json::from_str(body)
        .map_err(|e| AppError::Upstream(format!("Resposta inválida da planilha: {e}")))?;
    if env.status != "success" {
        let message = env.message.unwrap_or_else(|| "Erro na planilha".to_string());
        return Err(AppError::Upstream(message));
    }
    Ok(env)
}

/// Decode a read response into canonical rows plus the ones that failed normalization.
pub fn parse_rows(body: &str) -> Result<(Vec<Appointment>, Vec<Rejected>), AppError> {
    let env = envelope(body)?;
    let raws: Vec<RawAppointment> = env
        .data
        .iter()
        .filter_map(Value::as_object)
        .map(RawAppointment::from_json)
        .collect();
    Ok(partition(&raws))
}

pub struct LegacySheetClient {
    client: reqwest::Client,
    url: String,
}

impl LegacySheetClient {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        LegacySheetClient { client, url }
    }

    pub async fn fetch_rows(&self) -> Result<(Vec<Appointment>, Vec<Rejected>), AppError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_rows(&body)
    }

    /// Write the outcome column of one row.
    pub async fn update_observation(&self, row_id: i64, observacao: &str) -> Result<(), AppError> {
        validate_row_id(row_id)?;
        let observacao = normalize_outcome(observacao).map_err(|e| AppError::validation(e.to_string()))?;

        let body = self
            .client
            .post(&self.url)
            .json(&UpdateRequest {
                row_id,
                observacao: &observacao,
            })
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        envelope(&body).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_cannot_be_updated() {
        assert!(validate_row_id(1).is_err());
        assert!(validate_row_id(2).is_ok());
    }

    #[test]
    fn error_envelope_surfaces_message() {
        let err = parse_rows(r#"{"status":"error","message":"Sheet not found."}"#).unwrap_err();
        assert!(matches!(err, AppError::Upstream(m) if m == "Sheet not found."));
    }
}
