//! Client for the PDF import pipeline webhook.

use regex::Regex;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::OnceLock;

use crate::errors::AppError;

pub const UPLOAD_OK: &str = "Arquivo enviado e processado com sucesso!";
const NETWORK_FAILURE: &str = "Falha na conexão de rede.";
const NOT_CONFIGURED: &str = "Webhook de importação não configurado.";
const DUPLICATE_GENERIC: &str = "REGRA DE NEGÓCIO: Um ou mais periciados no PDF já possuem \
    agendamento para a mesma data. Importação interrompida.";

#[derive(Deserialize)]
struct PipelineMessage {
    message: Option<String>,
}

fn duplicate_key_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"Key \(periciado, data_pericia\)=\(([^,]+), ([^)]+)\)").ok())
        .as_ref()
}

/// Turn a non-2xx pipeline response into an error the uploader can act on.
///
/// Uniqueness violations on (examinee, date) become `Conflict`, naming the examinee
/// and date when the database message includes them. Everything else is `Upstream`,
/// preferring a JSON `{message}` from the body over the bare status.
pub fn classify_failure(status: u16, reason: &str, body: &str) -> AppError {
    if body.contains("duplicate key value") || body.contains("unique constraint") {
        let message = match duplicate_key_pattern().and_then(|re| re.captures(body)) {
            Some(caps) => format!(
                "REGRA DE NEGÓCIO: O periciado \"{}\" já está cadastrado para o dia {}. \
                 Importação interrompida por duplicidade.",
                &caps[1], &caps[2]
            ),
            None => DUPLICATE_GENERIC.to_string(),
        };
        return AppError::Conflict(message);
    }

    let from_body = serde_json::from_str::<PipelineMessage>(body)
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.trim().is_empty());

    let message = from_body.unwrap_or_else(|| {
        let reason = if reason.is_empty() { "Falha no processamento" } else { reason };
        format!("Erro no servidor ({status}): {reason}")
    });
    AppError::Upstream(message)
}

#[derive(Clone)]
pub struct PipelineClient {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl PipelineClient {
    pub fn new(client: reqwest::Client, webhook_url: Option<String>) -> Self {
        PipelineClient { client, webhook_url }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Forward a PDF tagged with `batch_id`. Rows the pipeline writes carry that tag.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>, batch_id: &str) -> Result<String, AppError> {
        let url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| AppError::Upstream(NOT_CONFIGURED.to_string()))?;

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part).text("batchId", batch_id.to_string());

        let response = match self.client.post(url).multipart(form).send().await {
            Ok(r) => r,
            Err(e) => {
                log::error!("Import pipeline unreachable: {e}");
                return Err(AppError::Upstream(NETWORK_FAILURE.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(UPLOAD_OK.to_string());
        }

        let body = response.text().await.unwrap_or_default();
        log::warn!("Import pipeline rejected batch {batch_id} ({status}): {body}");
        Err(classify_failure(
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            &body,
        ))
    }
}
