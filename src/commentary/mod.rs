//! Ollama commentary on a finished simulation, with fixed fallback text.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ServerConfig;
use crate::core::{
    CalculationMode, GOAL, RatePeriod, SimulationInput, SimulationResult, format_currency,
    format_duration,
};

pub const EMPTY_REPLY_FALLBACK: &str = "Não foi possível gerar insights no momento.";
pub const ERROR_FALLBACK: &str = "Houve um erro ao consultar o especialista digital.";

const SYSTEM_PROMPT: &str =
    "Você é um consultor financeiro. Responda em português, de forma breve e profissional.";

pub fn build_prompt(input: &SimulationInput, result: &SimulationResult) -> String {
    let rate_period = match input.rate_period {
        RatePeriod::Annual => "anual",
        RatePeriod::Monthly => "mensal",
    };
    let contribution_label = match input.mode {
        CalculationMode::SolveForContribution => "Aporte Mensal Calculado",
        CalculationMode::SolveForTime => "Aporte Mensal Informado",
    };

    format!(
        "Analise este cenário de investimento de juros compostos:\n\
         Objetivo: {goal}\n\
         Valor Inicial: {initial}\n\
         {contribution_label}: {contribution}\n\
         Taxa de Juros: {rate}% {rate_period}\n\
         Tempo Necessário: {duration}.\n\
         Total Investido: {invested}\n\
         Total Ganho em Juros: {interest}\n\
         \n\
         Dê 3 dicas práticas e motivadoras para esse investidor, sendo breve e profissional.",
        goal = format_currency(GOAL),
        initial = format_currency(input.initial_value),
        contribution = format_currency(result.monthly_contribution),
        rate = input.interest_rate,
        duration = format_duration(result.period_in_months),
        invested = format_currency(result.total_invested),
        interest = format_currency(result.total_interest),
    )
}

#[derive(Debug, Clone)]
pub struct OllamaCommentary {
    http: Client,
    base_url: Url,
    model: String,
}

impl OllamaCommentary {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_url = validate_local_base_url(&config.ollama_base_url)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.commentary_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            model: config.ollama_model.clone(),
        })
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let endpoint = self
            .base_url
            .join("api/chat")
            .context("Failed to build Ollama /api/chat URL")?;

        let request = ChatRequest {
            model: self.model.clone(),
            stream: false,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
        };

        let response: ChatResponse = self
            .http
            .post(endpoint.clone())
            .json(&request)
            .send()
            .await
            .with_context(|| format!("POST {endpoint} failed"))?
            .error_for_status()
            .with_context(|| format!("POST {endpoint} returned non-success status"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {endpoint}"))?;

        response
            .message
            .map(|m| m.content.trim().to_string())
            .ok_or_else(|| anyhow!("Ollama response had no message content"))
    }
}

/// Text to show for a commentary attempt; never an error.
pub fn commentary_or_fallback(reply: Result<String>) -> String {
    match reply {
        Ok(text) if text.trim().is_empty() => EMPTY_REPLY_FALLBACK.to_string(),
        Ok(text) => text,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "commentary generation failed");
            ERROR_FALLBACK.to_string()
        }
    }
}

fn validate_local_base_url(base_url: &str) -> Result<Url> {
    let url =
        Url::parse(base_url).with_context(|| format!("Invalid OLLAMA_BASE_URL: {base_url}"))?;

    if url.scheme() != "http" {
        return Err(anyhow!(
            "Unsupported scheme '{}' for OLLAMA_BASE_URL (use http://localhost:11434)",
            url.scheme()
        ));
    }

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("OLLAMA_BASE_URL is missing a host"))?;
    let is_local = host.eq_ignore_ascii_case("localhost")
        || host == "127.0.0.1"
        || host == "[::1]"
        || host == "::1";
    if !is_local {
        return Err(anyhow!(
            "Refusing non-local OLLAMA_BASE_URL host '{host}' (use http://localhost:11434)"
        ));
    }

    Ok(url)
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<Message>,
}
