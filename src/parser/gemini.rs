use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{CurrexError, Result};
use crate::exchange_rate::RateDraft;

pub const PARSE_FAILURE: &str =
    "Failed to parse the provided text. Please check the format and try again.";

const PROMPT: &str = r#"You are an expert financial data extraction tool. Your task is to parse the following Burmese currency exchange text message and convert it into a structured JSON object.

Rules:
1.  The text describes rates for exchanging Myanmar Kyat (MMK) and Thai Baht (THB).
2.  "Selling (အရောင်း)" means the exchanger is selling THB. Rates are quoted in THB per 100,000 MMK.
3.  "Buying (အဝယ်)" means the exchanger is buying THB. Rates are quoted in THB per 100,000 MMK.
4.  "10သိန်း" means 1,000,000 MMK.
5.  "အထက်" means "above".
6.  "အောက်" means "below".
7.  Extract the date, payment method, all rates, and any additional notes.
8.  If a rate is given as a range like "802/803", represent it as a string.

Text to parse:
---
{text}
---

Provide the output in the specified JSON format."#;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Structured extraction through the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiParser {
    client: Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl GeminiParser {
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        GeminiParser {
            client,
            api_url: api_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn parse(&self, text: &str) -> Result<RateDraft> {
        self.generate(text).await.map_err(|e| {
            error!("Error parsing exchange text with Gemini: {}", e);
            CurrexError::Parse(PARSE_FAILURE.to_string())
        })
    }

    async fn generate(&self, text: &str) -> Result<RateDraft> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": PROMPT.replace("{text}", text) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
            },
        });

        debug!("Requesting rate extraction from {}", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CurrexError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let generated: GenerateResponse = response.json().await?;
        let json_text = generated
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .find_map(|part| part.text)
            .ok_or_else(|| CurrexError::Parse("empty model response".to_string()))?;

        Ok(serde_json::from_str(json_text.trim())?)
    }
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "date": { "type": "STRING", "description": "The date of the rates, e.g., '16-Oct-2025'." },
            "paymentMethod": { "type": "STRING", "description": "The method of payment, e.g., 'Bank Transfer'." },
            "sellingRates": {
                "type": "OBJECT",
                "description": "Rates for when the exchanger sells THB (user buys THB).",
                "properties": {
                    "below1M_MMK": { "type": "NUMBER", "description": "Rate for transactions below 1,000,000 MMK." },
                    "above1M_MMK": { "type": "NUMBER", "description": "Rate for transactions above 1,000,000 MMK." },
                    "special_100_500": { "type": "STRING", "description": "Special rates, often quoted as a range like '802/803'." }
                },
                "required": ["below1M_MMK", "above1M_MMK"]
            },
            "buyingRates": {
                "type": "OBJECT",
                "description": "Rates for when the exchanger buys THB (user sells THB).",
                "properties": {
                    "base": { "type": "NUMBER", "description": "The base buying rate, typically for amounts under 1,000,000 MMK." },
                    "above1M_MMK": { "type": "NUMBER", "description": "The buying rate for transactions with an MMK equivalent over 1,000,000 MMK." }
                },
                "required": ["base", "above1M_MMK"]
            },
            "notes": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Any other relevant notes or messages from the text."
            }
        },
        "required": ["date", "paymentMethod", "sellingRates", "buyingRates", "notes"]
    })
}
