use crate::*;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;

        let text = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<String>();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Sends a single-turn prompt and returns the concatenated text of the first
/// candidate.
///
/// The request asks for `application/json` output. Callers still have to cope
/// with fenced or otherwise decorated text, the model does not always comply.
#[instrument(skip(config, client, prompt), fields(model = %config.model), err)]
pub async fn generate_content(
    config: &GeminiConfig,
    client: &reqwest::Client,
    prompt: &str,
) -> Result<String, GeminiError> {
    let api_key = config.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;

    let body = GenerateContentBody {
        contents: vec![Content {
            role: Some(Role::User),
            parts: vec![Part {
                text: Some(prompt.to_string()),
            }],
        }],
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
        }),
    };

    let res = client
        .post(config.generate_url())
        .header("x-goog-api-key", api_key)
        .json(&body)
        .send()
        .await?;

    if !res.status().is_success() {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        tracing::warn!(status, body = %body, "Gemini returned an error status");

        return Err(GeminiError::Status { status, body });
    }

    let body = res.json::<GenerateContentResponse>().await?;

    body.into_text().ok_or(GeminiError::EmptyResponse)
}
