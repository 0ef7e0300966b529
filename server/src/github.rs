use color_eyre::{eyre::Context, Result};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) struct GithubConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
}

impl GithubConfig {
    #[instrument(name = "GithubConfig::from_env")]
    pub(crate) fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: std::env::var("GITHUB_CLIENT_ID").wrap_err("Missing GITHUB_CLIENT_ID")?,
            client_secret: std::env::var("GITHUB_CLIENT_SECRET")
                .wrap_err("Missing GITHUB_CLIENT_SECRET")?,
        })
    }

    pub(crate) fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<Url> {
        Ok(Url::parse_with_params(
            "https://github.com/login/oauth/authorize",
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("state", state),
            ],
        )?)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GithubUser {
    pub(crate) node_id: String,
    pub(crate) login: String,
}

/// Exchanges an OAuth `code` for the GitHub user it belongs to.
#[instrument(skip(config, code), err)]
pub(crate) async fn user_for_code(
    config: &GithubConfig,
    code: &str,
    redirect_uri: &str,
) -> Result<GithubUser> {
    let client = reqwest::Client::new();

    let token: AccessTokenResponse = client
        .post("https://github.com/login/oauth/access_token")
        .query(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .header("Accept", "application/json")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .wrap_err("Could not decode the GitHub access token response")?;

    let user = client
        .get("https://api.github.com/user")
        .header("User-Agent", "recipe-finder")
        .header("X-GitHub-Api-Version", "2022-11-28")
        .header("Accept", "application/vnd.github+json")
        .bearer_auth(token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .wrap_err("Could not decode the GitHub user")?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_escapes_parameters() {
        let config = GithubConfig {
            client_id: "abc".to_string(),
            client_secret: "secret".to_string(),
        };

        let url = config
            .authorize_url("https://recipes.example/auth/github", "state-1")
            .unwrap();

        assert_eq!(url.host_str(), Some("github.com"));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("client_id".to_string(), "abc".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "https://recipes.example/auth/github".to_string()
        )));
        assert!(!url.as_str().contains("secret"));
    }
}
