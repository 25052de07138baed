//! reqwest-backed [`ApiClient`] for the Instagram REST API, plus the two
//! OAuth helpers (authorization URL and code-for-token exchange).

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::{form_urlencoded, Url};

use super::{ApiClient, Method, RateLimit, RequestOptions, Response};
use crate::config::ClientConfig;
use crate::error::{Result, StreamError};

const AUTHORIZATION_PATH: &str = "/oauth/authorize";
const ACCESS_TOKEN_PATH: &str = "/oauth/access_token";

/// Client credentials.  Absent fields are simply not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthParams {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
}

/// Extra query parameters for [`InstagramClient::authorization_url`].
#[derive(Debug, Clone, Default)]
pub struct AuthorizationOptions {
    /// Permissions beyond `basic`; joined with `+`.
    pub scope: Vec<String>,
    /// Opaque value echoed back to the redirect URI.
    pub state: Option<String>,
}

/// Result of exchanging an authorization code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<TokenUser>,
}

/// The account the access token was issued for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUser {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub profile_picture: String,
    pub website: String,
    pub bio: String,
}

pub struct InstagramClient {
    http: reqwest::Client,
    host: String,
    auth: AuthParams,
}

impl InstagramClient {
    /// Build a client from `config`.  Fails if the host is not a valid URL.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Url::parse(&config.host)?;

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StreamError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            host: config.host.trim_end_matches('/').to_string(),
            auth: AuthParams {
                client_id: config.client_id,
                client_secret: config.client_secret,
                access_token: config.access_token,
            },
        })
    }

    /// Overwrite the auth fields that are set in `params`, leaving the rest alone.
    pub fn set_auth(&mut self, params: AuthParams) -> &mut Self {
        if params.client_id.is_some() {
            self.auth.client_id = params.client_id;
        }
        if params.client_secret.is_some() {
            self.auth.client_secret = params.client_secret;
        }
        if params.access_token.is_some() {
            self.auth.access_token = params.access_token;
        }
        self
    }

    pub fn auth(&self) -> AuthParams {
        self.auth.clone()
    }

    /// URL to send the user to so they can grant access to the app.
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        options: &AuthorizationOptions,
    ) -> Result<String> {
        let client_id = self.auth.client_id.as_deref().ok_or_else(|| {
            StreamError::Configuration("authorization parameter `client_id` not set".into())
        })?;

        let mut url = Url::parse(&self.host)?;
        url.set_path(AUTHORIZATION_PATH);
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code");
            if !options.scope.is_empty() {
                pairs.append_pair("scope", &options.scope.join("+"));
            }
            if let Some(state) = &options.state {
                pairs.append_pair("state", state);
            }
        }
        Ok(url.into())
    }

    /// Exchange the `code` handed to the redirect URI for an access token.
    pub async fn request_access_token(&self, code: &str, redirect_uri: &str) -> Result<AccessToken> {
        let (Some(client_id), Some(client_secret)) =
            (self.auth.client_id.as_deref(), self.auth.client_secret.as_deref())
        else {
            return Err(StreamError::Configuration(
                "authorization parameters `client_id` and `client_secret` not set".into(),
            ));
        };

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", client_id)
            .append_pair("client_secret", client_secret)
            .append_pair("grant_type", "authorization_code")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("code", code)
            .finish();

        let options = RequestOptions::default()
            .body(body)
            .header(CONTENT_TYPE.as_str(), "application/x-www-form-urlencoded");
        let response = self.request(Method::POST, ACCESS_TOKEN_PATH, options).await?;
        Ok(serde_json::from_value(response.body)?)
    }
}

#[async_trait]
impl ApiClient for InstagramClient {
    async fn request(&self, method: Method, path: &str, options: RequestOptions) -> Result<Response> {
        let url = format!("{}{}", self.host, path);
        debug!(%method, %url, "request");

        let mut request = self.http.request(method, &url).query(&options.query);
        for (key, value) in &options.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let rate_limit = RateLimit::from_headers(response.headers());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(Response {
            status: status.as_u16(),
            rate_limit,
            body,
        })
    }
}
