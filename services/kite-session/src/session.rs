//! Kite web login and enctoken validation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use reqwest::{Client, ClientBuilder, StatusCode, cookie::Jar, header::AUTHORIZATION};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::{
    config::KiteConfig,
    error::{Result, SessionError},
    provider::SessionProvider,
    totp,
};

const LOGIN_PATH: &str = "/api/login";
const TWOFA_PATH: &str = "/api/twofa";
const PROFILE_PATH: &str = "/oms/user/profile";
const KITE_VERSION: &str = "3";
const DEFAULT_TWOFA_TYPE: &str = "totp";
const LOGIN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Authenticated Kite web session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Trading account ID
    pub user_id: String,
    /// Account holder name
    pub user_name: String,
    /// Short display name
    pub user_shortname: String,
    /// Avatar URL (empty when the account has none)
    pub avatar_url: String,
    /// `public_token` cookie
    pub public_token: String,
    /// `kf_session` cookie
    pub kf_session: String,
    /// `enctoken` cookie, used as `Authorization: enctoken <value>`
    pub enctoken: String,
    /// Local time of login, `YYYY-MM-DD HH:MM:SS`
    pub login_time: String,
}

/// Kite JSON envelope
#[derive(Debug, Deserialize)]
struct KiteEnvelope<T> {
    #[serde(default)]
    status: String,
    data: Option<T>,
    message: Option<String>,
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    user_id: String,
    request_id: String,
    twofa_type: Option<String>,
    profile: Option<LoginProfile>,
}

#[derive(Debug, Default, Deserialize)]
struct LoginProfile {
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    user_shortname: String,
    avatar_url: Option<String>,
}

#[derive(Debug, Default)]
struct SessionCookies {
    enctoken: Option<String>,
    public_token: Option<String>,
    kf_session: Option<String>,
}

/// Kite web session client
pub struct KiteSession {
    config: KiteConfig,
    http_client: Client,
}

impl std::fmt::Debug for KiteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KiteSession")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl KiteSession {
    /// Create a new client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: KiteConfig) -> Result<Self> {
        let http_client = client_builder(&config).build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Client configuration
    #[must_use]
    pub const fn config(&self) -> &KiteConfig {
        &self.config
    }

    /// Fresh client with its own cookie jar, one per login
    fn login_client(&self) -> Result<Client> {
        let jar = Arc::new(Jar::default());
        Ok(client_builder(&self.config).cookie_provider(jar).build()?)
    }

    /// Step 1: submit credentials, returns the pending 2FA request
    async fn submit_credentials(
        &self,
        client: &Client,
        user_id: &str,
        password: &str,
    ) -> Result<LoginData> {
        let params = [("user_id", user_id), ("password", password)];

        let response = client
            .post(self.config.endpoint(LOGIN_PATH))
            .header("X-Kite-Version", KITE_VERSION)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_envelope::<LoginData>(status, &body)?.ok_or_else(|| {
            SessionError::kite(
                Some("DataException".to_string()),
                Some("login response has no data".to_string()),
                status.as_u16(),
            )
        })
    }

    /// Step 2: submit the TOTP value, returns the session cookies
    async fn submit_twofa(
        &self,
        client: &Client,
        login: &LoginData,
        totp_value: &str,
    ) -> Result<SessionCookies> {
        let twofa_type = login.twofa_type.as_deref().unwrap_or(DEFAULT_TWOFA_TYPE);
        let params = [
            ("user_id", login.user_id.as_str()),
            ("request_id", login.request_id.as_str()),
            ("twofa_value", totp_value),
            ("twofa_type", twofa_type),
            ("skip_totp", "true"),
        ];

        let response = client
            .post(self.config.endpoint(TWOFA_PATH))
            .header("X-Kite-Version", KITE_VERSION)
            .form(&params)
            .send()
            .await?;

        let mut cookies = SessionCookies::default();
        for cookie in response.cookies() {
            match cookie.name() {
                "enctoken" => cookies.enctoken = Some(cookie.value().to_string()),
                "public_token" => cookies.public_token = Some(cookie.value().to_string()),
                "kf_session" => cookies.kf_session = Some(cookie.value().to_string()),
                _ => {}
            }
        }

        let status = response.status();
        let body = response.text().await?;
        parse_envelope::<serde_json::Value>(status, &body)?;

        Ok(cookies)
    }
}

#[async_trait]
impl SessionProvider for KiteSession {
    fn generate_totp_value(&self, totp_secret: &str) -> Result<String> {
        totp::generate_totp_value(totp_secret)
    }

    async fn generate_session(
        &self,
        user_id: &str,
        password: &str,
        totp_value: &str,
    ) -> Result<Session> {
        info!(user_id = %user_id, "Starting Kite login");

        let client = self.login_client()?;

        let login = self
            .submit_credentials(&client, user_id, password)
            .await
            .inspect_err(|e| warn!(user_id = %user_id, error = %e, "Kite credential step failed"))?;
        debug!(user_id = %login.user_id, "Credentials accepted, submitting 2FA");

        let cookies = self
            .submit_twofa(&client, &login, totp_value)
            .await
            .inspect_err(|e| warn!(user_id = %user_id, error = %e, "Kite twofa step failed"))?;

        let enctoken = cookies
            .enctoken
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::MissingCookie("enctoken"))?;

        let profile = login.profile.unwrap_or_default();
        let session = Session {
            user_id: login.user_id,
            user_name: profile.user_name,
            user_shortname: profile.user_shortname,
            avatar_url: profile.avatar_url.unwrap_or_default(),
            public_token: cookies.public_token.unwrap_or_default(),
            kf_session: cookies.kf_session.unwrap_or_default(),
            enctoken,
            login_time: Local::now().format(LOGIN_TIME_FORMAT).to_string(),
        };

        info!(user_id = %session.user_id, "Kite login successful");
        Ok(session)
    }

    async fn check_enctoken_valid(&self, enctoken: &str) -> Result<bool> {
        let response = self
            .http_client
            .get(self.config.endpoint(PROFILE_PATH))
            .header("X-Kite-Version", KITE_VERSION)
            .header(AUTHORIZATION, format!("enctoken {enctoken}"))
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "Enctoken profile check");

        if status.is_success() {
            Ok(true)
        } else if status.is_client_error() {
            Ok(false)
        } else {
            Err(SessionError::UnexpectedStatus(status.as_u16()))
        }
    }
}

fn client_builder(config: &KiteConfig) -> ClientBuilder {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.as_str())
}

/// Decode a Kite envelope, turning error envelopes and non-2xx statuses
/// into [`SessionError::Kite`]
fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<Option<T>> {
    let envelope = match serde_json::from_str::<KiteEnvelope<T>>(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(SessionError::kite(None, None, status.as_u16()));
        }
        Err(e) => return Err(e.into()),
    };

    if !status.is_success() || envelope.status != "success" {
        return Err(SessionError::kite(
            envelope.error_type,
            envelope.message,
            status.as_u16(),
        ));
    }

    Ok(envelope.data)
}
