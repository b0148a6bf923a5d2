use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ClientError;

/// One directory entry from `GET /api/rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub room_name: String,
}

#[derive(Deserialize)]
struct ApiEnvelope<T> {
    message: Option<String>,
    data: Option<T>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    account: &'a str,
    password: &'a str,
}

/// HTTP client for the endpoints surrounding a room session: the auth
/// gate checked before entering a room screen, the room directory the
/// join flow picks its id from, and account management.
///
/// The server tracks the login session through a `session_id` cookie,
/// so the client keeps a cookie store; later calls carry what `login`
/// received.
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base: Url::parse(base_url)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    /// Session validity check. `Ok(false)` means the caller must route
    /// to the login screen instead of entering a room screen.
    pub async fn auth(&self) -> Result<bool, ClientError> {
        let response = self.http.get(self.endpoint("/api/auth")?).send().await?;
        Ok(response.status().is_success())
    }

    /// Fetch the room directory.
    pub async fn rooms(&self) -> Result<Vec<Room>, ClientError> {
        let response = self.http.get(self.endpoint("/api/rooms")?).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let envelope: ApiEnvelope<Vec<Room>> = response.json().await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn login(&self, account: &str, password: &str) -> Result<(), ClientError> {
        self.submit("/api/login", account, password).await
    }

    pub async fn signup(&self, account: &str, password: &str) -> Result<(), ClientError> {
        self.submit("/api/signup", account, password).await
    }

    /// Invalidate the current session.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self.http.get(self.endpoint("/api/logout")?).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }

    async fn submit(&self, path: &str, account: &str, password: &str) -> Result<(), ClientError> {
        let body = Credentials { account, password };
        let response = self
            .http
            .post(self.endpoint(path)?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}

/// Turn a non-success response into the server's `{ message }`, falling
/// back to a generic text when the body is not the expected envelope.
async fn rejection(response: reqwest::Response) -> ClientError {
    let message = response
        .json::<ApiEnvelope<()>>()
        .await
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| "request rejected".into());

    ClientError::Api(message)
}
