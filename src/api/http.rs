// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::FinanceApi;
use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult, ServerRejection};
use crate::models::{
    Aggregate, Auth, CancelledTransaction, Credentials, Goal, LoginResponse, NewGoal,
    NewTransaction, PasswordChange, Profile, ProfileUpdate, Registration, Report, ReportRange,
    Transaction, TypedTransactions,
};
use crate::resource::{Resource, ResourceData};
use crate::utils::http_client;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// `FinanceApi` over HTTPS + JSON.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApi")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct CancelledEnvelope {
    data: Vec<CancelledTransaction>,
}

impl HttpApi {
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base URL {} cannot carry a path",
                config.base_url
            )));
        }
        let client = http_client(config.timeout_ms)
            .map_err(|e| ClientError::Config(format!("failed to create HTTP client: {}", e)))?;
        debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "Created finance API client");
        Ok(Self { client, base_url })
    }

    /// Endpoint under the base URL. Each segment is percent-encoded, so ids
    /// containing `/`, `?` or `#` stay inside their segment.
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Config(format!("base URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> ClientResult<T> {
        let body = self.send_raw(what, req).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(resource = what, error = %e, "Response failed to decode");
            ClientError::decode(what, e)
        })
    }

    async fn send_raw(&self, what: &str, req: RequestBuilder) -> ClientResult<String> {
        let resp = req.send().await.map_err(|e| {
            warn!(resource = what, error = %e, "Request failed in transport");
            ClientError::from(e)
        })?;
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            debug!(resource = what, status = status.as_u16(), "Request succeeded");
            Ok(body)
        } else {
            warn!(resource = what, status = status.as_u16(), "Request rejected");
            Err(rejection(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        what: &str,
        auth: &Auth,
        segments: &[&str],
    ) -> ClientResult<T> {
        let req = self.client.get(self.url(segments)?).bearer_auth(auth.token.as_str());
        self.send(what, req).await
    }

    fn report_request(&self, auth: &Auth, range: &ReportRange) -> ClientResult<RequestBuilder> {
        let user = auth.user_id.0.as_str();
        let req = match range {
            ReportRange::Day => self.client.get(self.url(&["report", "day", user])?),
            ReportRange::Week => self.client.get(self.url(&["report", "week", user])?),
            ReportRange::Month => self.client.get(self.url(&["report", "month", user])?),
            ReportRange::Custom { start, end } => self
                .client
                .get(self.url(&["report", "custom", user])?)
                .query(&[
                    ("startDate", start.to_string()),
                    ("endDate", end.to_string()),
                ]),
        };
        Ok(req.bearer_auth(auth.token.as_str()))
    }
}

/// Map a non-success status to the error taxonomy. 401 always means the
/// session is gone.
pub(crate) fn rejection(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| body.trim().to_string());
    let message = if message.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        message
    };

    if status == StatusCode::UNAUTHORIZED {
        ClientError::Auth(message)
    } else if status.is_server_error() {
        ClientError::Rejected(ServerRejection::Unavailable {
            status: status.as_u16(),
            message,
        })
    } else {
        ClientError::Rejected(ServerRejection::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl FinanceApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse> {
        let req = self.client.post(self.url(&["login"])?).json(credentials);
        self.send("login", req).await
    }

    async fn register(&self, registration: &Registration) -> ClientResult<()> {
        let req = self.client.post(self.url(&["signup"])?).json(registration);
        self.send_raw("signup", req).await.map(|_| ())
    }

    async fn forgot_password(&self, email: &str) -> ClientResult<()> {
        let req = self
            .client
            .post(self.url(&["forgot-password"])?)
            .json(&serde_json::json!({ "email": email }));
        self.send_raw("forgot-password", req).await.map(|_| ())
    }

    async fn fetch(&self, auth: &Auth, resource: &Resource) -> ClientResult<ResourceData> {
        let user = auth.user_id.0.as_str();
        let what = resource.name();
        let data = match resource {
            Resource::NetBalance => ResourceData::Balance(
                self.get::<Aggregate>(what, auth, &["balance", user]).await?,
            ),
            Resource::TransactionList(ty) => ResourceData::Transactions(
                self.get::<TypedTransactions>(what, auth, &[ty.as_str(), user])
                    .await?,
            ),
            Resource::RecentTransactions => ResourceData::Recent(
                self.get::<Vec<Transaction>>(what, auth, &["transactions", user])
                    .await?,
            ),
            Resource::CancelledTransactions => ResourceData::Cancelled(
                self.get::<CancelledEnvelope>(what, auth, &["cancelled", user])
                    .await?
                    .data,
            ),
            Resource::Goals => ResourceData::Goals(
                self.get::<Vec<Goal>>(what, auth, &["goals", user]).await?,
            ),
            Resource::Report(range) => ResourceData::Report(
                self.send::<Report>(what, self.report_request(auth, range)?)
                    .await?,
            ),
            Resource::Profile => {
                ResourceData::Profile(self.get::<Profile>(what, auth, &[user]).await?)
            }
        };
        Ok(data)
    }

    async fn create_transaction(
        &self,
        auth: &Auth,
        transaction: &NewTransaction,
    ) -> ClientResult<Transaction> {
        let req = self
            .client
            .post(self.url(&["add", auth.user_id.0.as_str()])?)
            .bearer_auth(auth.token.as_str())
            .json(transaction);
        self.send("transaction", req).await
    }

    async fn cancel_transaction(&self, auth: &Auth, transaction_id: &str) -> ClientResult<()> {
        let req = self
            .client
            .put(self.url(&["cancel", auth.user_id.0.as_str(), transaction_id])?)
            .bearer_auth(auth.token.as_str());
        self.send_raw("cancel", req).await.map(|_| ())
    }

    async fn create_goal(&self, auth: &Auth, goal: &NewGoal) -> ClientResult<Goal> {
        let req = self
            .client
            .post(self.url(&["goals", auth.user_id.0.as_str()])?)
            .bearer_auth(auth.token.as_str())
            .json(goal);
        self.send("goal", req).await
    }

    async fn use_saving(&self, auth: &Auth, saving_id: &str) -> ClientResult<()> {
        let req = self
            .client
            .put(self.url(&["saving", "use", auth.user_id.0.as_str(), saving_id])?)
            .bearer_auth(auth.token.as_str());
        self.send_raw("saving/use", req).await.map(|_| ())
    }

    async fn update_profile(&self, auth: &Auth, update: &ProfileUpdate) -> ClientResult<Profile> {
        let req = self
            .client
            .put(self.url(&[auth.user_id.0.as_str()])?)
            .bearer_auth(auth.token.as_str())
            .json(update);
        self.send("profile", req).await
    }

    async fn change_password(&self, auth: &Auth, change: &PasswordChange) -> ClientResult<()> {
        let req = self
            .client
            .put(self.url(&["password", auth.user_id.0.as_str()])?)
            .bearer_auth(auth.token.as_str())
            .json(change);
        self.send_raw("password", req).await.map(|_| ())
    }

    async fn delete_account(&self, auth: &Auth) -> ClientResult<()> {
        let req = self
            .client
            .delete(self.url(&[auth.user_id.0.as_str()])?)
            .bearer_auth(auth.token.as_str());
        self.send_raw("account", req).await.map(|_| ())
    }
}
