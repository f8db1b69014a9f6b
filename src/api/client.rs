use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::BookingApi;
use crate::errors::ApiError;
use crate::models::{
    AppointmentEdit, AppointmentReply, AppointmentRequest, AppointmentStatus,
    AppointmentSubmission, AvailabilityFeed, AvailabilityQuery, CenterCatalog, Patient,
    SubmitReply,
};

// The service serves a challenge page to clients without a consistent
// browser identity, so every request carries this fixed header set.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.114 Safari/537.36";

const BLOCK_MARKERS: [&str; 2] = ["cloudflare", "Checking your browser before accessing"];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DoctolibClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub redirection: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogEnvelope {
    data: CenterCatalog,
}

impl DoctolibClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));

        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // Session warm-up. The reply is a plain HTML page; all that matters is
    // that it is not the anti-bot challenge.
    pub async fn warm_up(&self) -> Result<(), ApiError> {
        let url = format!("{}/sessions/new", self.base_url);
        self.execute(self.http.get(url), "/sessions/new").await?;
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginReply, ApiError> {
        let body = json!({
            "kind": "patient",
            "username": username,
            "password": password,
            "remember": true,
            "remember_username": true,
        });
        self.post_json("/login.json", &body).await
    }

    pub async fn request_auth_code(&self) -> Result<(), ApiError> {
        let body = json!({"two_factor_auth_method": "email"});
        self.post_ignore_body("/api/accounts/send_auth_code", &body)
            .await
    }

    pub async fn submit_auth_code(&self, code: &str) -> Result<(), ApiError> {
        let body = json!({"auth_code": code, "two_factor_auth_method": "email"});
        self.post_ignore_body("/login/challenge", &body).await
    }

    pub async fn master_patients(&self) -> Result<Vec<Patient>, ApiError> {
        self.get_json("/account/master_patients.json", &[]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }
        let body = self.execute(request, path).await?;
        decode(path, &body)
    }

    async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let reply = self.execute(self.http.post(url).json(body), path).await?;
        decode(path, &reply)
    }

    // POST to an endpoint whose success reply is deliberately empty.
    async fn post_ignore_body<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        self.execute(self.http.post(url).json(body), path).await?;
        Ok(())
    }

    async fn put_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let reply = self.execute(self.http.put(url).json(body), path).await?;
        decode(path, &reply)
    }

    // Send one request, map the failure taxonomy, and hand back the raw
    // body. Block pages must surface as Blocked, not Server, so the retry
    // loop can tell them apart.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<String, ApiError> {
        let response = request.send().await.map_err(ApiError::from_reqwest)?;
        let status = response.status();
        let html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/html"));
        let body = response.text().await.map_err(ApiError::from_reqwest)?;

        tracing::debug!(path, status = status.as_u16(), body = %body, "api exchange");

        if status == StatusCode::SERVICE_UNAVAILABLE
            && html
            && BLOCK_MARKERS.iter().any(|marker| body.contains(marker))
        {
            return Err(ApiError::Blocked(format!("challenge page on {path}")));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Authentication(snippet(&body)));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: snippet(&body),
            });
        }
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::Decode(format!("{path}: {err}")))
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[async_trait]
impl BookingApi for DoctolibClient {
    async fn center_catalog(&self, center: &str) -> Result<CenterCatalog, ApiError> {
        let envelope: CatalogEnvelope =
            self.get_json(&format!("/booking/{center}.json"), &[]).await?;
        Ok(envelope.data)
    }

    async fn availabilities(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<AvailabilityFeed, ApiError> {
        self.get_json("/availabilities.json", &query.to_params())
            .await
    }

    async fn create_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> Result<AppointmentReply, ApiError> {
        self.post_json("/appointments.json", request).await
    }

    async fn appointment_edit(
        &self,
        appointment_id: &str,
        master_patient_id: Option<u64>,
    ) -> Result<AppointmentEdit, ApiError> {
        let path = format!("/appointments/{appointment_id}/edit.json");
        let params: Vec<(&str, String)> = master_patient_id
            .map(|id| vec![("master_patient_id", id.to_string())])
            .unwrap_or_default();
        self.get_json(&path, &params).await
    }

    async fn submit_appointment(
        &self,
        appointment_id: &str,
        submission: &AppointmentSubmission,
    ) -> Result<SubmitReply, ApiError> {
        self.put_json(&format!("/appointments/{appointment_id}.json"), submission)
            .await
    }

    async fn appointment_status(
        &self,
        appointment_id: &str,
    ) -> Result<AppointmentStatus, ApiError> {
        self.get_json(&format!("/appointments/{appointment_id}.json"), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_envelope_is_unwrapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/booking/ciz-berlin-berlin.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": {"profile": {"id": 42}, "visit_motives": [], "places": [], "agendas": []}}"#,
            )
            .create_async()
            .await;

        let client = DoctolibClient::new(&server.url()).unwrap();
        let catalog = client.center_catalog("ciz-berlin-berlin").await.unwrap();
        assert_eq!(catalog.profile.id, 42);
    }

    #[tokio::test]
    async fn test_challenge_page_maps_to_blocked() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sessions/new")
            .with_status(503)
            .with_header("content-type", "text/html")
            .with_body("<html>Checking your browser before accessing</html>")
            .create_async()
            .await;

        let client = DoctolibClient::new(&server.url()).unwrap();
        let err = client.warm_up().await.unwrap_err();
        assert!(matches!(err, ApiError::Blocked(_)));
    }

    #[tokio::test]
    async fn test_plain_503_is_a_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sessions/new")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "maintenance"}"#)
            .create_async()
            .await;

        let client = DoctolibClient::new(&server.url()).unwrap();
        let err = client.warm_up().await.unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_missing_appointment_maps_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/appointments/gone.json")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let client = DoctolibClient::new(&server.url()).unwrap();
        let err = client.appointment_status("gone").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_decode() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/appointments/xyz.json")
            .with_status(200)
            .with_body("<html>surprise</html>")
            .create_async()
            .await;

        let client = DoctolibClient::new(&server.url()).unwrap();
        let err = client.appointment_status("xyz").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
