use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::SupabaseError;

pub type DbResult<T> = Result<T, SupabaseError>;

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> DbResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> DbResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(SupabaseError::from_status(status.as_u16(), error_text));
        }

        Ok(response)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> DbResult<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> DbResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, auth_token, body, headers).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// GET rows together with the exact total from `Content-Range`.
    pub async fn request_with_count<T>(
        &self,
        path: &str,
        auth_token: Option<&str>,
    ) -> DbResult<(Vec<T>, Option<u64>)>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self
            .send(Method::GET, path, auth_token, None, Some(headers))
            .await?;

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let rows = response.json::<Vec<T>>().await?;
        Ok((rows, total))
    }

    /// First row matching `query` on `table`, if any.
    pub async fn select_one<T>(&self, table: &str, query: &str, auth_token: &str) -> DbResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self
            .request(
                Method::GET,
                &format!("/rest/v1/{}?{}&limit=1", table, query),
                Some(auth_token),
                None,
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn insert<T>(&self, table: &str, auth_token: &str, body: Value) -> DbResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(
            Method::POST,
            &format!("/rest/v1/{}", table),
            Some(auth_token),
            Some(body),
            Some(representation_headers()),
        )
        .await
    }

    pub async fn update<T>(
        &self,
        table: &str,
        filter: &str,
        auth_token: &str,
        body: Value,
    ) -> DbResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(
            Method::PATCH,
            &format!("/rest/v1/{}?{}", table, filter),
            Some(auth_token),
            Some(body),
            Some(representation_headers()),
        )
        .await
    }

    pub async fn delete<T>(&self, table: &str, filter: &str, auth_token: &str) -> DbResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(
            Method::DELETE,
            &format!("/rest/v1/{}?{}", table, filter),
            Some(auth_token),
            None,
            Some(representation_headers()),
        )
        .await
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> DbResult<Value> {
        self.request(
            Method::POST,
            "/auth/v1/token?grant_type=password",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> DbResult<Value> {
        self.request(
            Method::POST,
            "/auth/v1/signup",
            None,
            Some(json!({
                "email": email,
                "password": password,
                "data": metadata
            })),
        )
        .await
    }

    pub async fn sign_out(&self, auth_token: &str) -> DbResult<()> {
        self.send(Method::POST, "/auth/v1/logout", Some(auth_token), None, None)
            .await?;
        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

/// `0-14/57` -> 57, `*/0` -> 0, `0-14/*` -> None
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/').and_then(|(_, total)| total.parse().ok())
}
