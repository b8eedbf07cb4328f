//! `/tables`リソース用のHTTPクライアント

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::entity::{CreateTableRequest, Table, TableId, UpdateTableRequest};
use crate::domain::page::Page;
use crate::interface::api::Problem;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {}", problem_detail(.problem))]
    Api {
        status: StatusCode,
        problem: Option<Problem>,
    },
}

fn problem_detail(problem: &Option<Problem>) -> &str {
    problem
        .as_ref()
        .and_then(|p| p.detail.as_deref())
        .unwrap_or("no detail")
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http(e) => e.status(),
            ClientError::Api { status, .. } => Some(*status),
        }
    }
}

pub struct TablesClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl TablesClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response: Response = self.authorize(builder).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        // Problemとして読めないボディは捨てる
        let problem = response.json::<Problem>().await.ok();
        Err(ClientError::Api { status, problem })
    }

    pub async fn create(&self, request: &CreateTableRequest) -> Result<Table, ClientError> {
        let url = format!("{}/tables", self.base_url);
        self.send(self.client.post(url).json(request)).await
    }

    pub async fn update(
        &self,
        id: TableId,
        request: &UpdateTableRequest,
    ) -> Result<Table, ClientError> {
        let url = format!("{}/tables/{}", self.base_url, id);
        self.send(self.client.put(url).json(request)).await
    }

    pub async fn find(&self, id: TableId) -> Result<Table, ClientError> {
        let url = format!("{}/tables/{}", self.base_url, id);
        self.send(self.client.get(url)).await
    }

    pub async fn list(&self, page: i64, size: i64) -> Result<Page<Table>, ClientError> {
        let url = format!("{}/tables", self.base_url);
        self.send(self.client.get(url).query(&[("page", page), ("size", size)]))
            .await
    }

    pub async fn delete(&self, id: TableId) -> Result<TableId, ClientError> {
        let url = format!("{}/tables/{}", self.base_url, id);
        self.send(self.client.delete(url)).await
    }
}
