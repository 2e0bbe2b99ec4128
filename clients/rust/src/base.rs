use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug)]
pub enum APIErrorVariant {
    /// The server could not be reached
    Network,
    /// The response body did not have the expected shape
    MalformedResponse,
    /// The server responded with another status code than expected
    UnexpectedStatusCode(StatusCode),
}

#[derive(Debug)]
pub struct APIError {
    pub variant: APIErrorVariant,
    pub message: String,
}

impl APIError {
    /// Status code of the response when the server responded with an unexpected one
    pub fn status(&self) -> Option<StatusCode> {
        match self.variant {
            APIErrorVariant::UnexpectedStatusCode(status) => Some(status),
            _ => None,
        }
    }
}

pub type APIResponse<T> = Result<T, APIError>;

pub(crate) struct BaseClient {
    client: Client,
    address: String,
}

impl BaseClient {
    pub fn new(address: String) -> Self {
        Self {
            client: Client::new(),
            address,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.address, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        expected_status: StatusCode,
    ) -> APIResponse<T> {
        let res = request.send().await.map_err(|e| APIError {
            variant: APIErrorVariant::Network,
            message: e.to_string(),
        })?;
        self.handle_response(res, expected_status).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        res: Response,
        expected_status: StatusCode,
    ) -> APIResponse<T> {
        let status = res.status();
        if status != expected_status {
            return Err(APIError {
                variant: APIErrorVariant::UnexpectedStatusCode(status),
                message: res.text().await.unwrap_or_default(),
            });
        }

        res.json::<T>().await.map_err(|e| APIError {
            variant: APIErrorVariant::MalformedResponse,
            message: e.to_string(),
        })
    }

    /// Sends a get request and hands out the response without reading its body
    pub async fn get_response(
        &self,
        path: String,
        expected_status: StatusCode,
    ) -> APIResponse<Response> {
        let res = self
            .client
            .get(&self.url(&path))
            .send()
            .await
            .map_err(|e| APIError {
                variant: APIErrorVariant::Network,
                message: e.to_string(),
            })?;
        let status = res.status();
        if status != expected_status {
            return Err(APIError {
                variant: APIErrorVariant::UnexpectedStatusCode(status),
                message: res.text().await.unwrap_or_default(),
            });
        }
        Ok(res)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: String,
        expected_status: StatusCode,
    ) -> APIResponse<T> {
        self.send(self.client.get(&self.url(&path)), expected_status)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: String,
        expected_status: StatusCode,
    ) -> APIResponse<T> {
        self.send(self.client.delete(&self.url(&path)), expected_status)
            .await
    }

    pub async fn post<T: DeserializeOwned, S: Serialize>(
        &self,
        body: S,
        path: String,
        expected_status: StatusCode,
    ) -> APIResponse<T> {
        self.send(self.client.post(&self.url(&path)).json(&body), expected_status)
            .await
    }

    pub async fn put<T: DeserializeOwned, S: Serialize>(
        &self,
        body: S,
        path: String,
        expected_status: StatusCode,
    ) -> APIResponse<T> {
        self.send(self.client.put(&self.url(&path)).json(&body), expected_status)
            .await
    }
}
