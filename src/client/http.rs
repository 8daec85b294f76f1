use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    client::{LifecycleBackend, LifecycleError, Page},
    dto::{
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        returns::{InitiateRefundRequest, ReturnList, UpdateReturnStatusRequest},
    },
    lifecycle::{OrderStatus, RefundStatus, ReturnAction, ReturnStatus},
    models::{Order, ReturnRequest},
    response::{ApiResponse, ErrorData, Meta},
    routes::params::{OrderListQuery, ReturnListQuery},
};

/// `LifecycleBackend` over the admin REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<(T, Option<Meta>), LifecycleError> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| LifecycleError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| LifecycleError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from(status, &body));
        }

        let envelope: ApiResponse<T> =
            serde_json::from_slice(&body).map_err(|e| LifecycleError::Decode(e.to_string()))?;
        let data = envelope.data.ok_or_else(|| {
            LifecycleError::Decode(format!("`{}` response has no data", envelope.message))
        })?;
        Ok((data, envelope.meta))
    }
}

fn error_from(status: StatusCode, body: &[u8]) -> LifecycleError {
    let message = serde_json::from_slice::<ApiResponse<ErrorData>>(body)
        .map(|envelope| match envelope.data {
            Some(data) => data.error,
            None => envelope.message,
        })
        .unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LifecycleError::Auth(message),
        StatusCode::CONFLICT => LifecycleError::Conflict(message),
        _ => LifecycleError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl LifecycleBackend for HttpBackend {
    async fn fetch_order(&self, id: Uuid) -> Result<Order, LifecycleError> {
        let request = self.http.get(self.url(&format!("/admin/orders/{id}")));
        let (details, _) = self.send::<OrderWithItems>(request).await?;
        Ok(details.order)
    }

    async fn list_orders(&self, query: &OrderListQuery) -> Result<Page<Order>, LifecycleError> {
        let request = self.http.get(self.url("/admin/orders")).query(query);
        let (list, meta) = self.send::<OrderList>(request).await?;
        Ok(Page {
            items: list.items,
            meta: meta.unwrap_or_else(Meta::empty),
        })
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<Order, LifecycleError> {
        let body = UpdateOrderStatusRequest {
            status: target,
            expected_status: Some(expected),
            location: None,
        };
        let request = self
            .http
            .patch(self.url(&format!("/admin/orders/{id}/status")))
            .json(&body);
        let (order, _) = self.send::<Order>(request).await?;
        Ok(order)
    }

    async fn fetch_return(&self, id: Uuid) -> Result<ReturnRequest, LifecycleError> {
        let request = self.http.get(self.url(&format!("/admin/returns/{id}")));
        let (item, _) = self.send::<ReturnRequest>(request).await?;
        Ok(item)
    }

    async fn list_returns(
        &self,
        query: &ReturnListQuery,
    ) -> Result<Page<ReturnRequest>, LifecycleError> {
        let request = self.http.get(self.url("/admin/returns")).query(query);
        let (list, meta) = self.send::<ReturnList>(request).await?;
        Ok(Page {
            items: list.items,
            meta: meta.unwrap_or_else(Meta::empty),
        })
    }

    async fn update_return_status(
        &self,
        id: Uuid,
        expected: ReturnStatus,
        expected_refund: RefundStatus,
        action: ReturnAction,
    ) -> Result<ReturnRequest, LifecycleError> {
        let body = UpdateReturnStatusRequest {
            action,
            expected_status: Some(expected),
            expected_refund_status: Some(expected_refund),
        };
        let request = self
            .http
            .patch(self.url(&format!("/admin/returns/{id}/status")))
            .json(&body);
        let (item, _) = self.send::<ReturnRequest>(request).await?;
        Ok(item)
    }

    async fn initiate_refund(
        &self,
        id: Uuid,
        expected: ReturnStatus,
        expected_refund: RefundStatus,
    ) -> Result<ReturnRequest, LifecycleError> {
        let body = InitiateRefundRequest {
            expected_status: Some(expected),
            expected_refund_status: Some(expected_refund),
        };
        let request = self
            .http
            .post(self.url(&format!("/admin/returns/{id}/refund")))
            .json(&body);
        let (item, _) = self.send::<ReturnRequest>(request).await?;
        Ok(item)
    }
}
