//! A blocking [`reqwest`] transport.

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use reqwest::blocking::{Client, RequestBuilder};

use crate::error::CloudError;
use crate::http::{HttpClientFactory, HttpMethod, HttpRequest, HttpResponse};

const APP_ID_HEADER: &str = "X-Kii-AppID";
const APP_KEY_HEADER: &str = "X-Kii-AppKey";

/// Creates requests on one shared connection pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClientFactory {
    client: Client,
}

impl ReqwestClientFactory {
    pub fn new(client: Client) -> Self {
        ReqwestClientFactory { client }
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
    }
}

impl HttpClientFactory for ReqwestClientFactory {
    fn create(
        &self,
        url: &str,
        app_id: &str,
        app_key: &str,
        http_method: HttpMethod,
    ) -> Box<dyn HttpRequest> {
        Box::new(ReqwestRequest {
            client: self.client.clone(),
            method: method(http_method),
            url: url.to_string(),
            headers: vec![
                (APP_ID_HEADER.to_string(), app_id.to_string()),
                (APP_KEY_HEADER.to_string(), app_key.to_string()),
            ],
        })
    }
}

struct ReqwestRequest {
    client: Client,
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
}

impl HttpRequest for ReqwestRequest {
    fn set_content_type(&mut self, content_type: &str) {
        self.set_header(CONTENT_TYPE.as_str(), content_type);
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn send(self: Box<Self>, body: Option<String>) -> Result<HttpResponse, CloudError> {
        let ReqwestRequest {
            client,
            method,
            url,
            headers,
        } = *self;
        let mut builder: RequestBuilder = headers
            .into_iter()
            .fold(client.request(method, url), |b, (name, value)| b.header(name, value));
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let response = builder
            .send()
            .map_err(|e| CloudError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response
            .text()
            .map_err(|e| CloudError::Network(e.to_string()))?;

        Ok(headers
            .into_iter()
            .fold(HttpResponse::new(status, text), |response, (name, value)| {
                response.with_header(&name, value)
            }))
    }
}
