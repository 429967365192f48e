//! Template service client.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list | `GET /api/templates?skip&limit[&category]` |
//! | get | `GET /api/templates/{id}` |
//! | search | `POST /api/templates/search?q&skip&limit` |
//! | upload | `POST /api/templates/upload` with a JSON body |
//! | delete | `DELETE /api/templates/{id}` |

use super::{
    ApiResponse, Template, TemplateQuery, TemplateSource, TemplateUpload, validate_template_id,
};
use crate::error::{Result, StudioError};
use crate::http;
use tracing::info;
use ureq::Agent;

pub struct HttpTemplateClient {
    agent: Agent,
    base_url: String,
}

impl HttpTemplateClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            agent: http::agent(timeout_secs),
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
        }
    }

    fn api_url(&self) -> String {
        format!("{}/api/templates", self.base_url)
    }

    fn template_url(&self, id: &str) -> String {
        format!("{}/{}", self.api_url(), id)
    }

    /// 404 on an id-addressed call means the template is unknown.
    fn not_found_as(id: &str, err: StudioError) -> StudioError {
        match err {
            StudioError::HttpStatus { status: 404, .. } => {
                StudioError::TemplateNotFound(id.to_string())
            }
            other => other,
        }
    }
}

impl TemplateSource for HttpTemplateClient {
    fn fetch(&self, query: &TemplateQuery) -> Result<Vec<Template>> {
        query.validate()?;
        let skip = query.skip.to_string();
        let limit = query.effective_limit().to_string();

        let response = match &query.search {
            Some(q) => {
                info!("Searching templates at {} for '{}'", self.base_url, q.trim());
                self.agent
                    .post(format!("{}/search", self.api_url()))
                    .query("q", q.trim())
                    .query("skip", &skip)
                    .query("limit", &limit)
                    .header("Accept", "application/json")
                    .send_empty()?
            }
            None => {
                info!("Listing templates at {}", self.base_url);
                let mut request = self
                    .agent
                    .get(self.api_url())
                    .query("skip", &skip)
                    .query("limit", &limit)
                    .header("Accept", "application/json");
                if let Some(category) = &query.category {
                    request = request.query("category", category);
                }
                request.call()?
            }
        };

        let body = http::read_body(response)?;
        let templates: Vec<Template> = serde_json::from_str(&body)?;
        info!("Fetched {} templates", templates.len());
        Ok(templates)
    }

    fn get(&self, id: &str) -> Result<Template> {
        validate_template_id(id)?;
        let response = self
            .agent
            .get(self.template_url(id))
            .header("Accept", "application/json")
            .call()?;
        let body = http::read_body(response).map_err(|e| Self::not_found_as(id, e))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn upload(&self, template: &TemplateUpload) -> Result<ApiResponse> {
        template.validate()?;
        info!("Uploading template '{}' to {}", template.id, self.base_url);
        let response = self
            .agent
            .post(format!("{}/upload", self.api_url()))
            .header("Accept", "application/json")
            .send_json(template)?;
        let body = http::read_body(response)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn delete(&self, id: &str) -> Result<ApiResponse> {
        validate_template_id(id)?;
        let response = self
            .agent
            .delete(self.template_url(id))
            .header("Accept", "application/json")
            .call()?;
        let body = http::read_body(response).map_err(|e| Self::not_found_as(id, e))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::fetch_with_fallback;

    // Port 9 (discard) is closed on test machines, so connects fail fast.
    const DEAD_SERVER: &str = "http://127.0.0.1:9/";

    #[test]
    fn test_urls() {
        let client = HttpTemplateClient::new("http://templates.local:8000/", 5);
        assert_eq!(client.api_url(), "http://templates.local:8000/api/templates");
        assert_eq!(
            client.template_url("api-design"),
            "http://templates.local:8000/api/templates/api-design"
        );
        assert_eq!(client.describe(), "http://templates.local:8000");
    }

    #[test]
    fn test_not_found_mapping() {
        let err = HttpTemplateClient::not_found_as(
            "x",
            StudioError::HttpStatus {
                status: 404,
                body: "{}".to_string(),
            },
        );
        assert!(matches!(err, StudioError::TemplateNotFound(id) if id == "x"));

        let err = HttpTemplateClient::not_found_as(
            "x",
            StudioError::HttpStatus {
                status: 500,
                body: String::new(),
            },
        );
        assert!(matches!(err, StudioError::HttpStatus { status: 500, .. }));
    }

    #[test]
    fn test_validation_happens_before_network() {
        let client = HttpTemplateClient::new(DEAD_SERVER, 1);
        assert!(client.fetch(&TemplateQuery::search("x")).unwrap_err().is_validation());
        assert!(client.get("a b").unwrap_err().is_validation());
        assert!(client.delete("").unwrap_err().is_validation());
    }

    #[test]
    fn test_unreachable_server_falls_back() {
        let client = HttpTemplateClient::new(DEAD_SERVER, 2);
        let out = fetch_with_fallback(&client, &TemplateQuery::default());
        assert!(out.fallback);
        assert!(out.error.is_some());
        assert!(!out.templates.is_empty());
    }
}
