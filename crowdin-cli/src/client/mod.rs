use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::core::error::CrowdinError;
use crate::core::types::{
    Approval, LanguageProgress, LanguageTranslation, Project, ProjectFile, QaIssue, SourceString,
    Translation,
};

/// Server-side filters for a source-string listing.
#[derive(Debug, Clone, Default)]
pub struct StringQuery {
    pub file_id: Option<u64>,
    pub filter: Option<String>,
    pub croql: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// Server-side filters for a per-language translation listing.
#[derive(Debug, Clone, Default)]
pub struct TranslationQuery {
    pub file_id: Option<u64>,
    pub string_ids: Option<String>,
    pub croql: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// Server-side filters for an approval listing. Either a string id or a
/// file id scopes the result; language narrows it further.
#[derive(Debug, Clone, Default)]
pub struct ApprovalQuery {
    pub string_id: Option<u64>,
    pub file_id: Option<u64>,
    pub language_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// The Crowdin REST collaborator contract.
///
/// Object-safe so the reconciliation engine can run against a fake
/// transport in tests. Every method is one remote call; pagination loops
/// live in the callers.
#[async_trait]
pub trait CrowdinApi: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, CrowdinError>;
    async fn get_project(&self, project_id: u64) -> Result<serde_json::Value, CrowdinError>;
    async fn list_files(&self, project_id: u64) -> Result<Vec<ProjectFile>, CrowdinError>;
    async fn project_progress(&self, project_id: u64)
        -> Result<Vec<LanguageProgress>, CrowdinError>;

    async fn list_strings(
        &self,
        project_id: u64,
        query: &StringQuery,
    ) -> Result<Vec<SourceString>, CrowdinError>;

    async fn get_string(
        &self,
        project_id: u64,
        string_id: u64,
    ) -> Result<SourceString, CrowdinError>;

    async fn list_language_translations(
        &self,
        project_id: u64,
        language_id: &str,
        query: &TranslationQuery,
    ) -> Result<Vec<LanguageTranslation>, CrowdinError>;

    async fn list_string_translations(
        &self,
        project_id: u64,
        string_id: u64,
        language_id: &str,
        limit: usize,
    ) -> Result<Vec<Translation>, CrowdinError>;

    async fn add_translation(
        &self,
        project_id: u64,
        string_id: u64,
        language_id: &str,
        text: &str,
    ) -> Result<Translation, CrowdinError>;

    async fn delete_translation(
        &self,
        project_id: u64,
        translation_id: u64,
    ) -> Result<(), CrowdinError>;

    async fn delete_all_translations(
        &self,
        project_id: u64,
        string_id: u64,
        language_id: Option<&str>,
    ) -> Result<(), CrowdinError>;

    async fn list_approvals(
        &self,
        project_id: u64,
        query: &ApprovalQuery,
    ) -> Result<Vec<Approval>, CrowdinError>;

    async fn add_approval(
        &self,
        project_id: u64,
        translation_id: u64,
    ) -> Result<Approval, CrowdinError>;

    async fn remove_approval(
        &self,
        project_id: u64,
        approval_id: u64,
    ) -> Result<(), CrowdinError>;

    async fn list_qa_issues(
        &self,
        project_id: u64,
        language_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<QaIssue>, CrowdinError>;
}

// Crowdin wraps every resource in a `data` object, and lists in an array
// of such objects.
#[derive(Debug, Deserialize)]
struct DataWrapper<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: Vec<DataWrapper<T>>,
}

/// Reqwest-backed client speaking Crowdin REST v2 with bearer auth.
#[derive(Clone)]
pub struct CrowdinClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

// The bearer token must never end up in logs.
impl std::fmt::Debug for CrowdinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrowdinClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CrowdinClient {
    pub fn new(config: &Config) -> Result<Self, CrowdinError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("crowdin-tools/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            token: config.token.clone(),
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, CrowdinError> {
        debug!(path, "GET (list)");
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        let envelope: ListEnvelope<T> = Self::decode(response).await?;
        Ok(envelope.data.into_iter().map(|item| item.data).collect())
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> Result<T, CrowdinError> {
        debug!(path, "GET");
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let wrapper: DataWrapper<T> = Self::decode(response).await?;
        Ok(wrapper.data)
    }

    async fn post_one<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, CrowdinError> {
        debug!(path, "POST");
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        let wrapper: DataWrapper<T> = Self::decode(response).await?;
        Ok(wrapper.data)
    }

    async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<(), CrowdinError> {
        debug!(path, "DELETE");
        let response = self
            .http
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        Self::error_for_status(response).await?;
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CrowdinError> {
        let response = Self::error_for_status(response).await?;
        Ok(response.json().await?)
    }

    async fn error_for_status(response: Response) -> Result<Response, CrowdinError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CrowdinError::RateLimited);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(CrowdinError::NotFound(response.url().path().to_string()));
        }
        // The body carries Crowdin's actual reason; surface it instead of
        // the bare status line.
        let body = response.text().await.unwrap_or_default();
        Err(CrowdinError::Remote {
            status: status.as_u16(),
            message: remote_error_message(status, &body),
        })
    }
}

/// Pull the service's message out of a Crowdin error body. Falls back to
/// the raw body, then to the HTTP reason phrase when the body is empty.
fn remote_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        // Validation errors nest per-field; auth errors use a flat shape.
        for pointer in ["/errors/0/error/errors/0/message", "/error/message"] {
            if let Some(message) = value.pointer(pointer).and_then(|m| m.as_str()) {
                return message.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

// Crowdin caps list endpoints at 500 items per request.
const PAGE_LIMIT: usize = 500;

/// Drain a paginated listing: fetch pages until one comes back shorter
/// than the page limit.
async fn fetch_all<T, F, Fut>(page_limit: usize, mut fetch_page: F) -> Result<Vec<T>, CrowdinError>
where
    F: FnMut(usize) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<T>, CrowdinError>>,
{
    let mut items = Vec::new();
    let mut offset = 0;
    loop {
        let page = fetch_page(offset).await?;
        let page_len = page.len();
        items.extend(page);
        if page_len < page_limit {
            break;
        }
        offset += page_len;
    }
    Ok(items)
}

fn push_opt<T: ToString>(query: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<T>) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}

#[async_trait]
impl CrowdinApi for CrowdinClient {
    async fn list_projects(&self) -> Result<Vec<Project>, CrowdinError> {
        fetch_all(PAGE_LIMIT, |offset| async move {
            self.get_list(
                "/projects",
                &[
                    ("limit", PAGE_LIMIT.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await
        })
        .await
    }

    async fn get_project(&self, project_id: u64) -> Result<serde_json::Value, CrowdinError> {
        self.get_one(&format!("/projects/{project_id}")).await
    }

    async fn list_files(&self, project_id: u64) -> Result<Vec<ProjectFile>, CrowdinError> {
        let path = format!("/projects/{project_id}/files");
        fetch_all(PAGE_LIMIT, |offset| {
            let path = path.clone();
            async move {
                self.get_list(
                    &path,
                    &[
                        ("limit", PAGE_LIMIT.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await
            }
        })
        .await
    }

    async fn project_progress(
        &self,
        project_id: u64,
    ) -> Result<Vec<LanguageProgress>, CrowdinError> {
        let path = format!("/projects/{project_id}/languages/progress");
        fetch_all(PAGE_LIMIT, |offset| {
            let path = path.clone();
            async move {
                self.get_list(
                    &path,
                    &[
                        ("limit", PAGE_LIMIT.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await
            }
        })
        .await
    }

    async fn list_strings(
        &self,
        project_id: u64,
        query: &StringQuery,
    ) -> Result<Vec<SourceString>, CrowdinError> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        push_opt(&mut params, "fileId", &query.file_id);
        push_opt(&mut params, "filter", &query.filter);
        push_opt(&mut params, "croql", &query.croql);
        self.get_list(&format!("/projects/{project_id}/strings"), &params)
            .await
    }

    async fn get_string(
        &self,
        project_id: u64,
        string_id: u64,
    ) -> Result<SourceString, CrowdinError> {
        self.get_one(&format!("/projects/{project_id}/strings/{string_id}"))
            .await
    }

    async fn list_language_translations(
        &self,
        project_id: u64,
        language_id: &str,
        query: &TranslationQuery,
    ) -> Result<Vec<LanguageTranslation>, CrowdinError> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        push_opt(&mut params, "fileId", &query.file_id);
        push_opt(&mut params, "stringIds", &query.string_ids);
        push_opt(&mut params, "croql", &query.croql);
        self.get_list(
            &format!("/projects/{project_id}/languages/{language_id}/translations"),
            &params,
        )
        .await
    }

    async fn list_string_translations(
        &self,
        project_id: u64,
        string_id: u64,
        language_id: &str,
        limit: usize,
    ) -> Result<Vec<Translation>, CrowdinError> {
        self.get_list(
            &format!("/projects/{project_id}/translations"),
            &[
                ("stringId", string_id.to_string()),
                ("languageId", language_id.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn add_translation(
        &self,
        project_id: u64,
        string_id: u64,
        language_id: &str,
        text: &str,
    ) -> Result<Translation, CrowdinError> {
        self.post_one(
            &format!("/projects/{project_id}/translations"),
            &serde_json::json!({
                "stringId": string_id,
                "languageId": language_id,
                "text": text,
            }),
        )
        .await
    }

    async fn delete_translation(
        &self,
        project_id: u64,
        translation_id: u64,
    ) -> Result<(), CrowdinError> {
        self.delete(
            &format!("/projects/{project_id}/translations/{translation_id}"),
            &[],
        )
        .await
    }

    async fn delete_all_translations(
        &self,
        project_id: u64,
        string_id: u64,
        language_id: Option<&str>,
    ) -> Result<(), CrowdinError> {
        let mut params = Vec::new();
        if let Some(language_id) = language_id {
            params.push(("languageId", language_id.to_string()));
        }
        self.delete(
            &format!("/projects/{project_id}/strings/{string_id}/translations"),
            &params,
        )
        .await
    }

    async fn list_approvals(
        &self,
        project_id: u64,
        query: &ApprovalQuery,
    ) -> Result<Vec<Approval>, CrowdinError> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        push_opt(&mut params, "stringId", &query.string_id);
        push_opt(&mut params, "fileId", &query.file_id);
        push_opt(&mut params, "languageId", &query.language_id);
        self.get_list(&format!("/projects/{project_id}/approvals"), &params)
            .await
    }

    async fn add_approval(
        &self,
        project_id: u64,
        translation_id: u64,
    ) -> Result<Approval, CrowdinError> {
        self.post_one(
            &format!("/projects/{project_id}/approvals"),
            &serde_json::json!({ "translationId": translation_id }),
        )
        .await
    }

    async fn remove_approval(
        &self,
        project_id: u64,
        approval_id: u64,
    ) -> Result<(), CrowdinError> {
        self.delete(&format!("/projects/{project_id}/approvals/{approval_id}"), &[])
            .await
    }

    async fn list_qa_issues(
        &self,
        project_id: u64,
        language_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<QaIssue>, CrowdinError> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(language_id) = language_id {
            params.push(("languageIds", language_id.to_string()));
        }
        self.get_list(&format!("/projects/{project_id}/qa-checks"), &params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_crowdin_list_envelope() {
        let body = serde_json::json!({
            "data": [
                { "data": { "stringId": 50402, "translationId": 91, "text": "Visit DraftBot" } },
                { "data": { "stringId": 50404, "translationId": 92 } }
            ],
            "pagination": { "offset": 0, "limit": 25 }
        });

        let envelope: ListEnvelope<LanguageTranslation> =
            serde_json::from_value(body).unwrap();
        let rows: Vec<_> = envelope.data.into_iter().map(|w| w.data).collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].string_id, 50402);
        assert_eq!(rows[0].text.as_deref(), Some("Visit DraftBot"));
        assert_eq!(rows[1].text, None);
    }

    #[test]
    fn remote_message_prefers_nested_validation_error() {
        let body = r#"{"errors":[{"error":{"key":"text","errors":[{"code":403,"message":"permission denied"}]}}]}"#;
        assert_eq!(
            remote_error_message(StatusCode::FORBIDDEN, body),
            "permission denied"
        );
    }

    #[test]
    fn remote_message_reads_flat_error_shape() {
        let body = r#"{"error":{"code":401,"message":"invalid access token"}}"#;
        assert_eq!(
            remote_error_message(StatusCode::UNAUTHORIZED, body),
            "invalid access token"
        );
    }

    #[test]
    fn remote_message_falls_back_to_body_then_reason() {
        assert_eq!(
            remote_error_message(StatusCode::BAD_GATEWAY, "upstream exploded"),
            "upstream exploded"
        );
        assert_eq!(
            remote_error_message(StatusCode::INTERNAL_SERVER_ERROR, "  "),
            "Internal Server Error"
        );
    }

    #[tokio::test]
    async fn fetch_all_drains_pages_until_short_page() {
        let rows: Vec<u32> = (0..7).collect();
        let fetched = std::cell::Cell::new(0);

        let all = fetch_all(3, |offset| {
            fetched.set(fetched.get() + 1);
            let page: Vec<u32> = rows.iter().skip(offset).take(3).copied().collect();
            async move { Ok::<_, CrowdinError>(page) }
        })
        .await
        .unwrap();

        assert_eq!(all, rows);
        // Two full pages and one short page.
        assert_eq!(fetched.get(), 3);
    }

    #[tokio::test]
    async fn fetch_all_handles_exact_page_boundary() {
        let rows: Vec<u32> = (0..6).collect();

        let all = fetch_all(3, |offset| {
            let page: Vec<u32> = rows.iter().skip(offset).take(3).copied().collect();
            async move { Ok::<_, CrowdinError>(page) }
        })
        .await
        .unwrap();

        // The empty trailing page ends the loop without duplicating rows.
        assert_eq!(all, rows);
    }

    #[test]
    fn decodes_single_resource_envelope() {
        let body = serde_json::json!({
            "data": { "id": 7, "translationId": 91, "stringId": 50402, "languageId": "en" }
        });

        let wrapper: DataWrapper<Approval> = serde_json::from_value(body).unwrap();
        assert_eq!(wrapper.data.id, 7);
        assert_eq!(wrapper.data.translation_id, 91);
    }
}
