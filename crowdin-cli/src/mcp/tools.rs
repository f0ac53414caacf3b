use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content},
    tool, ErrorData as McpError, ServerHandler,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::client::{ApprovalQuery, CrowdinApi, CrowdinClient, StringQuery, TranslationQuery};
use crate::core::types::ReplaceScope;
use crate::engine::{ApprovalEngine, NullObserver, ReplaceEngine};

/// Crowdin MCP Service
#[derive(Clone)]
pub struct CrowdinService {
    tool_router: ToolRouter<Self>,
    client: Arc<CrowdinClient>,
}

impl std::fmt::Debug for CrowdinService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrowdinService").finish()
    }
}

impl CrowdinService {
    pub fn new(client: Arc<CrowdinClient>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            client,
        }
    }

    fn api(&self) -> &dyn CrowdinApi {
        self.client.as_ref()
    }
}

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
            "Failed to serialize result: {}",
            e
        ))])),
    }
}

// Tool parameter types
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProjectParams {
    /// The project ID
    pub project_id: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListStringsParams {
    /// The project ID
    pub project_id: u64,

    /// Filter by file ID
    #[serde(default)]
    pub file_id: Option<u64>,

    /// Filter strings by text/context
    #[serde(default)]
    pub filter: Option<String>,

    /// Filter strings by CroQL expression
    #[serde(default)]
    pub croql: Option<String>,

    /// Max items (default 25, max 500)
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Starting offset
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetStringParams {
    /// The project ID
    pub project_id: u64,

    /// The string ID
    pub string_id: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LanguageTranslationsParams {
    /// The project ID
    pub project_id: u64,

    /// Target language ID (e.g. 'en', 'de')
    pub language_id: String,

    /// Filter by file ID
    #[serde(default)]
    pub file_id: Option<u64>,

    /// Comma-separated string IDs
    #[serde(default)]
    pub string_ids: Option<String>,

    /// CroQL expression to filter
    #[serde(default)]
    pub croql: Option<String>,

    /// Max items (default 25)
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Starting offset
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StringTranslationsParams {
    /// The project ID
    pub project_id: u64,

    /// The source string ID
    pub string_id: u64,

    /// Target language ID
    pub language_id: String,

    /// Max items (default 25)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListApprovalsParams {
    /// The project ID
    pub project_id: u64,

    /// Target language ID
    pub language_id: String,

    /// Scope to one source string
    #[serde(default)]
    pub string_id: Option<u64>,

    /// Scope to one file
    #[serde(default)]
    pub file_id: Option<u64>,

    /// Max items (default 25)
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Starting offset
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QaIssuesParams {
    /// The project ID
    pub project_id: u64,

    /// Filter by target language ID
    #[serde(default)]
    pub language_id: Option<String>,

    /// Max items (default 100)
    #[serde(default = "default_batch_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddTranslationParams {
    /// The project ID
    pub project_id: u64,

    /// The source string ID
    pub string_id: u64,

    /// Target language ID
    pub language_id: String,

    /// The translation text
    pub text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteTranslationParams {
    /// The project ID
    pub project_id: u64,

    /// The translation ID to delete
    pub translation_id: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteAllTranslationsParams {
    /// The project ID
    pub project_id: u64,

    /// The source string ID
    pub string_id: u64,

    /// Target language (if omitted, deletes for all languages)
    #[serde(default)]
    pub language_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ApproveTranslationParams {
    /// The project ID
    pub project_id: u64,

    /// The translation ID to approve
    pub translation_id: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveApprovalParams {
    /// The project ID
    pub project_id: u64,

    /// The approval ID to remove
    pub approval_id: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchReplaceParams {
    /// The project ID
    pub project_id: u64,

    /// Target language ID (e.g. 'en')
    pub language_id: String,

    /// Text to search for in translations
    pub search: String,

    /// Replacement text
    pub replace: String,

    /// Filter by file ID
    #[serde(default)]
    pub file_id: Option<u64>,

    /// If true, applies changes. If false, shows preview only.
    #[serde(default)]
    pub apply: bool,

    /// Max strings to process per call
    #[serde(default = "default_batch_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SwitchApprovalParams {
    /// The project ID
    pub project_id: u64,

    /// Target language ID
    pub language_id: String,

    /// The source string ID
    pub string_id: u64,

    /// Text of the stale translation, for reporting only
    #[serde(default)]
    pub expected_old_text: Option<String>,

    /// Exact text of the translation that should end up approved
    pub expected_new_text: String,
}

fn default_limit() -> usize {
    25
}

fn default_batch_limit() -> usize {
    100
}

// Number of matches embedded in a search/replace preview payload.
const PREVIEW_LIMIT: usize = 20;

// Tool implementations
#[rmcp::tool_router]
impl CrowdinService {
    /// List accessible projects
    #[tool(description = "List all Crowdin projects accessible to the authenticated user.")]
    async fn list_projects(&self) -> Result<CallToolResult, McpError> {
        match self.api().list_projects().await {
            Ok(projects) => ok_json(&projects),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to list projects: {}",
                e
            ))])),
        }
    }

    /// Get detailed project metadata
    #[tool(description = "Get detailed information about a Crowdin project.")]
    async fn get_project(
        &self,
        Parameters(params): Parameters<ProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api().get_project(params.project_id).await {
            Ok(project) => ok_json(&project),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to get project: {}",
                e
            ))])),
        }
    }

    /// List a project's source files
    #[tool(description = "List all source files in a Crowdin project.")]
    async fn list_files(
        &self,
        Parameters(params): Parameters<ProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api().list_files(params.project_id).await {
            Ok(files) => ok_json(&files),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to list files: {}",
                e
            ))])),
        }
    }

    /// Per-language translation and approval progress
    #[tool(description = "Get translation and approval progress for a project by language.")]
    async fn translation_progress(
        &self,
        Parameters(params): Parameters<ProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api().project_progress(params.project_id).await {
            Ok(progress) => ok_json(&progress),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to get translation progress: {}",
                e
            ))])),
        }
    }

    /// List source strings with optional filters
    #[tool(
        description = "List source strings in a project. Supports filtering by file, CroQL, or text search."
    )]
    async fn list_source_strings(
        &self,
        Parameters(params): Parameters<ListStringsParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = StringQuery {
            file_id: params.file_id,
            filter: params.filter,
            croql: params.croql,
            limit: params.limit,
            offset: params.offset,
        };

        match self.api().list_strings(params.project_id, &query).await {
            Ok(strings) => {
                let count = strings.len();
                ok_json(&serde_json::json!({
                    "items": strings,
                    "count": count,
                }))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to list source strings: {}",
                e
            ))])),
        }
    }

    /// Get a single source string
    #[tool(description = "Get a single source string by ID.")]
    async fn get_source_string(
        &self,
        Parameters(params): Parameters<GetStringParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api()
            .get_string(params.project_id, params.string_id)
            .await
        {
            Ok(string) => ok_json(&string),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to get source string: {}",
                e
            ))])),
        }
    }

    /// List translations for one target language
    #[tool(
        description = "List translations for a specific language. Can filter by file, string IDs, or CroQL."
    )]
    async fn list_language_translations(
        &self,
        Parameters(params): Parameters<LanguageTranslationsParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = TranslationQuery {
            file_id: params.file_id,
            string_ids: params.string_ids,
            croql: params.croql,
            limit: params.limit,
            offset: params.offset,
        };

        match self
            .api()
            .list_language_translations(params.project_id, &params.language_id, &query)
            .await
        {
            Ok(translations) => ok_json(&translations),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to list language translations: {}",
                e
            ))])),
        }
    }

    /// List all candidates for one string+language
    #[tool(
        description = "List all translations for a specific source string in a given language."
    )]
    async fn list_string_translations(
        &self,
        Parameters(params): Parameters<StringTranslationsParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api()
            .list_string_translations(
                params.project_id,
                params.string_id,
                &params.language_id,
                params.limit,
            )
            .await
        {
            Ok(translations) => ok_json(&translations),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to list string translations: {}",
                e
            ))])),
        }
    }

    /// List approvals for a string or file in one language
    #[tool(
        description = "List translation approvals for a language, scoped to a source string or a file."
    )]
    async fn list_translation_approvals(
        &self,
        Parameters(params): Parameters<ListApprovalsParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = ApprovalQuery {
            string_id: params.string_id,
            file_id: params.file_id,
            language_id: Some(params.language_id),
            limit: params.limit,
            offset: params.offset,
        };

        match self.api().list_approvals(params.project_id, &query).await {
            Ok(approvals) => ok_json(&approvals),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to list approvals: {}",
                e
            ))])),
        }
    }

    /// List QA check issues
    #[tool(description = "List quality-assurance check issues for a project, optionally by language.")]
    async fn list_qa_issues(
        &self,
        Parameters(params): Parameters<QaIssuesParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api()
            .list_qa_issues(params.project_id, params.language_id.as_deref(), params.limit)
            .await
        {
            Ok(issues) => ok_json(&issues),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to list QA issues: {}",
                e
            ))])),
        }
    }

    /// Add a translation candidate
    #[tool(
        description = "Add a new translation for a source string. Use this to propose or fix a translation. Creates a new candidate; it does not change which translation is approved."
    )]
    async fn add_translation(
        &self,
        Parameters(params): Parameters<AddTranslationParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api()
            .add_translation(
                params.project_id,
                params.string_id,
                &params.language_id,
                &params.text,
            )
            .await
        {
            Ok(translation) => ok_json(&translation),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to add translation: {}",
                e
            ))])),
        }
    }

    /// Delete one translation
    #[tool(description = "Delete a specific translation by its ID.")]
    async fn delete_translation(
        &self,
        Parameters(params): Parameters<DeleteTranslationParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api()
            .delete_translation(params.project_id, params.translation_id)
            .await
        {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(
                "Translation deleted successfully",
            )])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to delete translation: {}",
                e
            ))])),
        }
    }

    /// Delete every translation for a string
    #[tool(
        description = "Delete all translations for a string (optionally for a specific language)."
    )]
    async fn delete_all_translations(
        &self,
        Parameters(params): Parameters<DeleteAllTranslationsParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api()
            .delete_all_translations(
                params.project_id,
                params.string_id,
                params.language_id.as_deref(),
            )
            .await
        {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(
                "All translations deleted successfully",
            )])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to delete translations: {}",
                e
            ))])),
        }
    }

    /// Approve a translation
    #[tool(description = "Approve a translation by its translation ID.")]
    async fn approve_translation(
        &self,
        Parameters(params): Parameters<ApproveTranslationParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api()
            .add_approval(params.project_id, params.translation_id)
            .await
        {
            Ok(approval) => ok_json(&approval),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to approve translation: {}",
                e
            ))])),
        }
    }

    /// Remove an approval
    #[tool(description = "Remove an approval by its approval ID.")]
    async fn remove_approval(
        &self,
        Parameters(params): Parameters<RemoveApprovalParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api()
            .remove_approval(params.project_id, params.approval_id)
            .await
        {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(
                "Approval removed successfully",
            )])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to remove approval: {}",
                e
            ))])),
        }
    }

    /// Bulk search and replace over translation text
    #[tool(
        description = "Find translations containing a search term and replace with new text. Useful for bulk branding updates. Returns a preview of changes unless apply=true."
    )]
    async fn search_and_replace_translations(
        &self,
        Parameters(params): Parameters<SearchReplaceParams>,
    ) -> Result<CallToolResult, McpError> {
        let scope = ReplaceScope {
            project_id: params.project_id,
            language_id: params.language_id,
            file_id: params.file_id,
            page_limit: params.limit,
        };
        let engine = ReplaceEngine::new(self.api());

        if !params.apply {
            return match engine.plan(&scope, &params.search, &params.replace).await {
                Ok(matches) => ok_json(&serde_json::json!({
                    "matchCount": matches.len(),
                    "preview": matches.iter().take(PREVIEW_LIMIT).collect::<Vec<_>>(),
                })),
                Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to preview replacements: {}",
                    e
                ))])),
            };
        }

        match engine
            .apply(&scope, &params.search, &params.replace, &NullObserver)
            .await
        {
            Ok(report) => ok_json(&serde_json::json!({
                "applied": report.updated,
                "failed": report.failed,
                "results": report.outcomes,
            })),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to apply replacements: {}",
                e
            ))])),
        }
    }

    /// Move an approval onto an expected translation
    #[tool(
        description = "Ensure the approval for a string points at the translation matching the expected text exactly. Removes stale approvals first. Reports not-found when no candidate matches."
    )]
    async fn switch_approval(
        &self,
        Parameters(params): Parameters<SwitchApprovalParams>,
    ) -> Result<CallToolResult, McpError> {
        let engine = ApprovalEngine::new(self.api());

        match engine
            .switch_approval(
                params.project_id,
                &params.language_id,
                params.string_id,
                params.expected_old_text.as_deref(),
                &params.expected_new_text,
            )
            .await
        {
            Ok(outcome) => ok_json(&outcome),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to switch approval: {}",
                e
            ))])),
        }
    }
}

// Server handler implementation
#[rmcp::tool_handler]
impl ServerHandler for CrowdinService {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities, ToolsCapability};

        rmcp::model::ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "crowdin-tools".to_string(),
                title: Some("Crowdin Tools MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Crowdin translation maintenance tools. Read tools list projects, files, \
                 strings, translations, approvals and QA issues. Write tools add or delete \
                 translations and approvals. search_and_replace_translations previews by \
                 default; pass apply=true only after reviewing the preview."
                    .to_string(),
            ),
        }
    }
}
