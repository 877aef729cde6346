use serde::Serialize;

use crate::entities::EntityKind;
use crate::errors::SnowsightResult;
use crate::SnowsightClient;

/// Where a worksheet runs
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    pub role: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateWorksheet<'a> {
    action: &'static str,
    org_id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder_id: Option<&'a str>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SaveDraft<'a> {
    action: &'static str,
    id: &'a str,
    project_id: &'a str,
    execution_context: String,
    query: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Execute<'a> {
    action: &'static str,
    project_id: &'a str,
    execution_context: String,
    query: &'a str,
    param_refs: &'a str,
}

impl SnowsightClient {
    pub async fn worksheets(&self) -> SnowsightResult<String> {
        self.list_entities(EntityKind::Query).await
    }

    /// Create an empty worksheet, optionally inside a folder
    pub async fn create_worksheet(
        &self,
        name: &str,
        folder_id: Option<&str>,
    ) -> SnowsightResult<String> {
        self.post_form(
            "v0/queries",
            &CreateWorksheet {
                action: "create",
                org_id: &self.organization_id,
                name,
                folder_id,
            },
        )
        .await
    }

    /// Replace the worksheet's draft text and execution context
    pub async fn update_worksheet(
        &self,
        worksheet_id: &str,
        query_text: &str,
        context: &ExecutionContext,
    ) -> SnowsightResult<String> {
        self.post_form(
            "v0/queries",
            &SaveDraft {
                action: "saveDraft",
                id: worksheet_id,
                project_id: worksheet_id,
                execution_context: serde_json::to_string(context)?,
                query: query_text,
            },
        )
        .await
    }

    pub async fn delete_worksheet(&self, worksheet_id: &str) -> SnowsightResult<String> {
        self.delete(&format!("v0/queries/{worksheet_id}")).await
    }

    /// Run `query_text` in the worksheet
    ///
    /// `param_refs` is passed through as is; `"[]"` when the query has no parameters.
    pub async fn execute_worksheet(
        &self,
        worksheet_id: &str,
        query_text: &str,
        param_refs: &str,
        context: &ExecutionContext,
    ) -> SnowsightResult<String> {
        self.post_form(
            "v0/queries",
            &Execute {
                action: "execute",
                project_id: worksheet_id,
                execution_context: serde_json::to_string(context)?,
                query: query_text,
                param_refs,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;
    use crate::tests::{client, form_pairs};

    fn context() -> ExecutionContext {
        ExecutionContext {
            role: "ANALYST".into(),
            warehouse: "WH".into(),
            database: "DB".into(),
            schema: "PUBLIC".into(),
        }
    }

    fn pairs<T: Serialize>(form: &T) -> Vec<(String, String)> {
        form_pairs(&serde_urlencoded::to_string(form).unwrap())
    }

    #[test]
    fn create_form() {
        let form = CreateWorksheet {
            action: "create",
            org_id: "123456",
            name: "Q&A \"draft\"",
            folder_id: None,
        };
        assert_eq!(
            pairs(&form),
            [
                ("action".to_owned(), "create".to_owned()),
                ("orgId".to_owned(), "123456".to_owned()),
                ("name".to_owned(), "Q&A \"draft\"".to_owned()),
            ]
        );
        let in_folder = CreateWorksheet {
            folder_id: Some("F1"),
            ..form
        };
        assert_eq!(pairs(&in_folder)[3], ("folderId".to_owned(), "F1".to_owned()));
    }

    #[test]
    fn execution_context_json() -> SnowsightResult<()> {
        assert_eq!(
            serde_json::to_string(&context())?,
            r#"{"role":"ANALYST","warehouse":"WH","database":"DB","schema":"PUBLIC"}"#
        );
        Ok(())
    }

    #[test]
    fn execute_form() -> SnowsightResult<()> {
        let form = Execute {
            action: "execute",
            project_id: "W1",
            execution_context: serde_json::to_string(&context())?,
            query: "SELECT 'a&b' = ?",
            param_refs: "[]",
        };
        let pairs = pairs(&form);
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            ["action", "projectId", "executionContext", "query", "paramRefs"]
        );
        assert_eq!(pairs[3].1, "SELECT 'a&b' = ?");
        Ok(())
    }

    #[tokio::test]
    async fn update_posts_draft() -> SnowsightResult<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v0/queries")
                    .header("cookie", "user-abc123=TOKENVALUE==")
                    .body_contains("action=saveDraft")
                    .body_contains("id=W1")
                    .body_contains("projectId=W1");
                then.status(200).body("{\"pid\":\"W1\"}");
            })
            .await;

        let body = client(&server.base_url())
            .update_worksheet("W1", "SELECT 1", &context())
            .await?;
        mock.assert_async().await;
        assert_eq!(body, "{\"pid\":\"W1\"}");
        Ok(())
    }

    #[tokio::test]
    async fn delete_by_id() -> SnowsightResult<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/v0/queries/W1");
                then.status(204);
            })
            .await;

        let body = client(&server.base_url()).delete_worksheet("W1").await?;
        mock.assert_async().await;
        assert_eq!(body, "");
        Ok(())
    }
}
