use serde::Serialize;

use crate::errors::SnowsightResult;
use crate::SnowsightClient;

/// The kinds of entity the Snowsight entity list can return
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A worksheet
    Query,
    Dashboard,
    Folder,
}

#[derive(Serialize, Debug)]
struct Sort {
    col: &'static str,
    dir: &'static str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ListOptions {
    sort: Sort,
    limit: u32,
    owner: Option<String>,
    types: [EntityKind; 1],
    show_never_viewed: &'static str,
}

impl ListOptions {
    /// Up to 1000 entities of one kind, most recently viewed first
    fn recently_viewed(kind: EntityKind) -> ListOptions {
        ListOptions {
            sort: Sort {
                col: "viewed",
                dir: "desc",
            },
            limit: 1000,
            owner: None,
            types: [kind],
            show_never_viewed: "if-invited",
        }
    }
}

impl SnowsightClient {
    /// List the organization's entities of one kind
    pub async fn list_entities(&self, kind: EntityKind) -> SnowsightResult<String> {
        let options = serde_json::to_string(&ListOptions::recently_viewed(kind))?;
        self.post_form(
            &format!("v0/organizations/{}/entities/list", self.organization_id),
            &[("options", options.as_str()), ("location", "worksheets")],
        )
        .await
    }

    pub async fn folders(&self) -> SnowsightResult<String> {
        self.list_entities(EntityKind::Folder).await
    }
}
