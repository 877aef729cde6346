use serde::Serialize;

use crate::entities::EntityKind;
use crate::errors::SnowsightResult;
use crate::SnowsightClient;

/// How a worksheet is rendered inside a dashboard cell
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Table,
    Chart,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct DashboardCell<'a> {
    pid: &'a str,
    display_mode: DisplayMode,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl<'a> DashboardCell<'a> {
    fn worksheet(worksheet_id: &'a str, display_mode: DisplayMode) -> Self {
        DashboardCell {
            pid: worksheet_id,
            display_mode,
            kind: "query",
        }
    }
}

#[derive(Serialize, Debug)]
struct DashboardRow<'a> {
    height: u32,
    cells: [DashboardCell<'a>; 1],
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TransformParams<'a> {
    pid: &'a str,
    row_idx: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cell_idx: Option<u32>,
    row: DashboardRow<'a>,
    cell: DashboardCell<'a>,
}

/// One step of a `transformDashboard` call
#[derive(Serialize, Debug)]
struct Transform<'a> {
    action: &'static str,
    params: TransformParams<'a>,
}

impl<'a> Transform<'a> {
    fn place(
        worksheet_id: &'a str,
        display_mode: DisplayMode,
        row_index: u32,
        row_height: u32,
        cell_index: Option<u32>,
    ) -> Self {
        let cell = DashboardCell::worksheet(worksheet_id, display_mode);
        Transform {
            action: if cell_index.is_some() {
                "insertCell"
            } else {
                "insertRow"
            },
            params: TransformParams {
                pid: worksheet_id,
                row_idx: row_index,
                cell_idx: cell_index,
                row: DashboardRow {
                    height: row_height,
                    cells: [cell.clone()],
                },
                cell,
            },
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateDashboard<'a> {
    org_id: &'a str,
    name: &'a str,
    role: &'a str,
    warehouse: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    visibility: &'static str,
}

impl SnowsightClient {
    pub async fn dashboards(&self) -> SnowsightResult<String> {
        self.list_entities(EntityKind::Dashboard).await
    }

    pub async fn dashboard(&self, dashboard_id: &str) -> SnowsightResult<String> {
        self.get(&format!("v0/folders/{dashboard_id}"), &self.context())
            .await
    }

    /// Create an empty dashboard visible to the whole organization
    pub async fn create_dashboard(
        &self,
        name: &str,
        role: &str,
        warehouse: &str,
    ) -> SnowsightResult<String> {
        self.post_form(
            "v0/folders",
            &CreateDashboard {
                org_id: &self.organization_id,
                name,
                role,
                warehouse,
                kind: "dashboard",
                visibility: "organization",
            },
        )
        .await
    }

    /// Add a new row at `row_index` holding a single worksheet cell
    pub async fn insert_dashboard_row(
        &self,
        dashboard_id: &str,
        worksheet_id: &str,
        display_mode: DisplayMode,
        row_index: u32,
        row_height: u32,
    ) -> SnowsightResult<String> {
        self.transform_dashboard(
            dashboard_id,
            Transform::place(worksheet_id, display_mode, row_index, row_height, None),
        )
        .await
    }

    /// Add a worksheet cell at `cell_index` of an existing row
    pub async fn insert_dashboard_cell(
        &self,
        dashboard_id: &str,
        worksheet_id: &str,
        display_mode: DisplayMode,
        row_index: u32,
        row_height: u32,
        cell_index: u32,
    ) -> SnowsightResult<String> {
        self.transform_dashboard(
            dashboard_id,
            Transform::place(
                worksheet_id,
                display_mode,
                row_index,
                row_height,
                Some(cell_index),
            ),
        )
        .await
    }

    async fn transform_dashboard(
        &self,
        dashboard_id: &str,
        transform: Transform<'_>,
    ) -> SnowsightResult<String> {
        let transforms = serde_json::to_string(&[transform])?;
        self.post_form(
            &format!("v0/folders/{dashboard_id}"),
            &[
                ("action", "transformDashboard"),
                ("transforms", transforms.as_str()),
            ],
        )
        .await
    }

    pub async fn delete_dashboard(&self, dashboard_id: &str) -> SnowsightResult<String> {
        self.delete(&format!("v0/folders/{dashboard_id}")).await
    }

    /// Refresh every cell of the dashboard
    pub async fn execute_dashboard(&self, dashboard_id: &str) -> SnowsightResult<String> {
        self.post_form(
            &format!("v0/folders/{dashboard_id}"),
            &[("action", "refresh"), ("drafts", "{}")],
        )
        .await
    }
}
