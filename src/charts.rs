use crate::errors::SnowsightResult;
use crate::SnowsightClient;

impl SnowsightClient {
    pub async fn chart(&self, worksheet_id: &str, chart_id: &str) -> SnowsightResult<String> {
        self.get(
            &format!("v0/queries/{worksheet_id}/charts/{chart_id}"),
            &self.context(),
        )
        .await
    }

    /// Attach a chart to a worksheet
    ///
    /// `configuration` is the chart definition Snowsight stores, e.g.
    /// `{"type":"line","source":"sources/query","primary":[...],"secondary":{...},"version":1}`.
    pub async fn create_chart_from_worksheet(
        &self,
        worksheet_id: &str,
        configuration: &serde_json::Value,
    ) -> SnowsightResult<String> {
        let chart = serde_json::to_string(configuration)?;
        self.post_form(
            &format!("v0/queries/{worksheet_id}/charts"),
            &[("chart", chart.as_str())],
        )
        .await
    }
}
