use crate::errors::SnowsightResult;
use crate::SnowsightClient;

const MONITORING: &str = "v0/session/request/monitoring";

impl SnowsightClient {
    /// Status, timings and result metadata of a query, seen as `role`
    pub async fn query_details(&self, query_id: &str, role: &str) -> SnowsightResult<String> {
        self.get(
            &format!("{MONITORING}/queries/{query_id}?max=1001"),
            &self.context().with_role(role),
        )
        .await
    }

    /// The query plan and per-operator statistics of a query, seen as `role`
    ///
    /// `retry_attempt` selects one attempt of a query Snowflake retried; `None` returns the latest.
    pub async fn query_profile(
        &self,
        query_id: &str,
        role: &str,
        retry_attempt: Option<u32>,
    ) -> SnowsightResult<String> {
        let path = match retry_attempt {
            Some(rank) => format!("{MONITORING}/query-plan-data/{query_id}?jobRetryAttemptRank={rank}"),
            None => format!("{MONITORING}/query-plan-data/{query_id}"),
        };
        self.get(&path, &self.context().with_role(role)).await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;
    use crate::tests::client;

    #[tokio::test]
    async fn details_use_role() -> SnowsightResult<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v0/session/request/monitoring/queries/01ab-cd")
                    .query_param("max", "1001")
                    .header("x-snowflake-role", "ACCOUNTADMIN")
                    .header("x-snowflake-context", "ME::https://xyz.snowflakecomputing.com");
                then.status(200).body("{\"queries\":[]}");
            })
            .await;

        let body = client(&server.base_url())
            .query_details("01ab-cd", "ACCOUNTADMIN")
            .await?;
        mock.assert_async().await;
        assert_eq!(body, "{\"queries\":[]}");
        Ok(())
    }

    #[tokio::test]
    async fn profile_of_retry() -> SnowsightResult<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v0/session/request/monitoring/query-plan-data/01ab-cd")
                    .query_param("jobRetryAttemptRank", "2");
                then.status(200).body("retry");
            })
            .await;

        let body = client(&server.base_url())
            .query_profile("01ab-cd", "SYSADMIN", Some(2))
            .await?;
        mock.assert_async().await;
        assert_eq!(body, "retry");
        Ok(())
    }

    #[tokio::test]
    async fn latest_profile() -> SnowsightResult<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v0/session/request/monitoring/query-plan-data/01ab-cd")
                    .header("x-snowflake-role", "SYSADMIN");
                then.status(200).body("plan");
            })
            .await;

        let body = client(&server.base_url())
            .query_profile("01ab-cd", "SYSADMIN", None)
            .await?;
        mock.assert_async().await;
        assert_eq!(body, "plan");
        Ok(())
    }
}
