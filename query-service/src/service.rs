//! 查询执行服务模块

use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::{ExportRequest, QueryRequest, QueryResult, TableSchema};
use common::utils::SqlValidator;
use engine::QueryGateway;
use validator::Validate;

use crate::client::ProfileClient;
use crate::export;

/// SQL 查询执行服务
///
/// Resolves the active profile on every call, so activating another
/// connection takes effect on the next request.
pub struct QueryService {
    profiles: ProfileClient,
    gateway: Arc<QueryGateway>,
}

impl QueryService {
    /// 创建新的查询服务实例
    pub fn new(profiles: ProfileClient, gateway: Arc<QueryGateway>) -> Self {
        Self { profiles, gateway }
    }

    /// 执行只读 SQL 查询
    pub async fn execute(&self, req: QueryRequest) -> AppResult<QueryResult> {
        req.validate()?;
        SqlValidator::validate_read_only(&req.sql)?;

        let active = self.profiles.active_profile().await?;
        let result = self
            .gateway
            .query(active.as_ref(), &req.sql, &req.params)
            .await?;
        tracing::info!(
            rows = result.row_count,
            elapsed_ms = result.execution_time_ms,
            "查询执行完成"
        );
        Ok(result)
    }

    /// 执行查询并导出为 xlsx，返回安全文件名与文件内容
    pub async fn export(&self, req: ExportRequest) -> AppResult<(String, Vec<u8>)> {
        req.validate()?;
        SqlValidator::validate_read_only(&req.sql)?;

        let active = self.profiles.active_profile().await?;
        let result = self
            .gateway
            .query(active.as_ref(), &req.sql, &req.params)
            .await?;
        if result.rows.is_empty() {
            return Err(AppError::NoData);
        }

        let bytes = export::workbook(&result).map_err(|e| AppError::Export(e.to_string()))?;
        let filename = export::safe_filename(&req.filename);
        tracing::info!(rows = result.row_count, file = %filename, size = bytes.len(), "导出完成");
        Ok((filename, bytes))
    }

    /// 列出活动连接下的所有表
    pub async fn list_tables(&self) -> AppResult<Vec<String>> {
        let active = self.profiles.active_profile().await?;
        Ok(self.gateway.list_tables(active.as_ref()).await?)
    }

    /// 获取表结构
    pub async fn describe_table(&self, table: &str) -> AppResult<TableSchema> {
        let active = self.profiles.active_profile().await?;
        let columns = self.gateway.describe_table(active.as_ref(), table).await?;
        Ok(TableSchema {
            table_name: table.to_string(),
            columns,
        })
    }
}
