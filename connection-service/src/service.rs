//! 连接管理服务模块

use std::sync::Arc;

use async_trait::async_trait;
use common::errors::AppResult;
use common::models::{ConnectionItem, ConnectionProfile, CreateConnectionRequest};
use engine::{ConnectionCheck, QueryGateway};

use crate::store::ProfileStore;

/// 连接服务 Trait
#[async_trait]
pub trait ConnectionServiceTrait: Send + Sync {
    /// 列出所有连接
    async fn list(&self) -> AppResult<Vec<ConnectionItem>>;

    /// 创建新连接
    async fn create(&self, req: CreateConnectionRequest) -> AppResult<ConnectionItem>;

    /// 根据 ID 获取连接
    async fn get(&self, id: &str) -> AppResult<ConnectionItem>;

    /// 更新连接
    async fn update(&self, id: &str, req: CreateConnectionRequest) -> AppResult<ConnectionItem>;

    /// 根据 ID 删除连接
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// 测试连接
    async fn test(&self, id: &str) -> AppResult<ConnectionCheck>;

    /// 设为当前活动连接
    async fn activate(&self, id: &str) -> AppResult<ConnectionItem>;

    /// 当前活动连接（含密码，仅供内部调用）
    async fn active(&self) -> AppResult<Option<ConnectionProfile>>;
}

/// 连接配置管理服务
pub struct ConnectionService {
    store: Arc<ProfileStore>,
    gateway: Arc<QueryGateway>,
}

impl ConnectionService {
    /// 创建新的连接服务实例
    pub fn new(store: Arc<ProfileStore>, gateway: Arc<QueryGateway>) -> Self {
        Self { store, gateway }
    }
}

#[async_trait]
impl ConnectionServiceTrait for ConnectionService {
    async fn list(&self) -> AppResult<Vec<ConnectionItem>> {
        Ok(self
            .store
            .load_profiles()
            .await?
            .into_iter()
            .map(ConnectionItem::from)
            .collect())
    }

    async fn create(&self, req: CreateConnectionRequest) -> AppResult<ConnectionItem> {
        let profile = self.store.create(req).await?;
        tracing::info!(id = %profile.id, name = %profile.name, db_type = %profile.db_type, "连接已创建");
        Ok(ConnectionItem::from(profile))
    }

    async fn get(&self, id: &str) -> AppResult<ConnectionItem> {
        self.store.get(id).await.map(ConnectionItem::from)
    }

    async fn update(&self, id: &str, req: CreateConnectionRequest) -> AppResult<ConnectionItem> {
        let profile = self.store.update(id, req).await?;
        tracing::info!(id = %id, name = %profile.name, "连接已更新");
        Ok(ConnectionItem::from(profile))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.store.delete(id).await?;
        tracing::info!(id = %id, "连接已删除");
        Ok(())
    }

    async fn test(&self, id: &str) -> AppResult<ConnectionCheck> {
        let profile = self.store.get(id).await?;
        Ok(self.gateway.test_connection(&profile).await)
    }

    async fn activate(&self, id: &str) -> AppResult<ConnectionItem> {
        let profile = self.store.activate(id).await?;
        tracing::info!(id = %id, name = %profile.name, "连接已激活");
        Ok(ConnectionItem::from(profile))
    }

    async fn active(&self) -> AppResult<Option<ConnectionProfile>> {
        self.store.active_profile().await
    }
}
