//! Connection profile models.
//!
//! A [`ConnectionProfile`] is the persisted descriptor of one database
//! instance. Its `type` tag stays a raw string so that profiles written by
//! older builds (or by hand) still load; [`DbType::from_name`] is the single
//! place where the tag is checked against the supported engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::{AppError, AppResult};

/// Supported database engines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// PostgreSQL.
    Postgres,
    /// Oracle Database; `database` is the service name.
    Oracle,
    /// Microsoft SQL Server.
    SqlServer,
    /// SQLite file; `database` holds the file path.
    SQLite,
}

impl DbType {
    /// Parses an engine tag, case-insensitively. Unknown tags return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(DbType::Postgres),
            "oracle" => Some(DbType::Oracle),
            "sqlserver" | "mssql" => Some(DbType::SqlServer),
            "sqlite" => Some(DbType::SQLite),
            _ => None,
        }
    }

    /// Returns the default port for this database type.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DbType::Postgres => Some(5432),
            DbType::Oracle => Some(1521),
            DbType::SqlServer => Some(1433),
            DbType::SQLite => None,
        }
    }

    /// Whether the engine is reached over the network (host/port/credentials).
    pub fn is_network(&self) -> bool {
        !matches!(self, DbType::SQLite)
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::Postgres => write!(f, "postgres"),
            DbType::Oracle => write!(f, "oracle"),
            DbType::SqlServer => write!(f, "sqlserver"),
            DbType::SQLite => write!(f, "sqlite"),
        }
    }
}

/// Stored connection profile, including credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    /// Opaque stable identifier.
    pub id: String,
    /// Display name, unique among profiles.
    pub name: String,
    /// Engine tag, see [`DbType`].
    #[serde(rename = "type")]
    pub db_type: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    /// Database name, or the file path for sqlite.
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// At most one stored profile is active.
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
}

impl ConnectionProfile {
    /// The engine named by `type`, if supported.
    pub fn engine(&self) -> Option<DbType> {
        DbType::from_name(&self.db_type)
    }
}

/// Request body for creating or replacing a connection profile.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionRequest {
    /// Connection display name.
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    /// Engine tag (postgres, oracle, sqlserver, sqlite).
    #[serde(rename = "type")]
    pub db_type: String,
    /// Database host (required for network engines).
    pub host: Option<String>,
    /// Database port (uses the engine default if not specified).
    pub port: Option<u16>,
    /// Database name, or the sqlite file path.
    #[validate(length(min = 1, message = "Database is required"))]
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CreateConnectionRequest {
    /// Validates the request and resolves its engine.
    ///
    /// Network engines need a host, a username and a resolvable port; sqlite
    /// only needs the file path in `database`.
    pub fn check(&self) -> AppResult<DbType> {
        self.validate()?;
        let db_type = DbType::from_name(&self.db_type)
            .ok_or_else(|| AppError::UnsupportedDatabaseType(self.db_type.clone()))?;

        if db_type.is_network() {
            if is_blank(&self.host) {
                return Err(AppError::Validation(format!("{db_type} requires host")));
            }
            if is_blank(&self.username) {
                return Err(AppError::Validation(format!("{db_type} requires username")));
            }
            if self.port == Some(0) {
                return Err(AppError::Validation("port must be between 1 and 65535".into()));
            }
        }
        Ok(db_type)
    }

    /// Builds a fresh, inactive profile.
    pub fn into_profile(self, db_type: DbType, id: String, now: DateTime<Utc>) -> ConnectionProfile {
        let mut profile = ConnectionProfile {
            id,
            name: String::new(),
            db_type: db_type.to_string(),
            host: String::new(),
            port: 0,
            database: String::new(),
            username: String::new(),
            password: String::new(),
            is_active: false,
            created_at: now,
            updated_at: None,
            activated_at: None,
        };
        self.apply_to(db_type, &mut profile);
        profile
    }

    /// Overwrites the descriptive fields of `profile`, leaving id, activation
    /// state and timestamps untouched.
    pub fn apply_to(self, db_type: DbType, profile: &mut ConnectionProfile) {
        profile.name = self.name.trim().to_string();
        profile.db_type = db_type.to_string();
        profile.port = self.port.or_else(|| db_type.default_port()).unwrap_or(0);
        profile.host = self.host.unwrap_or_default().trim().to_string();
        profile.database = self.database;
        profile.username = self.username.unwrap_or_default();
        profile.password = self.password.unwrap_or_default();
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Connection item for API responses (excludes the password).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub db_type: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
}

impl From<ConnectionProfile> for ConnectionItem {
    fn from(profile: ConnectionProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            db_type: profile.db_type,
            host: profile.host,
            port: profile.port,
            database: profile.database,
            username: profile.username,
            is_active: profile.is_active,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            activated_at: profile.activated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(db_type: &str) -> CreateConnectionRequest {
        CreateConnectionRequest {
            name: "reporting".into(),
            db_type: db_type.into(),
            host: Some("db.internal".into()),
            port: None,
            database: "sales".into(),
            username: Some("report".into()),
            password: Some("secret".into()),
        }
    }

    #[test]
    fn test_db_type_aliases() {
        assert_eq!(DbType::from_name("PostgreSQL"), Some(DbType::Postgres));
        assert_eq!(DbType::from_name("mssql"), Some(DbType::SqlServer));
        assert_eq!(DbType::from_name("sqlite"), Some(DbType::SQLite));
        assert_eq!(DbType::from_name("Oracle"), Some(DbType::Oracle));
        assert_eq!(DbType::from_name("mysql"), None);
        assert_eq!(DbType::Oracle.default_port(), Some(1521));
    }

    #[test]
    fn test_profile_uses_camel_case_and_type_key() {
        let profile = request("postgres").into_profile(DbType::Postgres, "p1".into(), Utc::now());
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["type"], "postgres");
        assert_eq!(json["isActive"], false);
        assert_eq!(json["port"], 5432);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("activatedAt").is_none());
    }

    #[test]
    fn test_unknown_type_survives_deserialization() {
        let raw = r#"{"id":"1","name":"legacy","type":"db2","host":"h","port":50000,
            "database":"SAMPLE","username":"u","password":"p","isActive":true,
            "createdAt":"2024-01-01T00:00:00Z"}"#;
        let profile: ConnectionProfile = serde_json::from_str(raw).unwrap();
        assert!(profile.is_active);
        assert_eq!(profile.engine(), None);
    }

    #[test]
    fn test_check_rejects_unsupported_and_missing_fields() {
        assert!(matches!(
            request("db2").check(),
            Err(AppError::UnsupportedDatabaseType(_))
        ));

        let mut no_host = request("oracle");
        no_host.host = Some("  ".into());
        assert!(matches!(no_host.check(), Err(AppError::Validation(_))));

        let mut sqlite = request("sqlite");
        sqlite.host = None;
        sqlite.username = None;
        assert_eq!(sqlite.check().unwrap(), DbType::SQLite);
    }

    #[test]
    fn test_item_hides_password() {
        let profile = request("oracle").into_profile(DbType::Oracle, "p2".into(), Utc::now());
        let json = serde_json::to_value(ConnectionItem::from(profile)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["type"], "oracle");
        assert_eq!(json["port"], 1521);
    }
}
