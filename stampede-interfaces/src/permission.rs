//! Permission checking interface
//!
//! The engine trusts that its caller has already authorized an operation.
//! These types let an outer API layer perform that check uniformly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Permissions relevant to load testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Start and stop load tests
    SystemAdmin,
    /// Read live status and stored results
    ViewAnalytics,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::SystemAdmin => write!(f, "system:admin"),
            Permission::ViewAnalytics => write!(f, "analytics:view"),
        }
    }
}

/// Operations of the engine's query surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOperation {
    Start,
    Stop,
    Status,
    List,
    Result,
}

impl EngineOperation {
    /// Permission a caller must hold before invoking this operation
    pub fn required_permission(&self) -> Permission {
        match self {
            EngineOperation::Start | EngineOperation::Stop => Permission::SystemAdmin,
            EngineOperation::Status | EngineOperation::List | EngineOperation::Result => {
                Permission::ViewAnalytics
            }
        }
    }
}

/// Permission check failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("user {user_id} lacks permission {permission}")]
    Denied { user_id: i64, permission: Permission },

    #[error("failed to check permissions: {0}")]
    CheckFailed(String),
}

/// Authorization collaborator
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn check_permission(
        &self,
        user_id: i64,
        permission: Permission,
    ) -> Result<bool, PermissionError>;
}

/// Check that `user_id` may perform `operation`, turning a `false` into `Denied`
pub async fn require_permission(
    checker: &dyn PermissionChecker,
    user_id: i64,
    operation: EngineOperation,
) -> Result<(), PermissionError> {
    let permission = operation.required_permission();
    if checker.check_permission(user_id, permission).await? {
        Ok(())
    } else {
        Err(PermissionError::Denied { user_id, permission })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AdminOnly;

    #[async_trait]
    impl PermissionChecker for AdminOnly {
        async fn check_permission(
            &self,
            user_id: i64,
            permission: Permission,
        ) -> Result<bool, PermissionError> {
            match user_id {
                1 => Ok(true),
                2 => Ok(permission == Permission::ViewAnalytics),
                _ => Err(PermissionError::CheckFailed("unknown user".to_string())),
            }
        }
    }

    #[test]
    fn test_operation_permissions() {
        assert_eq!(EngineOperation::Start.required_permission(), Permission::SystemAdmin);
        assert_eq!(EngineOperation::Stop.required_permission(), Permission::SystemAdmin);
        assert_eq!(EngineOperation::Status.required_permission(), Permission::ViewAnalytics);
        assert_eq!(EngineOperation::List.required_permission(), Permission::ViewAnalytics);
        assert_eq!(EngineOperation::Result.required_permission(), Permission::ViewAnalytics);
    }

    #[tokio::test]
    async fn test_require_permission() {
        let checker = AdminOnly;

        assert!(require_permission(&checker, 1, EngineOperation::Start).await.is_ok());
        assert!(require_permission(&checker, 2, EngineOperation::Status).await.is_ok());

        let denied = require_permission(&checker, 2, EngineOperation::Stop).await;
        assert_eq!(
            denied,
            Err(PermissionError::Denied {
                user_id: 2,
                permission: Permission::SystemAdmin
            })
        );

        let failed = require_permission(&checker, 99, EngineOperation::List).await;
        assert!(matches!(failed, Err(PermissionError::CheckFailed(_))));
    }
}
