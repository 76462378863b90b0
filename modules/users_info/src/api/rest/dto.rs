use serde::{Deserialize, Serialize};

use crate::contract::model::{NewUser, UserInfo, UserPage, UserRecord};

/// REST DTO for one listed user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoDto {
    pub id: u64,
    pub username: String,
    pub say_hello: String,
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

/// REST DTO for the user list response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserListDto {
    pub total_count: u64,
    pub user_list: Vec<UserInfoDto>,
}

/// REST DTO for query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub offset: u64,
    pub limit: Option<u64>,
}

/// REST DTO for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserReq {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// REST DTO for the create response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateUserResp {
    pub username: String,
}

// Conversion implementations between REST DTOs and contract models

impl From<UserInfo> for UserInfoDto {
    fn from(u: UserInfo) -> Self {
        Self {
            id: u.id,
            username: u.username,
            say_hello: u.say_hello,
            password: u.password,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<UserPage> for UserListDto {
    fn from(page: UserPage) -> Self {
        Self {
            total_count: page.total_count,
            user_list: page.items.into_iter().map(UserInfoDto::from).collect(),
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            username: req.username,
            password: req.password,
        }
    }
}

impl From<UserRecord> for CreateUserResp {
    fn from(user: UserRecord) -> Self {
        Self {
            username: user.username,
        }
    }
}
