use chrono::{DateTime, Utc};

/// Wire format of the reformatted timestamps in [`UserInfo`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stored user account as returned by the record source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List entry: one [`UserRecord`] plus its generated greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: u64,
    pub username: String,
    pub say_hello: String,
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserInfo {
    pub fn enrich(record: UserRecord, token: &str) -> Self {
        Self {
            id: record.id,
            username: record.username,
            say_hello: format!("Hello {token}"),
            password: record.password,
            created_at: record.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: record.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// One page of enriched users, in record-source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPage {
    /// Matching users ignoring offset/limit.
    pub total_count: u64,
    pub items: Vec<UserInfo>,
}

/// Data for creating a new user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn enrich_formats_greeting_and_timestamps() {
        let record = UserRecord {
            id: 7,
            username: "admin".into(),
            password: "secret".into(),
            created_at: Utc.with_ymd_and_hms(2023, 11, 14, 9, 5, 3).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 59).unwrap(),
        };

        let info = UserInfo::enrich(record, "kP3_x-9aZ");

        assert_eq!(info.id, 7);
        assert_eq!(info.username, "admin");
        assert_eq!(info.say_hello, "Hello kP3_x-9aZ");
        assert_eq!(info.password, "secret");
        assert_eq!(info.created_at, "2023-11-14 09:05:03");
        assert_eq!(info.updated_at, "2024-01-02 23:59:59");
    }
}
