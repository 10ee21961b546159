use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub birth_date: NaiveDate,
    pub can_be_contacted: bool,
    pub can_data_be_shared: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ProjectType {
    #[serde(rename = "back-end")]
    #[sqlx(rename = "back-end")]
    BackEnd,
    #[serde(rename = "front-end")]
    #[sqlx(rename = "front-end")]
    FrontEnd,
    #[serde(rename = "iOS")]
    #[sqlx(rename = "iOS")]
    Ios,
    #[serde(rename = "Android")]
    #[sqlx(rename = "Android")]
    Android,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub project_type: ProjectType,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contributor {
    pub project_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum IssueStatus {
    #[serde(rename = "To Do")]
    #[sqlx(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Finished")]
    #[sqlx(rename = "Finished")]
    Finished,
}

impl Default for IssueStatus {
    fn default() -> Self {
        Self::ToDo
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum IssuePriority {
    #[serde(rename = "Low")]
    #[sqlx(rename = "Low")]
    Low,
    #[serde(rename = "Medium")]
    #[sqlx(rename = "Medium")]
    Medium,
    #[serde(rename = "High")]
    #[sqlx(rename = "High")]
    High,
}

impl Default for IssuePriority {
    fn default() -> Self {
        Self::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum IssueNature {
    #[serde(rename = "Bug")]
    #[sqlx(rename = "Bug")]
    Bug,
    #[serde(rename = "Feature")]
    #[sqlx(rename = "Feature")]
    Feature,
    #[serde(rename = "Task")]
    #[sqlx(rename = "Task")]
    Task,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issue {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub nature: IssueNature,
    pub author_id: String,
    pub assigned_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub issue_id: String,
    pub author_id: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
