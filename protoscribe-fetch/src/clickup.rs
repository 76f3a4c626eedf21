use crate::error::Result;
use crate::figma::ensure_success;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const CLICKUP_API_URL: &str = "https://api.clickup.com/api/v2";

const DESIGN_EXTENSIONS: [&str; 7] = [".fig", ".png", ".jpg", ".svg", ".pdf", ".doc", ".docx"];

static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@[\w\-\.]+").expect("valid mention regex"));

/// A ticket reduced to what the story needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskTicket {
    pub task_id: String,
    pub title: String,
    pub description_part1: String,
    pub business_case: String,
    pub assignees: Vec<String>,
    pub figma_link: Option<String>,
    pub attachments: Vec<Attachment>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub is_design_file: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub user: String,
    pub content: String,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTask {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    assignees: Vec<RawUser>,
    #[serde(default)]
    custom_fields: Vec<RawCustomField>,
    #[serde(default)]
    attachments: Vec<RawAttachment>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUser {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCustomField {
    name: Option<String>,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct RawAttachment {
    id: Option<String>,
    title: Option<String>,
    extension: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCommentPage {
    #[serde(default)]
    comments: Vec<RawComment>,
    #[serde(default)]
    next_page: Value,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    #[serde(default)]
    comment_text: Value,
    #[serde(default)]
    user: RawUser,
    #[serde(default)]
    date: Value,
}

/// Reads tasks and their comment threads from ClickUp.
#[derive(Debug, Clone)]
pub struct TaskClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TaskClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("Protoscribe/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            base_url: CLICKUP_API_URL.to_string(),
            token: token.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch a task with attachments and cleaned, date-ordered comments.
    ///
    /// Returns `Ok(None)` when the task endpoint answers with a non-success status.
    pub async fn fetch_task(&self, task_id: &str) -> Result<Option<TaskTicket>> {
        let Some(task) = self.get_task(task_id).await? else {
            warn!("ClickUp task {} could not be fetched", task_id);
            return Ok(None);
        };

        let description = task.description.unwrap_or_default();
        let (description_part1, business_case) = split_business_case(&description);

        let comments = self
            .get_comments(task_id)
            .await?
            .into_iter()
            .filter_map(|c| {
                let content = remove_mentions(&c.content);
                (!content.is_empty()).then_some(Comment { content, ..c })
            })
            .collect::<Vec<_>>();

        let ticket = TaskTicket {
            task_id: task_id.to_string(),
            title: task.name,
            description_part1,
            business_case,
            assignees: task
                .assignees
                .into_iter()
                .map(|a| a.username.unwrap_or_else(|| "Unknown".to_string()))
                .collect(),
            figma_link: find_figma_link(&task.custom_fields),
            attachments: task.attachments.into_iter().map(convert_attachment).collect(),
            comments,
        };

        info!(
            "Fetched ClickUp task {} with {} comments",
            task_id,
            ticket.comments.len()
        );
        Ok(Some(ticket))
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<RawTask>> {
        let url = format!("{}/task/{}", self.base_url, task_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.token)
            .query(&[("include_comments", "true"), ("attachments", "true")])
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("Task request returned {}", response.status());
            return Ok(None);
        }

        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Walk every comment page. A failing page ends the walk with what was collected so far.
    async fn get_comments(&self, task_id: &str) -> Result<Vec<Comment>> {
        let url = format!("{}/task/{}/comment", self.base_url, task_id);
        let mut comments = Vec::new();
        let mut next_page: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).header("Authorization", &self.token);
            if let Some(ref page) = next_page {
                request = request.query(&[("page", page.as_str())]);
            }

            let page = match ensure_success(request.send().await?).await {
                Ok(response) => {
                    let body = response.text().await?;
                    serde_json::from_str::<RawCommentPage>(&body)?
                }
                Err(e) => {
                    warn!("Stopping comment pagination for {}: {}", task_id, e);
                    break;
                }
            };

            comments.extend(page.comments.into_iter().map(|c| Comment {
                user: c.user.username.unwrap_or_else(|| "Unknown".to_string()),
                content: comment_text(&c.comment_text),
                date: value_to_string(&c.date),
            }));

            next_page = value_to_string(&page.next_page);
            if next_page.is_none() {
                break;
            }
        }

        comments.sort_by_key(|c| {
            c.date
                .as_deref()
                .and_then(|d| d.parse::<i64>().ok())
                .unwrap_or(0)
        });
        Ok(comments)
    }
}

/// Split a description at the first "Business Case" marker.
pub fn split_business_case(description: &str) -> (String, String) {
    match description.split_once("Business Case") {
        Some((head, tail)) => (head.trim().to_string(), tail.trim().to_string()),
        None => (description.trim().to_string(), String::new()),
    }
}

pub fn remove_mentions(text: &str) -> String {
    MENTION.replace_all(text, "").trim().to_string()
}

fn comment_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string(),
        _ => String::new(),
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn find_figma_link(fields: &[RawCustomField]) -> Option<String> {
    fields
        .iter()
        .filter(|f| {
            f.name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains("figma"))
        })
        .find_map(|f| {
            let value = match &f.value {
                Value::Object(map) => map.get("url").and_then(Value::as_str),
                Value::String(s) => Some(s.as_str()),
                _ => None,
            };
            value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
        })
}

fn convert_attachment(raw: RawAttachment) -> Attachment {
    let name = raw.title.unwrap_or_else(|| "Unnamed".to_string());
    let url = raw.url.filter(|u| !u.is_empty()).unwrap_or_else(|| {
        format!(
            "https://app.clickup.com/attachment/{}",
            raw.id.unwrap_or_default()
        )
    });
    let lowered = name.to_lowercase();

    Attachment {
        is_design_file: DESIGN_EXTENSIONS.iter().any(|ext| lowered.contains(ext)),
        kind: raw.extension.unwrap_or_else(|| "unknown".to_string()),
        name,
        url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, query_param, query_param_is_missing},
    };

    #[test]
    fn test_split_business_case() {
        let (head, tail) = split_business_case("Add export.\nBusiness Case\nSaves time.");
        assert_eq!(head, "Add export.");
        assert_eq!(tail, "Saves time.");

        let (head, tail) = split_business_case("  Only a description ");
        assert_eq!(head, "Only a description");
        assert_eq!(tail, "");
    }

    #[test]
    fn test_remove_mentions() {
        assert_eq!(remove_mentions("@jane.doe please check"), "please check");
        assert_eq!(remove_mentions("@qa-team"), "");
    }

    #[test]
    fn test_comment_text_rich_parts() {
        let value = json!([{"text": "Looks"}, {"text": "good"}, "stray"]);
        assert_eq!(comment_text(&value), "Looks good");
    }

    #[test]
    fn test_find_figma_link_object_value() {
        let fields = vec![
            RawCustomField {
                name: Some("Priority".to_string()),
                value: json!("https://not-this"),
            },
            RawCustomField {
                name: Some("Figma Design".to_string()),
                value: json!({"url": " https://figma.com/file/abc "}),
            },
        ];
        assert_eq!(
            find_figma_link(&fields),
            Some("https://figma.com/file/abc".to_string())
        );
    }

    #[test]
    fn test_convert_attachment_fallback_url() {
        let attachment = convert_attachment(RawAttachment {
            id: Some("att1".to_string()),
            title: Some("Mockup.PNG".to_string()),
            extension: None,
            url: None,
        });
        assert_eq!(attachment.url, "https://app.clickup.com/attachment/att1");
        assert_eq!(attachment.kind, "unknown");
        assert!(attachment.is_design_file);
    }

    #[tokio::test]
    async fn test_fetch_task_with_paginated_comments() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/task/abc"))
            .and(header("Authorization", "cu-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Export invoices",
                "description": "Users export invoices.\nBusiness Case\nFinance needs CSV.",
                "assignees": [{"username": "sam"}],
                "custom_fields": [{"name": "figma", "value": "https://figma.com/file/x"}],
                "attachments": []
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/task/abc/comment"))
            .and(query_param_is_missing("page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "comments": [
                    {"comment_text": "@sam second", "user": {"username": "kim"}, "date": "2000"},
                    {"comment_text": "@sam", "user": {"username": "kim"}, "date": "1500"}
                ],
                "next_page": "2"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/task/abc/comment"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "comments": [
                    {"comment_text": [{"text": "first"}], "user": {"username": "lee"}, "date": "1000"}
                ]
            })))
            .mount(&server)
            .await;

        let client = TaskClient::new("cu-token")
            .unwrap()
            .with_base_url(server.uri());
        let ticket = client.fetch_task("abc").await.unwrap().unwrap();

        assert_eq!(ticket.title, "Export invoices");
        assert_eq!(ticket.description_part1, "Users export invoices.");
        assert_eq!(ticket.business_case, "Finance needs CSV.");
        assert_eq!(ticket.assignees, vec!["sam".to_string()]);
        assert_eq!(ticket.figma_link.as_deref(), Some("https://figma.com/file/x"));

        let contents: Vec<&str> = ticket.comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_fetch_task_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/task/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = TaskClient::new("cu-token")
            .unwrap()
            .with_base_url(server.uri());
        assert!(client.fetch_task("missing").await.unwrap().is_none());
    }
}
