use crate::server::{text_content, tool_error, ProviderHandler};
use agent_mcp::protocol::{error_codes, RpcErrorBody, ToolDescriptor};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A stored post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ContentStore {
    posts: Vec<Post>,
    tags: Vec<String>,
    next_id: u64,
}

/// Built-in content-management provider: posts and tags over an in-memory
/// store, with posts also exposed as readable resources (`post://{id}`).
///
/// The store is shared behind an Arc so a caller that built the provider can
/// still observe mutations made through the session.
#[derive(Clone, Default)]
pub struct ContentProvider {
    store: Arc<RwLock<ContentStore>>,
}

impl ContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn posts(&self) -> Vec<Post> {
        self.store.read().await.posts.clone()
    }

    pub async fn tags(&self) -> Vec<String> {
        self.store.read().await.tags.clone()
    }

    async fn create_post(
        &self,
        title: String,
        body: String,
        tags: Vec<String>,
    ) -> Result<Value, RpcErrorBody> {
        let mut store = self.store.write().await;
        store.next_id += 1;
        let post = Post {
            id: store.next_id,
            title,
            body,
            tags: tags.clone(),
            created_at: Utc::now(),
        };
        for tag in tags {
            if !store.tags.contains(&tag) {
                store.tags.push(tag);
            }
        }
        let summary = format!("Created post {}: {}", post.id, post.title);
        store.posts.push(post);
        Ok(text_content(summary))
    }

    async fn list_posts(&self) -> Result<Value, RpcErrorBody> {
        let store = self.store.read().await;
        if store.posts.is_empty() {
            return Ok(text_content("No posts."));
        }
        let lines: Vec<String> = store
            .posts
            .iter()
            .map(|p| {
                if p.tags.is_empty() {
                    format!("{}: {}", p.id, p.title)
                } else {
                    format!("{}: {} [{}]", p.id, p.title, p.tags.join(", "))
                }
            })
            .collect();
        Ok(text_content(lines.join("\n")))
    }

    async fn get_post(&self, id: u64) -> Result<Value, RpcErrorBody> {
        let store = self.store.read().await;
        let post = store
            .posts
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| RpcErrorBody {
                code: error_codes::INVALID_PARAMS,
                message: format!("no post with id {id}"),
            })?;
        Ok(text_content(format!("{}\n\n{}", post.title, post.body)))
    }

    async fn list_tags(&self) -> Result<Value, RpcErrorBody> {
        let store = self.store.read().await;
        if store.tags.is_empty() {
            return Ok(text_content("No tags."));
        }
        Ok(text_content(store.tags.join("\n")))
    }

    async fn add_tag(&self, name: String) -> Result<Value, RpcErrorBody> {
        let mut store = self.store.write().await;
        let summary = if store.tags.contains(&name) {
            format!("Tag already exists: {name}")
        } else {
            store.tags.push(name.clone());
            format!("Added tag: {name}")
        };
        Ok(text_content(summary))
    }
}

#[async_trait]
impl ProviderHandler for ContentProvider {
    fn label(&self) -> &str {
        "content"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor {
                name: "create_post".into(),
                description: "Create a new post with a title, body and optional tags.".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "description": "Post title" },
                        "body": { "type": "string", "description": "Post body text" },
                        "tags": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Optional tags to attach"
                        }
                    },
                    "required": ["title", "body"]
                }),
            },
            ToolDescriptor {
                name: "list_posts".into(),
                description: "List all posts with their ids, titles and tags.".into(),
                input_schema: json!({ "type": "object", "properties": {} }),
            },
            ToolDescriptor {
                name: "get_post".into(),
                description: "Fetch a single post by id.".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "description": "The post id" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDescriptor {
                name: "list_tags".into(),
                description: "List all known tags.".into(),
                input_schema: json!({ "type": "object", "properties": {} }),
            },
            ToolDescriptor {
                name: "add_tag".into(),
                description: "Register a new tag.".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "The tag name" }
                    },
                    "required": ["name"]
                }),
            },
        ]
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, RpcErrorBody> {
        match name {
            "create_post" => {
                #[derive(Deserialize)]
                struct Args {
                    title: String,
                    body: String,
                    #[serde(default)]
                    tags: Vec<String>,
                }
                let args: Args = serde_json::from_value(args)
                    .map_err(|e| tool_error(format!("invalid arguments: {e}")))?;
                self.create_post(args.title, args.body, args.tags).await
            }
            "list_posts" => self.list_posts().await,
            "get_post" => {
                #[derive(Deserialize)]
                struct Args {
                    id: u64,
                }
                let args: Args = serde_json::from_value(args)
                    .map_err(|e| tool_error(format!("invalid arguments: {e}")))?;
                self.get_post(args.id).await
            }
            "list_tags" => self.list_tags().await,
            "add_tag" => {
                #[derive(Deserialize)]
                struct Args {
                    name: String,
                }
                let args: Args = serde_json::from_value(args)
                    .map_err(|e| tool_error(format!("invalid arguments: {e}")))?;
                self.add_tag(args.name).await
            }
            other => Err(tool_error(format!("no such tool: {other}"))),
        }
    }

    async fn list_resources(&self) -> Result<Value, RpcErrorBody> {
        let store = self.store.read().await;
        let resources: Vec<Value> = store
            .posts
            .iter()
            .map(|p| {
                json!({
                    "uri": format!("post://{}", p.id),
                    "name": p.title,
                    "mimeType": "text/plain"
                })
            })
            .collect();
        Ok(json!({ "resources": resources }))
    }

    async fn read_resource(&self, uri: &str) -> Result<Value, RpcErrorBody> {
        let id: u64 = uri
            .strip_prefix("post://")
            .and_then(|rest| rest.parse().ok())
            .ok_or_else(|| RpcErrorBody {
                code: error_codes::INVALID_PARAMS,
                message: format!("unknown resource: {uri}"),
            })?;

        let store = self.store.read().await;
        let post = store
            .posts
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| RpcErrorBody {
                code: error_codes::INVALID_PARAMS,
                message: format!("unknown resource: {uri}"),
            })?;

        Ok(json!({
            "contents": [{ "uri": uri, "mimeType": "text/plain", "text": post.body }]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_text(result: &Value) -> &str {
        result["content"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list_posts() {
        let provider = ContentProvider::new();
        let created = provider
            .call_tool(
                "create_post",
                json!({"title": "Hello world", "body": "First!", "tags": ["intro"]}),
            )
            .await
            .unwrap();
        assert_eq!(first_text(&created), "Created post 1: Hello world");

        let listed = provider.call_tool("list_posts", json!({})).await.unwrap();
        assert!(first_text(&listed).contains("1: Hello world [intro]"));
    }

    #[tokio::test]
    async fn test_create_post_registers_tags() {
        let provider = ContentProvider::new();
        provider
            .call_tool(
                "create_post",
                json!({"title": "T", "body": "B", "tags": ["rust", "agents"]}),
            )
            .await
            .unwrap();

        let tags = provider.call_tool("list_tags", json!({})).await.unwrap();
        let text = first_text(&tags);
        assert!(text.contains("rust"));
        assert!(text.contains("agents"));
    }

    #[tokio::test]
    async fn test_add_tag_deduplicates() {
        let provider = ContentProvider::new();
        provider
            .call_tool("add_tag", json!({"name": "news"}))
            .await
            .unwrap();
        let again = provider
            .call_tool("add_tag", json!({"name": "news"}))
            .await
            .unwrap();
        assert!(first_text(&again).contains("already exists"));
        assert_eq!(provider.tags().await, vec!["news".to_string()]);
    }

    #[tokio::test]
    async fn test_get_post_missing_id_errors() {
        let provider = ContentProvider::new();
        let result = provider.call_tool("get_post", json!({"id": 99})).await;
        let err = result.unwrap_err();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_posts_are_exposed_as_resources() {
        let provider = ContentProvider::new();
        provider
            .call_tool("create_post", json!({"title": "Doc", "body": "the body"}))
            .await
            .unwrap();

        let listed = provider.list_resources().await.unwrap();
        assert_eq!(listed["resources"][0]["uri"], "post://1");

        let read = provider.read_resource("post://1").await.unwrap();
        assert_eq!(read["contents"][0]["text"], "the body");
    }

    #[tokio::test]
    async fn test_read_unknown_resource_errors() {
        let provider = ContentProvider::new();
        assert!(provider.read_resource("post://42").await.is_err());
        assert!(provider.read_resource("file:///etc/passwd").await.is_err());
    }
}
