// GitHubClient tests against a local stub API server, covering tree-listing
// response mapping, the raw media type fetch, and error surfacing.

use std::net::SocketAddr;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use vault_mirror::github::GitHubClient;
use vault_mirror_core::contract::{EntryKind, RemoteRepository};

async fn tree_listing(Path((owner, repo, reference)): Path<(String, String, String)>) -> Json<serde_json::Value> {
    assert_eq!(owner, "octocat");
    assert_eq!(repo, "vault");
    assert_eq!(reference, "main");
    Json(json!({
        "sha": "root",
        "truncated": false,
        "tree": [
            { "path": "Article", "mode": "040000", "type": "tree", "sha": "T1" },
            { "path": "Article/Post.md", "mode": "100644", "type": "blob", "sha": "B1", "size": 42 },
            { "path": "Attachment/pic.png", "mode": "100644", "type": "blob", "sha": "B2", "size": 7 }
        ]
    }))
}

async fn raw_contents(
    Path((_, _, path)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    assert_eq!(
        headers.get("accept").and_then(|v| v.to_str().ok()),
        Some("application/vnd.github.raw"),
        "raw fetches must request the raw media type"
    );
    match path.as_str() {
        "Article/Post.md" => (StatusCode::OK, b"# post body".to_vec()),
        _ => (StatusCode::NOT_FOUND, b"{\"message\":\"Not Found\"}".to_vec()),
    }
}

/// Serves a minimal GitHub API lookalike on an ephemeral local port.
async fn spawn_stub() -> SocketAddr {
    let app = Router::new()
        .route("/repos/:owner/:repo/git/trees/:reference", get(tree_listing))
        .route("/repos/:owner/:repo/contents/*path", get(raw_contents));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("stub should bind an ephemeral port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> GitHubClient {
    GitHubClient::with_base_url(
        format!("http://{addr}"),
        "octocat",
        "vault",
        "main",
        Some("test-token".to_string()),
    )
    .expect("client construction should succeed")
}

#[tokio::test]
async fn list_tree_maps_blobs_and_trees() {
    let addr = spawn_stub().await;
    let entries = client(addr)
        .list_tree("main")
        .await
        .expect("listing should succeed");

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].kind, EntryKind::Tree);
    assert_eq!(entries[1].path, "Article/Post.md");
    assert_eq!(entries[1].content_hash, "B1");
    assert_eq!(entries[1].kind, EntryKind::Blob);
    assert_eq!(entries[2].content_hash, "B2");
}

#[tokio::test]
async fn fetch_raw_returns_file_bytes() {
    let addr = spawn_stub().await;
    let bytes = client(addr)
        .fetch_raw("Article/Post.md")
        .await
        .expect("fetch should succeed");
    assert_eq!(bytes, b"# post body".to_vec());
}

#[tokio::test]
async fn fetch_raw_surfaces_api_errors() {
    let addr = spawn_stub().await;
    let err = client(addr)
        .fetch_raw("Article/Gone.md")
        .await
        .expect_err("a 404 from the API must surface as an error");
    assert!(
        err.to_string().contains("404"),
        "error should carry the status, got: {err}"
    );
}
