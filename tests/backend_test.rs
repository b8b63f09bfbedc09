//! Wire-level tests for the vendor backends and Google auth flows, against
//! mocked HTTP servers.

use mockito::{Matcher, Server};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

use drive_index::{
    Authenticator, DriveClient, DropboxClient, EntryKind, IndexError, RetryPolicy, StorageBackend,
};

mod drive {
    use super::*;

    fn client(server: &Server) -> DriveClient {
        let auth = Authenticator::from_static_token("test-token");
        DriveClient::with_base_url(auth, server.url())
    }

    #[tokio::test]
    async fn list_children_parses_a_page() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/files")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "q".into(),
                    "'root123' in parents and trashed = false".into(),
                ),
                Matcher::UrlEncoded("pageSize".into(), "1000".into()),
                Matcher::UrlEncoded("supportsAllDrives".into(), "true".into()),
                Matcher::UrlEncoded("includeItemsFromAllDrives".into(), "true".into()),
            ]))
            .match_header("authorization", "Bearer test-token")
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "files": [
                        {
                            "id": "f1",
                            "name": "a.txt",
                            "mimeType": "text/plain",
                            "size": "10",
                            "webViewLink": "https://drive.google.com/file/d/f1/view",
                            "owners": [{"displayName": "Ada"}]
                        },
                        {
                            "id": "d1",
                            "name": "sub",
                            "mimeType": "application/vnd.google-apps.folder"
                        }
                    ],
                    "nextPageToken": "page2"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let page = client(&server).list_children("root123", None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.next_page_token, Some("page2".to_string()));
        assert_eq!(page.entries[0].kind, EntryKind::File);
        assert_eq!(
            page.entries[0].link.as_deref(),
            Some("https://drive.google.com/file/d/f1/view")
        );
        assert_eq!(page.entries[0].owner.as_deref(), Some("Ada"));
        assert_eq!(page.entries[1].kind, EntryKind::Folder);
    }

    #[tokio::test]
    async fn page_token_is_forwarded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/files")
            .match_query(Matcher::UrlEncoded("pageToken".into(), "page2".into()))
            .with_header("content-type", "application/json")
            .with_body(json!({ "files": [] }).to_string())
            .create_async()
            .await;

        let page = client(&server)
            .list_children("root123", Some("page2"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(page.entries.is_empty());
        assert_eq!(page.next_page_token, None);
    }

    #[tokio::test]
    async fn missing_file_maps_to_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/files/missing")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": { "code": 404, "message": "File not found: missing" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = client(&server).metadata("missing").await.unwrap_err();
        assert!(matches!(err, IndexError::NotFound(_)));
    }

    #[tokio::test]
    async fn expired_token_maps_to_authentication_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/files/f1")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": { "code": 401, "message": "Invalid Credentials" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = client(&server).share_link("f1").await.unwrap_err();
        assert!(matches!(err, IndexError::AuthenticationError(_)));
    }

    #[tokio::test]
    async fn rate_limiting_retries_then_surfaces() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/files/f1")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body("rate limit exceeded")
            .expect(3)
            .create_async()
            .await;

        let auth = Authenticator::from_static_token("test-token");
        let client = DriveClient::with_base_url(auth, server.url()).with_retry_policy(
            RetryPolicy {
                max_retries: 3,
                max_sleep_secs: 0,
            },
        );

        let err = client.metadata("f1").await.unwrap_err();
        mock.assert_async().await;
        assert!(matches!(err, IndexError::RateLimited { retries: 3 }));
    }
}

mod dropbox {
    use super::*;

    fn client(server: &Server) -> DropboxClient {
        DropboxClient::with_base_url("test-token", server.url())
    }

    #[tokio::test]
    async fn list_folder_and_continue() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("POST", "/files/list_folder")
            .match_body(Matcher::Json(json!({
                "path": "id:root",
                "recursive": false,
                "limit": 1000
            })))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "entries": [
                        {
                            ".tag": "file",
                            "id": "id:f1",
                            "name": "a.txt",
                            "path_display": "/a.txt",
                            "size": 10,
                            "server_modified": "2021-01-25T15:50:38Z"
                        }
                    ],
                    "cursor": "cur1",
                    "has_more": true
                })
                .to_string(),
            )
            .create_async()
            .await;

        let second = server
            .mock("POST", "/files/list_folder/continue")
            .match_body(Matcher::Json(json!({ "cursor": "cur1" })))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "entries": [
                        { ".tag": "folder", "id": "id:d1", "name": "sub" }
                    ],
                    "cursor": "cur2",
                    "has_more": false
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client(&server);

        let page = client.list_children("id:root", None).await.unwrap();
        first.assert_async().await;
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].kind, EntryKind::File);
        assert_eq!(page.next_page_token, Some("cur1".to_string()));

        let page = client.list_children("id:root", Some("cur1")).await.unwrap();
        second.assert_async().await;
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].kind, EntryKind::Folder);
        assert_eq!(page.next_page_token, None);
    }

    #[tokio::test]
    async fn share_link_reuses_existing_link() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/sharing/list_shared_links")
            .match_body(Matcher::Json(json!({
                "path": "id:f1",
                "direct_only": true
            })))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "links": [{ "url": "https://www.dropbox.com/s/abc/a.txt" }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let create = server
            .mock("POST", "/sharing/create_shared_link_with_settings")
            .expect(0)
            .create_async()
            .await;

        let url = client(&server).share_link("id:f1").await.unwrap();
        create.assert_async().await;
        assert_eq!(url, "https://www.dropbox.com/s/abc/a.txt");
    }

    #[tokio::test]
    async fn share_link_creates_when_missing() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/sharing/list_shared_links")
            .with_header("content-type", "application/json")
            .with_body(json!({ "links": [] }).to_string())
            .create_async()
            .await;

        let create = server
            .mock("POST", "/sharing/create_shared_link_with_settings")
            .match_body(Matcher::Json(json!({ "path": "id:f1" })))
            .with_header("content-type", "application/json")
            .with_body(
                json!({ "url": "https://www.dropbox.com/s/new/a.txt" }).to_string(),
            )
            .create_async()
            .await;

        let url = client(&server).share_link("id:f1").await.unwrap();
        create.assert_async().await;
        assert_eq!(url, "https://www.dropbox.com/s/new/a.txt");
    }

    #[tokio::test]
    async fn missing_path_maps_to_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/files/get_metadata")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error_summary": "path/not_found/..",
                    "error": { ".tag": "path" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = client(&server).metadata("/missing").await.unwrap_err();
        assert!(matches!(err, IndexError::NotFound(_)));
    }

    #[tokio::test]
    async fn namespace_root_is_synthesized() {
        let server = Server::new_async().await;

        let root = client(&server).metadata("").await.unwrap();
        assert_eq!(root.kind, EntryKind::Folder);
        assert_eq!(root.name, "Dropbox");
        assert!(root.id.is_empty());
    }
}

mod google_auth {
    use super::*;

    #[tokio::test]
    async fn authorized_user_refresh_flow_with_caching() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("client_id".into(), "cid".into()),
                Matcher::UrlEncoded("client_secret".into(), "sec".into()),
                Matcher::UrlEncoded("refresh_token".into(), "rtok".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "access_token": "tok123",
                    "token_type": "Bearer",
                    "expires_in": 3600
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let mut creds_file = NamedTempFile::new().unwrap();
        let creds = json!({
            "type": "authorized_user",
            "client_id": "cid",
            "client_secret": "sec",
            "refresh_token": "rtok",
            "token_uri": format!("{}/token", server.url())
        });
        creds_file.write_all(creds.to_string().as_bytes()).unwrap();

        let auth = Authenticator::from_file(creds_file.path()).unwrap();

        assert_eq!(auth.get_access_token().await.unwrap(), "tok123");
        // Second call is served from the cache.
        assert_eq!(auth.get_access_token().await.unwrap(), "tok123");
        mock.assert_async().await;
    }

    #[test]
    fn service_account_credentials_from_file() {
        let mut creds_file = NamedTempFile::new().unwrap();
        let creds = json!({
            "type": "service_account",
            "client_email": "test@project.iam.gserviceaccount.com",
            "private_key": "key",
            "token_uri": "https://oauth2.googleapis.com/token"
        });
        creds_file.write_all(creds.to_string().as_bytes()).unwrap();

        assert!(Authenticator::from_file(creds_file.path()).is_ok());
    }

    #[test]
    fn invalid_credentials_file() {
        let mut creds_file = NamedTempFile::new().unwrap();
        creds_file.write_all(b"not valid json").unwrap();

        assert!(Authenticator::from_file(creds_file.path()).is_err());
        assert!(Authenticator::from_file("/nonexistent/credentials.json").is_err());
    }
}
