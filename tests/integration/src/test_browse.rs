//! Page rendering and listing cache integration tests.

#[cfg(test)]
mod tests {
    use crate::{cleanup_bucket, create_seeded_bucket, fetch, put_object, s3_client};

    const KEYS: &[&str] = &[
        "photos/2024/jan/img1.jpg",
        "photos/2024/feb/img2.jpg",
        "photos/readme.txt",
        "root.txt",
    ];

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_buckets() {
        let client = s3_client();
        let bucket = create_seeded_bucket(&client, "buckets", KEYS).await;

        let page = fetch("/").await.expect("fetch bucket list");
        assert_eq!(page.status, 200);
        assert!(page.body.contains(&bucket));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_directories_then_files() {
        let client = s3_client();
        let bucket = create_seeded_bucket(&client, "listing", KEYS).await;

        let page = fetch(&format!("/{bucket}/photos"))
            .await
            .expect("fetch listing");
        assert_eq!(page.status, 200);

        let dir = page.body.find("2024/").expect("directory entry");
        let file = page.body.find("readme.txt").expect("file entry");
        assert!(dir < file);
        assert!(page.body.contains(&format!("/download/{bucket}/photos/readme.txt")));
        assert!(page.body.contains("Fetched from storage"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_stale_listing_until_refresh() {
        let client = s3_client();
        let bucket = create_seeded_bucket(&client, "refresh", KEYS).await;
        let path = format!("/{bucket}/");

        let first = fetch(&path).await.expect("first fetch");
        assert!(first.body.contains("Fetched from storage"));

        put_object(&client, &bucket, "late.txt", b"late").await;

        let cached = fetch(&path).await.expect("cached fetch");
        assert!(cached.body.contains("Served from cache"));
        assert!(!cached.body.contains("late.txt"));

        let refreshed = fetch(&format!("{path}?refresh=true"))
            .await
            .expect("refreshed fetch");
        assert!(refreshed.body.contains("Fetched from storage"));
        assert!(refreshed.body.contains("late.txt"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_render_error_page_for_missing_bucket() {
        let page = fetch("/no-such-bucket-for-browse-tests/dir/")
            .await
            .expect("fetch error page");
        assert_eq!(page.status, 404);
        assert!(page.body.contains("ListObjectsV2 operation failed"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_probes_with_common_headers() {
        let health = fetch("/_health").await.expect("fetch health");
        assert_eq!(health.status, 200);
        assert!(health.body.contains("\"status\":\"running\""));
        assert!(health.headers.contains_key("x-request-id"));
        assert_eq!(
            health
                .headers
                .get("server")
                .and_then(|v| v.to_str().ok()),
            Some("RustackBrowse")
        );

        let favicon = fetch("/favicon.ico").await.expect("fetch favicon");
        assert_eq!(favicon.status, 404);
        assert!(favicon.body.is_empty());
    }
}
