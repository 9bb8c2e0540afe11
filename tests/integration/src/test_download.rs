//! Object download integration tests.

#[cfg(test)]
mod tests {
    use crate::{cleanup_bucket, create_seeded_bucket, fetch, put_object, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_download_object_body() {
        let client = s3_client();
        let bucket = create_seeded_bucket(&client, "download", &[]).await;
        put_object(&client, &bucket, "docs/my report.txt", b"quarterly numbers").await;

        let page = fetch(&format!("/download/{bucket}/docs/my%20report.txt"))
            .await
            .expect("download");
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "quarterly numbers");
        assert_eq!(
            page.headers
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("application/octet-stream")
        );
        assert!(
            page.headers
                .get("content-disposition")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("my%20report.txt"))
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_render_error_page_for_missing_object() {
        let client = s3_client();
        let bucket = create_seeded_bucket(&client, "missing", &["present.txt"]).await;

        let page = fetch(&format!("/download/{bucket}/absent.txt"))
            .await
            .expect("download");
        assert_eq!(page.status, 404);
        assert!(page.body.contains("GetObject failed"));

        cleanup_bucket(&client, &bucket).await;
    }
}
