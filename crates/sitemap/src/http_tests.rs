use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{FetchError, SitemapClient, SitemapSource};

const PREFIX: &str = "https://grokipedia.com/page/";

fn client_for(server: &MockServer) -> SitemapClient {
    SitemapClient::new(&format!("{}/sitemap", server.uri()), PREFIX, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_list_sitemaps_reads_index() {
    let server = MockServer::start().await;
    let index = format!(
        "<sitemapindex><sitemap><loc>{0}/sitemap/sitemap-00001.xml</loc></sitemap>\
         <sitemap><loc>{0}/sitemap/sitemap-00002.xml</loc></sitemap></sitemapindex>",
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path("/sitemap/sitemap-index.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index))
        .expect(1)
        .mount(&server)
        .await;

    let urls = client_for(&server).list_sitemaps().await.unwrap();
    assert_eq!(urls.len(), 2);
    assert!(urls[0].ends_with("/sitemap/sitemap-00001.xml"));
    assert!(urls[1].ends_with("/sitemap/sitemap-00002.xml"));
}

#[tokio::test]
async fn test_index_failure_carries_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap/sitemap-index.xml"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).list_sitemaps().await.unwrap_err();
    assert!(matches!(err, FetchError::Status { code: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetch_sitemap_decodes_entries() {
    let server = MockServer::start().await;
    let body = r#"<urlset>
<url><loc>https://grokipedia.com/page/Multiple_Word_Topic</loc><lastmod>2025-10-27</lastmod></url>
<url><loc>https://grokipedia.com/page/at%26t</loc></url>
<url><changefreq>daily</changefreq></url>
</urlset>"#;

    Mock::given(method("GET"))
        .and(path("/sitemap/sitemap-00001.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let url = format!("{}/sitemap/sitemap-00001.xml", server.uri());
    let entries = client_for(&server).fetch_sitemap(&url).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title.as_deref(), Some("Multiple Word Topic"));
    assert_eq!(entries[0].last_modified.as_deref(), Some("2025-10-27"));
    assert_eq!(entries[1].slug, "at&t");
}

#[tokio::test]
async fn test_fetch_sitemap_does_not_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap/sitemap-00009.xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/sitemap/sitemap-00009.xml", server.uri());
    let err = client_for(&server).fetch_sitemap(&url).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_missing_sitemap_is_permanent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap/sitemap-00404.xml"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let url = format!("{}/sitemap/sitemap-00404.xml", server.uri());
    let err = client_for(&server).fetch_sitemap(&url).await.unwrap_err();
    assert!(!err.is_transient());
    assert!(err.to_string().contains("404"));
}
