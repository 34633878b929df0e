use crate::common::{mock_site, pages, serve_xml, sitemap_index, test_fetcher, urlset};
use rival_harvest::config::{UpdateTaskConfig, WebsiteConfig};
use rival_harvest::scheduler::{SchedulerError, StaticRegistry, TaskStatus, UpdateScheduler};
use rival_harvest::sitemap::SitemapReader;
use rival_harvest::storage::{open_state_store, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn build_scheduler(store: StateStore, sites: Vec<WebsiteConfig>) -> UpdateScheduler {
    let reader = SitemapReader::new(test_fetcher()).with_retry_delay(Duration::from_millis(10));
    let scheduler = UpdateScheduler::builder(store, Arc::new(StaticRegistry::new(sites)), Arc::new(reader))
        .batch_delay(Duration::ZERO)
        .retry_base(Duration::from_millis(10))
        .build()
        .expect("Failed to build scheduler");

    scheduler
        .update_config(UpdateTaskConfig {
            max_concurrent: 2,
            max_retries: 0,
            ..UpdateTaskConfig::default()
        })
        .expect("Failed to apply config");
    scheduler
}

#[tokio::test]
async fn test_incremental_update_diff() {
    let mock_server = MockServer::start().await;
    let store = StateStore::in_memory();
    let site = mock_site(&mock_server, "mock", "/sitemap.xml");
    let scheduler = build_scheduler(store.clone(), vec![site]);

    serve_xml(&mock_server, "/sitemap.xml", urlset(&pages(&mock_server, &["a", "b"]))).await;
    let first = scheduler.trigger_manual_update(false).await.unwrap();
    assert_eq!(first.status, TaskStatus::Completed);
    assert_eq!(first.new_urls, 2);

    mock_server.reset().await;
    serve_xml(&mock_server, "/sitemap.xml", urlset(&pages(&mock_server, &["b", "c"]))).await;
    let second = scheduler.trigger_manual_update(false).await.unwrap();

    assert_eq!(second.status, TaskStatus::Completed);
    assert_eq!(second.new_urls, 1);
    assert_eq!(second.updated_urls, 1);

    let snapshot = store.load_snapshot("mock").unwrap().unwrap();
    assert_eq!(snapshot.urls.len(), 2);
    assert!(snapshot.urls.iter().any(|u| u.ends_with("/game/c")));
}

#[tokio::test]
async fn test_child_sitemap_outage_keeps_previous_snapshot() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let store = StateStore::in_memory();
    let site = mock_site(&mock_server, "mock", "/sitemap.xml");
    let scheduler = build_scheduler(store.clone(), vec![site]);
    let index = sitemap_index(&[format!("{base}/games-1.xml"), format!("{base}/games-2.xml")]);

    serve_xml(&mock_server, "/sitemap.xml", index.clone()).await;
    serve_xml(&mock_server, "/games-1.xml", urlset(&pages(&mock_server, &["a"]))).await;
    serve_xml(&mock_server, "/games-2.xml", urlset(&pages(&mock_server, &["b"]))).await;
    let healthy = scheduler.trigger_manual_update(false).await.unwrap();
    assert_eq!(healthy.status, TaskStatus::Completed);
    assert_eq!(healthy.new_urls, 2);
    let last_update = scheduler.get_last_update_time().unwrap();
    assert!(last_update.is_some());

    // Every child sitemap is down while the index still answers
    mock_server.reset().await;
    serve_xml(&mock_server, "/sitemap.xml", index.clone()).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    let outage = scheduler.trigger_manual_update(false).await.unwrap();

    assert_eq!(outage.status, TaskStatus::Failed);
    assert_eq!(outage.failed_sites, 1);
    assert!(outage.errors[0].contains("child sitemap"), "{:?}", outage.errors);
    assert_eq!(store.load_snapshot("mock").unwrap().unwrap().urls.len(), 2);
    assert_eq!(scheduler.get_last_update_time().unwrap(), last_update);

    mock_server.reset().await;
    serve_xml(&mock_server, "/sitemap.xml", index).await;
    serve_xml(&mock_server, "/games-1.xml", urlset(&pages(&mock_server, &["a"]))).await;
    serve_xml(&mock_server, "/games-2.xml", urlset(&pages(&mock_server, &["b"]))).await;
    let recovered = scheduler.trigger_manual_update(false).await.unwrap();

    assert_eq!(recovered.status, TaskStatus::Completed);
    assert_eq!(recovered.new_urls, 0);
    assert_eq!(recovered.updated_urls, 2);
}

#[tokio::test]
async fn test_one_failing_site_fails_the_run() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    serve_xml(&mock_server, "/one.xml", urlset(&[format!("{base}/game/one")])).await;
    serve_xml(&mock_server, "/two.xml", urlset(&[format!("{base}/game/two")])).await;
    Mock::given(method("GET"))
        .and(path("/bad.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let sites = vec![
        mock_site(&mock_server, "one", "/one.xml"),
        mock_site(&mock_server, "bad", "/bad.xml"),
        mock_site(&mock_server, "two", "/two.xml"),
    ];
    let scheduler = build_scheduler(StateStore::in_memory(), sites);

    let result = scheduler.trigger_manual_update(false).await.unwrap();

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.total_sites, 3);
    assert_eq!(result.success_sites, 2);
    assert_eq!(result.failed_sites, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Site bad: "));
    assert!(scheduler.get_last_update_time().unwrap().is_none());
}

#[tokio::test]
async fn test_overlapping_manual_updates_are_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(urlset(&pages(&mock_server, &["slow"])))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let site = mock_site(&mock_server, "mock", "/sitemap.xml");
    let scheduler = build_scheduler(StateStore::in_memory(), vec![site]);

    let first = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.trigger_manual_update(false).await }
    });

    while !scheduler.is_running() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let second = scheduler.trigger_manual_update(false).await;
    assert!(matches!(second, Err(SchedulerError::AlreadyRunning)));
    assert_eq!(second.unwrap_err().to_string(), "update already running");

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status, TaskStatus::Completed);

    let third = scheduler.trigger_manual_update(false).await.unwrap();
    assert_eq!(third.status, TaskStatus::Completed);
    assert_eq!(scheduler.get_task_history(None).unwrap().len(), 2);
}

#[tokio::test]
async fn test_state_survives_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");

    let mock_server = MockServer::start().await;
    serve_xml(&mock_server, "/sitemap.xml", urlset(&pages(&mock_server, &["x", "y"]))).await;
    let site = mock_site(&mock_server, "mock", "/sitemap.xml");

    {
        let store = open_state_store(&db_path).unwrap();
        let scheduler = build_scheduler(store, vec![site.clone()]);
        let result = scheduler.trigger_manual_update(false).await.unwrap();
        assert_eq!(result.status, TaskStatus::Completed);
    }

    let reopened = open_state_store(&db_path).unwrap();
    let history = reopened.load_history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].new_urls, 2);
    assert!(reopened.last_update().unwrap().is_some());
    assert_eq!(reopened.load_snapshot("mock").unwrap().unwrap().total_urls, 2);

    let config = reopened.load_task_config().unwrap().unwrap();
    assert_eq!(config.max_concurrent, 2);

    // A second scheduler picks up the stored snapshot
    let scheduler = build_scheduler(reopened, vec![site]);
    let result = scheduler.trigger_manual_update(false).await.unwrap();
    assert_eq!(result.new_urls, 0);
    assert_eq!(result.updated_urls, 2);
}
