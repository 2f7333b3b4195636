//! Integration tests for the fetch strategy chain and single-page fetches

use crate::common::{
    article_page, fast_fetch_config, html_response, long_paragraph, seeded_context, FakeLauncher,
    Reply, ScriptedTransport,
};
use pagesift::fetch::{fetch_page, FetchConfig, ResourceKind, TransportError};
use pagesift::{fetch_document, FetchError, SiftError};
use std::sync::atomic::Ordering;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const URL: &str = "https://site.test/page";

fn good_page() -> String {
    let first = long_paragraph("retries");
    let second = long_paragraph("backoff");
    article_page("Good", &[first.as_str(), second.as_str()], &[])
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_exhaust_budget() {
    let transport = ScriptedTransport::new(vec![Reply::Hang, Reply::Hang, Reply::Hang]);
    let mut ctx = seeded_context().with_transport(transport.clone());
    let config = FetchConfig {
        retry_attempts: 3,
        ..fast_fetch_config()
    };

    let result = fetch_page(URL, &config, &mut ctx).await;

    match result {
        Err(FetchError::AllStrategiesExhausted { url, attempts }) => {
            assert_eq!(url, URL);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert_eq!(transport.calls(), 3);

    // Transient backoff between attempts, none after the last
    for gap in transport.gaps() {
        assert!(gap >= config.timeout + Duration::from_secs(2), "gap {:?}", gap);
        assert!(gap <= config.timeout + Duration::from_secs(5), "gap {:?}", gap);
    }
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_waits_longer_than_transient_failure() {
    let transport = ScriptedTransport::new(vec![
        Reply::Respond(html_response(URL, 429, "")),
        Reply::Fail(TransportError::Connection("reset".to_string())),
        Reply::Respond(html_response(URL, 200, &good_page())),
    ]);
    let mut ctx = seeded_context().with_transport(transport.clone());

    let page = fetch_page(URL, &fast_fetch_config(), &mut ctx).await.unwrap();

    assert_eq!(page.result.status_code, 200);
    let gaps = transport.gaps();
    assert_eq!(gaps.len(), 2);
    assert!(gaps[0] >= Duration::from_secs(10) && gaps[0] <= Duration::from_secs(20));
    assert!(gaps[1] >= Duration::from_secs(2) && gaps[1] <= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_forbidden_retries_without_waiting() {
    let transport = ScriptedTransport::new(vec![
        Reply::Respond(html_response(URL, 403, "")),
        Reply::Respond(html_response(URL, 403, "")),
        Reply::Respond(html_response(URL, 403, "")),
    ]);
    let mut ctx = seeded_context().with_transport(transport.clone());

    let result = fetch_page(URL, &fast_fetch_config(), &mut ctx).await;

    assert!(matches!(
        result,
        Err(FetchError::AllStrategiesExhausted { attempts: 3, .. })
    ));
    assert!(transport.gaps().iter().all(|gap| gap.is_zero()));
}

#[tokio::test(start_paused = true)]
async fn test_every_attempt_carries_identity_headers() {
    let transport = ScriptedTransport::new(vec![
        Reply::Respond(html_response(URL, 403, "")),
        Reply::Respond(html_response(URL, 200, &good_page())),
    ]);
    let mut ctx = seeded_context().with_transport(transport.clone());

    fetch_page(URL, &fast_fetch_config(), &mut ctx).await.unwrap();

    for request in transport.requests() {
        let header = |name: &str| {
            request
                .headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.clone())
        };
        assert!(header("User-Agent").is_some());
        assert!(header("Accept-Language").is_some());
        assert_eq!(header("Referer").as_deref(), Some("https://site.test/"));
    }
}

#[tokio::test(start_paused = true)]
async fn test_non_html_attempted_once() {
    let mut pdf = html_response(URL, 200, "%PDF-1.7");
    pdf.headers = vec![("content-type".to_string(), "application/pdf".to_string())];
    let transport = ScriptedTransport::new(vec![
        Reply::Respond(pdf),
        Reply::Respond(html_response(URL, 200, &good_page())),
    ]);
    let mut ctx = seeded_context().with_transport(transport.clone());

    let result = fetch_page(URL, &fast_fetch_config(), &mut ctx).await;

    assert!(matches!(
        result,
        Err(FetchError::AllStrategiesExhausted { attempts: 1, .. })
    ));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_is_not_retried() {
    let transport = ScriptedTransport::new(vec![
        Reply::Respond(html_response(URL, 404, "missing")),
        Reply::Respond(html_response(URL, 200, &good_page())),
    ]);
    let mut ctx = seeded_context().with_transport(transport.clone());

    assert!(fetch_page(URL, &fast_fetch_config(), &mut ctx).await.is_err());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rendered_result_kept_when_long_enough() {
    let launcher = FakeLauncher::serving(&good_page(), Some("Rendered Title"));
    let transport = ScriptedTransport::new(Vec::new());
    let mut ctx = seeded_context()
        .with_transport(transport.clone())
        .with_render_launcher(launcher.clone());
    let config = FetchConfig {
        render_capable: true,
        ..fast_fetch_config()
    };

    let page = fetch_page(URL, &config, &mut ctx).await.unwrap();

    assert!(page.result.rendered);
    assert_eq!(page.result.title.as_deref(), Some("Rendered Title"));
    assert_eq!(transport.calls(), 0);
    assert_eq!(
        *launcher.log.blocked.lock().unwrap(),
        vec![
            ResourceKind::Image,
            ResourceKind::Stylesheet,
            ResourceKind::Font,
            ResourceKind::Media
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_thin_rendered_result_loses_to_longer_plain_result() {
    let thin = article_page("Thin", &["Loading..."], &[]);
    let launcher = FakeLauncher::serving(&thin, None);
    let transport = ScriptedTransport::new(vec![Reply::Respond(html_response(
        URL,
        200,
        &good_page(),
    ))]);
    let mut ctx = seeded_context()
        .with_transport(transport.clone())
        .with_render_launcher(launcher);
    let config = FetchConfig {
        render_capable: true,
        ..fast_fetch_config()
    };

    let page = fetch_page(URL, &config, &mut ctx).await.unwrap();

    assert!(!page.result.rendered);
    assert!(page.text.contains("about retries"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_launch_falls_back_to_plain_and_is_not_retried() {
    let launcher = FakeLauncher::broken();
    let transport = ScriptedTransport::new(vec![
        Reply::Respond(html_response(URL, 200, &good_page())),
        Reply::Respond(html_response(URL, 200, &good_page())),
    ]);
    let mut ctx = seeded_context()
        .with_transport(transport.clone())
        .with_render_launcher(launcher.clone());
    let config = FetchConfig {
        render_capable: true,
        ..fast_fetch_config()
    };

    assert!(!fetch_page(URL, &config, &mut ctx).await.unwrap().result.rendered);
    assert!(fetch_page(URL, &config, &mut ctx).await.is_ok());
    assert_eq!(launcher.log.launches.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_render_session_reused_and_closed() {
    let launcher = FakeLauncher::serving(&good_page(), None);
    let mut ctx = seeded_context().with_render_launcher(launcher.clone());
    let config = FetchConfig {
        render_capable: true,
        ..fast_fetch_config()
    };

    fetch_page(URL, &config, &mut ctx).await.unwrap();
    fetch_page("https://site.test/other", &config, &mut ctx)
        .await
        .unwrap();
    assert!(ctx.has_live_session());

    ctx.shutdown().await;

    assert_eq!(launcher.log.launches.load(Ordering::SeqCst), 1);
    assert_eq!(launcher.log.navigations.load(Ordering::SeqCst), 2);
    assert!(launcher.log.closed.load(Ordering::SeqCst));
    assert!(!ctx.has_live_session());
}

#[tokio::test]
async fn test_fetch_document_skips_malformed_structured_data() {
    let mock_server = MockServer::start().await;
    let paragraph = long_paragraph("structured data");
    let page = format!(
        r#"<!DOCTYPE html><html lang="en"><head>
<title>Recipe</title>
<meta name="description" content="A tasty recipe">
<meta property="og:title" content="Recipe OG">
<script type="application/ld+json">{{"@type": "Recipe", "name": "Soup"}}</script>
<script type="application/ld+json">{{"@type": "Broken", </script>
</head><body><article><p>{}</p><p>{}</p></article></body></html>"#,
        paragraph, paragraph
    );

    Mock::given(method("GET"))
        .and(path("/recipe"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(page, "text/html"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/recipe", mock_server.uri());
    let mut ctx = seeded_context();
    let doc = fetch_document(&url, &fast_fetch_config(), &mut ctx)
        .await
        .unwrap();

    assert_eq!(doc.title.as_deref(), Some("Recipe"));
    assert_eq!(doc.metadata.description.as_deref(), Some("A tasty recipe"));
    assert_eq!(doc.metadata.structured_data.len(), 1);
    assert_eq!(doc.metadata.structured_data[0]["name"], "Soup");
    assert!(doc.metadata.technical.is_some());
    assert!(doc.text.contains("about structured data"));
    assert!(ctx.is_shut_down());
}

#[tokio::test]
async fn test_fetch_document_reports_exhaustion() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let url = format!("{}/down", mock_server.uri());
    let mut ctx = seeded_context();
    let result = fetch_document(&url, &fast_fetch_config(), &mut ctx).await;

    assert!(matches!(
        result,
        Err(SiftError::Fetch(FetchError::AllStrategiesExhausted { attempts: 1, .. }))
    ));
}

fn sent_header_names(transport: &ScriptedTransport) -> Vec<String> {
    transport
        .requests()
        .iter()
        .flat_map(|request| request.headers.iter().map(|(name, _)| name.to_ascii_lowercase()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_stealth_off_sends_baseline_headers_only() {
    let transport = ScriptedTransport::new(vec![Reply::Respond(html_response(
        URL,
        200,
        &good_page(),
    ))]);
    let mut ctx = seeded_context().with_transport(transport.clone());
    let config = FetchConfig {
        stealth: false,
        ..fast_fetch_config()
    };

    fetch_page(URL, &config, &mut ctx).await.unwrap();

    let names = sent_header_names(&transport);
    assert!(names.contains(&"user-agent".to_string()));
    assert!(names.contains(&"sec-fetch-mode".to_string()));
    assert!(!names.contains(&"dnt".to_string()));
    assert!(!names.iter().any(|name| name.starts_with("sec-ch-ua")));
}

#[tokio::test(start_paused = true)]
async fn test_stealth_on_sends_do_not_track() {
    let transport = ScriptedTransport::new(vec![Reply::Respond(html_response(
        URL,
        200,
        &good_page(),
    ))]);
    let mut ctx = seeded_context().with_transport(transport.clone());
    let config = FetchConfig {
        stealth: true,
        ..fast_fetch_config()
    };

    fetch_page(URL, &config, &mut ctx).await.unwrap();

    assert!(sent_header_names(&transport).contains(&"dnt".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_render_launch_follows_stealth_setting() {
    let launcher = FakeLauncher::serving(&good_page(), None);
    let mut ctx = seeded_context().with_render_launcher(launcher.clone());
    let config = FetchConfig {
        render_capable: true,
        stealth: false,
        ..fast_fetch_config()
    };

    fetch_page(URL, &config, &mut ctx).await.unwrap();

    let identity = launcher.log.last_identity.lock().unwrap().clone().unwrap();
    assert!(identity.header("DNT").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_thin_rendered_result_kept_when_plain_is_thinner() {
    let rendered = article_page(
        "Teaser",
        &["A short rendered teaser paragraph about widgets."],
        &[],
    );
    let plain = article_page("Plain", &["Just a brief note here."], &[]);
    let launcher = FakeLauncher::serving(&rendered, None);
    let transport = ScriptedTransport::new(vec![Reply::Respond(html_response(URL, 200, &plain))]);
    let mut ctx = seeded_context()
        .with_transport(transport.clone())
        .with_render_launcher(launcher);
    let config = FetchConfig {
        render_capable: true,
        ..fast_fetch_config()
    };

    let page = fetch_page(URL, &config, &mut ctx).await.unwrap();

    // Under the rendered threshold, so plain HTTP was still tried
    assert_eq!(transport.calls(), 1);
    assert!(page.text_length() < 100);
    assert!(page.result.rendered);
    assert!(page.text.contains("teaser"));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_document_links_follow_redirected_site() {
    let landing = "https://www.site.test/landing";
    let first = long_paragraph("redirects");
    let second = long_paragraph("canonical hosts");
    let body = article_page(
        "Landing",
        &[first.as_str(), second.as_str()],
        &["/next", "https://www.site.test/about", "https://site.test/old"],
    );
    let transport = ScriptedTransport::new(vec![Reply::Respond(html_response(
        landing, 200, &body,
    ))]);
    let mut ctx = seeded_context().with_transport(transport);

    let doc = fetch_document("https://site.test/", &fast_fetch_config(), &mut ctx)
        .await
        .unwrap();

    assert_eq!(doc.final_url, landing);
    assert_eq!(
        doc.links,
        vec![
            "https://www.site.test/next".to_string(),
            "https://www.site.test/about".to_string(),
        ]
    );
}
