//! End-to-end validation runs against mock sites

use rand::rngs::StdRng;
use rand::SeedableRng;
use sitemap_validator::report::{classify, IssueKind};
use sitemap_validator::score;
use sitemap_validator::{Config, SitemapValidator, ValidationResult};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = "<html><head><title>ok</title></head><body>hello</body></html>";

fn urlset(entries: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}\n</urlset>",
        entries.join("\n")
    )
}

async fn mount(server: &MockServer, at: &str, status: u16, body: &str, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body.to_string(), content_type))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, extra: &str) {
    let robots = format!(
        "User-agent: *\n{}\nSitemap: {}/sitemap.xml\n",
        extra,
        server.uri()
    );
    mount(server, "/robots.txt", 200, &robots, "text/plain").await;
}

async fn validate(server: &MockServer, sitemap_path: &str, samples: usize) -> ValidationResult {
    let mut config = Config::default();
    config.validator.sample_urls_count = samples;
    let validator = SitemapValidator::new(config).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let url = format!("{}{}", server.uri(), sitemap_path);
    assert_ok!(validator.validate_with_rng(&url, &mut rng).await)
}

/// A one-entry site whose sitemap entry carries the given optional fields
async fn single_entry_site(fields: &str) -> MockServer {
    let server = MockServer::start().await;
    let entry = format!("<url><loc>{}/</loc>{}</url>", server.uri(), fields);
    mount(
        &server,
        "/sitemap.xml",
        200,
        &urlset(&[entry]),
        "application/xml; charset=utf-8",
    )
    .await;
    mount_robots(&server, "").await;
    mount(&server, "/", 200, PAGE, "text/html; charset=utf-8").await;
    server
}

#[tokio::test]
async fn scenario_a_complete_entry() {
    let full = single_entry_site(
        "<lastmod>2025-04-01</lastmod><changefreq>weekly</changefreq><priority>1.0</priority>",
    )
    .await;
    let result = validate(&full, "/sitemap.xml", 5).await;

    assert_eq!(result.http_status, Some(200));
    assert!(result.valid_xml);
    assert!(result.valid_mime_type);
    assert!(result.encoding_utf8);
    assert!(result.valid_root_element);
    assert!(result.has_lastmod);
    assert_eq!(result.has_changefreq, Some(true));
    assert_eq!(result.has_priority, Some(true));
    assert_eq!(result.has_invalid_lastmod, Some(false));
    assert_eq!(result.has_invalid_changefreq, Some(false));
    assert_eq!(result.has_invalid_priority, Some(false));
    assert!(result.robots_txt_accessible);
    assert!(result.robots_txt_reference);
    assert_eq!(result.url_sample_status.len(), 1);
    assert!(result.url_sample_status[0].is_indexable());
    assert!(result.errors.is_empty(), "unexpected: {:?}", result.errors);

    let bare = single_entry_site("").await;
    let bare_result = validate(&bare, "/sitemap.xml", 5).await;

    assert!(!bare_result.has_lastmod);
    assert_eq!(bare_result.has_changefreq, Some(false));
    assert!(result.sitemap_score.unwrap() > bare_result.sitemap_score.unwrap());
}

#[tokio::test]
async fn scenario_b_invalid_lastmod() {
    let valid = single_entry_site(
        "<lastmod>2025-04-01</lastmod><changefreq>weekly</changefreq><priority>1.0</priority>",
    )
    .await;
    let invalid = single_entry_site(
        "<lastmod>04/01/2025</lastmod><changefreq>weekly</changefreq><priority>1.0</priority>",
    )
    .await;

    let a = validate(&valid, "/sitemap.xml", 5).await;
    let b = validate(&invalid, "/sitemap.xml", 5).await;

    assert!(b.has_lastmod);
    assert_eq!(b.has_invalid_lastmod, Some(true));
    assert!(b.errors.iter().any(|e| e.contains("04/01/2025")));

    let issues = classify(&b);
    assert!(issues
        .critical
        .iter()
        .any(|issue| issue.kind == IssueKind::InvalidLastmod));

    let earned_a = score::score(&a).earned;
    let earned_b = score::score(&b).earned;
    assert_eq!(earned_a - earned_b, 10.0);
}

#[tokio::test]
async fn scenario_c_sitemap_index() {
    let server = MockServer::start().await;
    let index = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n\
         <sitemap><loc>{0}/sitemap1.xml</loc><lastmod>2025-04-01</lastmod></sitemap>\n\
         <sitemap><loc>{0}/sitemap2.xml</loc></sitemap>\n\
         </sitemapindex>",
        server.uri()
    );
    mount(&server, "/sitemap.xml", 200, &index, "application/xml").await;
    mount_robots(&server, "").await;

    let result = validate(&server, "/sitemap.xml", 5).await;

    assert!(result.is_sitemap_index);
    assert!(result.valid_root_element);
    assert_eq!(result.url_count, 2);
    assert_eq!(result.unique_url_count, 2);
    assert!(result.has_lastmod);
    assert_eq!(result.has_changefreq, None);
    assert_eq!(result.has_priority, None);
    assert_eq!(result.has_invalid_priority, None);
    assert!(result.extensions.is_none());
    assert!(result.url_sample_status.is_empty());

    let breakdown = score::score(&result);
    assert!(!breakdown
        .criteria
        .iter()
        .any(|c| c.name == "Has priority" || c.name == "Has changefreq"));
    assert!(breakdown.penalties.is_empty());

    let issues = classify(&result);
    assert!(!issues.has(IssueKind::MissingPriority));
    assert!(!issues.has(IssueKind::MissingChangefreq));
}

#[tokio::test]
async fn scenario_d_not_found() {
    let server = MockServer::start().await;
    mount(&server, "/sitemap.xml", 404, "gone", "text/plain").await;

    let result = validate(&server, "/sitemap.xml", 5).await;

    assert_eq!(result.http_status, Some(404));
    assert!(!result.valid_xml);
    assert!(!result.robots_txt_accessible);
    assert!(result.url_sample_status.is_empty());
    assert!(result.sitemap_score.is_none());

    let issues = classify(&result);
    assert_eq!(issues.critical.len(), 1);
    assert!(issues.critical[0].message.contains("404"));
    assert!(issues.warnings.is_empty());
}

#[tokio::test]
async fn scenario_e_robots_block() {
    let server = MockServer::start().await;
    let entries = vec![
        format!("<url><loc>{}/private/page</loc></url>", server.uri()),
        format!("<url><loc>{}/public</loc></url>", server.uri()),
    ];
    mount(&server, "/sitemap.xml", 200, &urlset(&entries), "text/xml").await;
    mount_robots(&server, "Disallow: /private").await;
    mount(&server, "/private/page", 200, PAGE, "text/html").await;
    mount(&server, "/public", 200, PAGE, "text/html").await;

    let result = validate(&server, "/sitemap.xml", 5).await;
    assert_eq!(result.url_sample_status.len(), 2);

    let private = &result.url_sample_status[0];
    let public = &result.url_sample_status[1];
    assert!(private.url.ends_with("/private/page"));
    assert!(private.blocked_by_robots);
    assert_eq!(private.http_status, Some(200));
    assert!(!public.blocked_by_robots);
    assert!(public.is_indexable());

    assert!(result
        .errors
        .iter()
        .any(|e| e.contains("blocked by robots.txt") && e.ends_with("/private/page")));

    let issues = classify(&result);
    assert!(issues.has(IssueKind::SampleBlocked));
    assert_eq!(issues.problem_urls.len(), 1);
}

#[tokio::test]
async fn noindex_samples_are_flagged() {
    let server = MockServer::start().await;
    let entries = vec![
        format!("<url><loc>{}/meta</loc></url>", server.uri()),
        format!("<url><loc>{}/header</loc></url>", server.uri()),
    ];
    mount(&server, "/sitemap.xml", 200, &urlset(&entries), "application/xml").await;
    mount_robots(&server, "").await;
    mount(
        &server,
        "/meta",
        200,
        "<html><head><meta name=\"robots\" content=\"NOINDEX, follow\"></head></html>",
        "text/html",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/header"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-robots-tag", "noindex")
                .set_body_raw(PAGE, "text/html"),
        )
        .mount(&server)
        .await;

    let result = validate(&server, "/sitemap.xml", 5).await;

    assert!(result.url_sample_status[0].has_noindex_meta);
    assert!(result.url_sample_status[1].has_noindex_header);
    assert!(classify(&result).has(IssueKind::SampleNoindex));
}

#[tokio::test]
async fn repeated_runs_agree() {
    let server = single_entry_site("<lastmod>2025-04-01</lastmod>").await;

    let first = validate(&server, "/sitemap.xml", 5).await;
    let second = validate(&server, "/sitemap.xml", 5).await;

    assert_eq!(first.sitemap_score, second.sitemap_score);
    assert_eq!(first.sitemap_grade, second.sitemap_grade);
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.url_sample_status, second.url_sample_status);
}

#[tokio::test]
async fn rejected_input_never_fetches() {
    let validator = SitemapValidator::new(Config::default()).unwrap();
    assert_err!(validator.validate("javascript:alert(1)").await);
    assert_err!(validator.validate("").await);
}
