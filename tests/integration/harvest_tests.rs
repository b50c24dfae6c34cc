//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a manifest and results pages and run
//! the full resolve, fetch, aggregate and render cycle over real HTTP.

use std::sync::Arc;
use tally_harvest::config::Config;
use tally_harvest::crawler::{Harvester, HttpFetcher};
use tally_harvest::output::{format_csv, write_harvest};
use tally_harvest::{HarvestError, ManifestError};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, workers: usize) -> Config {
    let mut config = Config::default();
    config.source.manifest_url = format!("{}/js/tree.js", base_url);
    config.source.page_url_template = format!("{}/P1/n{{id}}.html", base_url);
    config.pool.workers = workers;
    config.http.user_agent = "TestHarvester/1.0".to_string();
    config.http.timeout_secs = 5;
    config
}

fn harvester(config: Config) -> Harvester {
    let fetcher = HttpFetcher::from_config(&config.http).expect("Failed to build fetcher");
    Harvester::new(config, Arc::new(fetcher))
}

/// Builds a results page with one `trT` row per (number, candidates, ballots, percentage)
fn results_page(rows: &[(&str, &str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(number, candidates, ballots, percentage)| {
            format!(
                r#"<tr class="trT"><td><img src="x.png"></td><td>{}</td><td>{}</td><td></td><td>{}</td><td>{}</td></tr>"#,
                number, candidates, ballots, percentage
            )
        })
        .collect();
    format!(
        r#"<html><body><div id="divContent"><table>
        <tr class="title"><td></td><td>號次</td><td>候選人</td><td></td><td>得票數</td><td>得票率%</td></tr>
        {}
        </table></div></body></html>"#,
        body
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_full_harvest_with_failing_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let manifest = "\
        secAreaID[0][0]='100';secAreaID[0][1]='101';secAreaID[0][2]='102';\n\
        secAreaID[1][0]='200';secAreaID[1][1]='201';\n\
        secAreaName[0][0]='臺北市';secAreaName[0][1]='松山區';secAreaName[0][2]='信義區';\n\
        secAreaName[1][0]='新北市';secAreaName[1][1]='板橋區';\n";

    Mock::given(method("GET"))
        .and(path("/js/tree.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(manifest))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/P1/n101.html"))
        .respond_with(html(results_page(&[
            ("1", "Alice<br/>Party X", "12,345", "55.10"),
            ("2", "Bob<br/>Party Y", "10,061", "44.90"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Counted but not yet published: no rows
    Mock::given(method("GET"))
        .and(path("/P1/n102.html"))
        .respond_with(html(results_page(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/P1/n201.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Group headers are never fetched
    for header in ["/P1/n100.html", "/P1/n200.html"] {
        Mock::given(method("GET"))
            .and(path(header))
            .respond_with(html(results_page(&[])))
            .expect(0)
            .mount(&mock_server)
            .await;
    }

    let mut config = create_test_config(&base_url, 2);
    config.output.ordered = true;

    let harvest = harvester(config).run().await.expect("Harvest failed");

    // Header plus the two rows of n101
    assert_eq!(harvest.rows().len(), 3);
    assert_eq!(harvest.jobs_succeeded(), 2);
    assert_eq!(harvest.jobs_failed(), 1);

    let failure = &harvest.failures()[0];
    assert_eq!(failure.area.id, "201");
    assert_eq!(failure.area.name, "板橋區");
    assert_eq!(failure.locator, format!("{}/P1/n201.html", base_url));

    let csv = format_csv(&harvest);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "縣市,鄉鎮市區,號次,總統/副總統,得票數,得票率%");
    assert_eq!(lines[1], "臺北市,松山區,1,Alice/Party X,12345,55.10");
    assert_eq!(lines[2], "臺北市,松山區,2,Bob/Party Y,10061,44.90");
}

#[tokio::test]
async fn test_manifest_failure_aborts_before_any_page_fetch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/js/tree.js"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/P1/.*"))
        .respond_with(html(results_page(&[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = harvester(create_test_config(&base_url, 4)).run().await;
    assert!(
        matches!(result, Err(HarvestError::Status { status: 404, .. })),
        "unexpected result: {:?}",
        result.map(|h| h.rows().len())
    );
}

#[tokio::test]
async fn test_structurally_broken_manifest_is_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/js/tree.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("secAreaID[0][0]='1';secAreaName[0][0]='A';secAreaName[0][9]='B';"),
        )
        .mount(&mock_server)
        .await;

    let result = harvester(create_test_config(&base_url, 4)).run().await;
    assert!(matches!(
        result,
        Err(HarvestError::Manifest(ManifestError::UnknownArea {
            group: 0,
            member: 9
        }))
    ));
}

#[tokio::test]
async fn test_many_areas_collected_exactly_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let groups = 6;
    let members = 12;
    let mut manifest = String::new();
    for i in 0..groups {
        manifest.push_str(&format!("secAreaID[{}][0]='{}';", i, i * 100));
        manifest.push_str(&format!("secAreaName[{}][0]='Group{}';", i, i));
        for j in 1..=members {
            let id = i * 100 + j;
            manifest.push_str(&format!("secAreaID[{}][{}]='{}';", i, j, id));
            manifest.push_str(&format!("secAreaName[{}][{}]='Area{}';", i, j, id));
        }
    }

    Mock::given(method("GET"))
        .and(path("/js/tree.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(manifest))
        .mount(&mock_server)
        .await;

    // Every page has the same two rows
    Mock::given(method("GET"))
        .and(path_regex(r"^/P1/n\d+\.html$"))
        .respond_with(html(results_page(&[
            ("1", "A", "1,000", "50.00"),
            ("2", "B", "1,000", "50.00"),
        ])))
        .expect((groups * members) as u64)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, 8);
    config.output.ordered = true;

    let harvest = harvester(config).run().await.expect("Harvest failed");

    assert_eq!(harvest.rows().len(), 1 + 2 * groups * members);
    assert_eq!(harvest.jobs_succeeded(), groups * members);
    assert_eq!(harvest.jobs_failed(), 0);

    // Ordered output follows the manifest: group by group, row by row
    let districts: Vec<&str> = harvest
        .records()
        .iter()
        .step_by(2)
        .map(|r| r.district.as_str())
        .collect();
    assert_eq!(districts[0], "Area1");
    assert_eq!(districts[members], "Area101");
    assert!(harvest
        .records()
        .iter()
        .all(|r| r.division.starts_with("Group") && r.ballots == "1000"));
}

#[tokio::test]
async fn test_write_harvest_to_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/js/tree.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "secAreaID[0][0]='1';secAreaID[0][1]='2';secAreaName[0][0]='CityA';secAreaName[0][1]='DistrictA';",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/P1/n2.html"))
        .respond_with(html(results_page(&[("1", "Alice<br/>Party X", "12,345", "100.00")])))
        .mount(&mock_server)
        .await;

    let harvest = harvester(create_test_config(&base_url, 1))
        .run()
        .await
        .expect("Harvest failed");

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out_path = dir.path().join("tally.csv");
    write_harvest(&harvest, Some(&out_path)).expect("Failed to write CSV");

    let written = std::fs::read_to_string(&out_path).expect("Failed to read CSV");
    assert_eq!(
        written,
        "縣市,鄉鎮市區,號次,總統/副總統,得票數,得票率%\nCityA,DistrictA,1,Alice/Party X,12345,100.00\n"
    );
}
