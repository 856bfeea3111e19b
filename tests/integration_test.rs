use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Matcher, Server, ServerGuard};
use tempfile::tempdir;

fn mock_token(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("GET", "/oauth/v2/token")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client_id".into(), "1_client".into()),
            Matcher::UrlEncoded("client_secret".into(), "secret".into()),
            Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "cli-token", "expires_in": 3600}"#)
        .create()
}

/// `meup` pointed at `url`, isolated from the caller's environment.
fn meup(url: &str) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("meup"));
    cmd.env_remove("MEUP_CLIENT_ID")
        .env_remove("MEUP_CLIENT_SECRET")
        .env_remove("MEUP_BASE_URL")
        .env_remove("MEUP_CACHE_DIR")
        .arg("--base-url")
        .arg(url)
        .arg("--client-id")
        .arg("1_client")
        .arg("--client-secret")
        .arg("secret");
    cmd
}

#[test]
fn test_reasons_prints_json() {
    let mut server = Server::new();
    let url = server.url();
    let token = mock_token(&mut server);
    let reasons = server
        .mock("GET", "/api/sav/reasons")
        .match_header("authorization", "Bearer cli-token")
        .match_header("accept", "application/json;version=latest")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id": 1, "label": "Damaged parcel"}]"#)
        .create();

    meup(&url)
        .arg("reasons")
        .assert()
        .success()
        .stdout(predicates::str::contains("Damaged parcel"));

    token.assert();
    reasons.assert();
}

#[test]
fn test_orders_list_all_follows_pagination() {
    let mut server = Server::new();
    let url = server.url();
    let _token = mock_token(&mut server);
    let _first = server
        .mock("GET", "/api/orders")
        .with_status(200)
        .with_body(
            r#"{
                "page": 1,
                "_links": {"next": {"href": "/api/orders?page=2"}},
                "_embedded": {"items": [{"id": "FA-1"}, {"id": "FA-2"}]}
            }"#,
        )
        .create();
    let second = server
        .mock("GET", "/api/orders?page=2")
        .with_status(200)
        .with_body(
            r#"{
                "page": 2,
                "_links": {"previous": {"href": "/api/orders"}},
                "_embedded": {"items": [{"id": "FA-3"}]}
            }"#,
        )
        .create();

    meup(&url)
        .args(["orders", "list", "--all"])
        .assert()
        .success()
        .stdout(predicates::str::contains("FA-1"))
        .stdout(predicates::str::contains("FA-3"));

    second.assert();
}

#[test]
fn test_product_destock_by_ean() {
    let mut server = Server::new();
    let url = server.url();
    let _token = mock_token(&mut server);
    let destock = server
        .mock("POST", "/api/product/ean/3700281702385/destock")
        .match_body(Matcher::Json(serde_json::json!({"quantity": 2})))
        .with_status(200)
        .with_body(r#"{"quantity": 7}"#)
        .create();

    meup(&url)
        .args(["products", "destock", "3700281702385", "2", "--by", "ean"])
        .assert()
        .success()
        .stdout(predicates::str::contains("7"));

    destock.assert();
}

#[test]
fn test_api_error_fails_with_message() {
    let mut server = Server::new();
    let url = server.url();
    let _token = mock_token(&mut server);
    let _order = server
        .mock("GET", "/api/orders/unknown")
        .with_status(400)
        .with_body(r#"{"message": "Invalid order identifier"}"#)
        .create();

    meup(&url)
        .args(["orders", "show", "unknown"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Failed to fetch order unknown"))
        .stderr(predicates::str::contains("Invalid order identifier"));
}

#[test]
fn test_missing_credentials_fail_before_any_request() {
    let mut server = Server::new();
    let token = server
        .mock("GET", "/oauth/v2/token")
        .match_query(Matcher::Any)
        .expect(0)
        .create();

    Command::new(cargo::cargo_bin!("meup"))
        .env_remove("MEUP_CLIENT_ID")
        .env_remove("MEUP_CLIENT_SECRET")
        .arg("--base-url")
        .arg(server.url())
        .arg("reasons")
        .assert()
        .failure()
        .stderr(predicates::str::contains("yours credentials"));

    token.assert();
}

#[test]
fn test_credentials_from_environment() {
    let mut server = Server::new();
    let url = server.url();
    let _token = mock_token(&mut server);
    let _brands = server
        .mock("GET", "/api/brands")
        .with_status(200)
        .with_body(r#"{"_embedded": {"items": [{"name": "Avène"}]}}"#)
        .create();

    Command::new(cargo::cargo_bin!("meup"))
        .env("MEUP_CLIENT_ID", "1_client")
        .env("MEUP_CLIENT_SECRET", "secret")
        .env("MEUP_BASE_URL", &url)
        .env_remove("MEUP_CACHE_DIR")
        .args(["brands", "list"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Avène"));
}

#[test]
fn test_cache_dir_is_populated() {
    let mut server = Server::new();
    let url = server.url();
    let _token = mock_token(&mut server);
    let _brands = server
        .mock("GET", "/api/brands")
        .with_status(200)
        .with_header("etag", "\"v1\"")
        .with_body("[]")
        .create();

    let cache = tempdir().unwrap();
    meup(&url)
        .arg("--cache")
        .arg(cache.path())
        .args(["brands", "list"])
        .assert()
        .success();

    let entries = std::fs::read_dir(cache.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn test_apis_needs_no_credentials() {
    Command::new(cargo::cargo_bin!("meup"))
        .env_remove("MEUP_CLIENT_ID")
        .env_remove("MEUP_CLIENT_SECRET")
        .arg("apis")
        .assert()
        .success()
        .stdout(predicates::str::contains("\"order\""))
        .stdout(predicates::str::contains("\"1.0\""));
}
