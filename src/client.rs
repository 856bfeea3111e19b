//! Entry point tying credentials, configuration and endpoints together.

use log::debug;
use std::sync::Arc;

use crate::api::{Api, Brand, Endpoint, Order, Product, Reason};
use crate::config::{ApiVersion, ClientConfig, Credentials};
use crate::error::Result;
use crate::http::cache::{FilesystemCache, ResponseCache};
use crate::http::{
    AuthMethod, AuthMiddleware, CacheMiddleware, ErrorMiddleware, HttpClient, Middleware,
};

/// API client authenticated with the client-credentials grant.
///
/// ```no_run
/// # async fn run() -> meup_client::Result<()> {
/// let client = meup_client::Client::new("1_client_id", "secret", "latest")?;
/// let order = client.orders().find("FA-2015-01").await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    credentials: Credentials,
    config: ClientConfig,
    cache: Option<Arc<dyn ResponseCache>>,
    auth: Option<Arc<AuthMiddleware>>,
    http: HttpClient,
}

impl Client {
    /// Client against the default base URL.
    ///
    /// Fails with `InvalidArgument` on empty credentials or an unknown `version`.
    pub fn new(client_id: &str, client_secret: &str, version: &str) -> Result<Self> {
        let credentials = Credentials::new(client_id, client_secret)?;
        let version: ApiVersion = version.parse()?;
        Self::with_config(credentials, ClientConfig::new().with_api_version(version))
    }

    /// Client with explicit configuration. A `cache_dir` enables the filesystem cache.
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let cache = config
            .cache_dir
            .as_ref()
            .map(|dir| Arc::new(FilesystemCache::new(dir)) as Arc<dyn ResponseCache>);
        Self::build(credentials, config, cache)
    }

    /// Client caching GET responses in `cache`, whatever `cache_dir` says.
    ///
    /// Entries are keyed by client id, so one cache can serve several accounts.
    pub fn with_cache(
        credentials: Credentials,
        config: ClientConfig,
        cache: Arc<dyn ResponseCache>,
    ) -> Result<Self> {
        Self::build(credentials, config, Some(cache))
    }

    fn build(
        credentials: Credentials,
        config: ClientConfig,
        cache: Option<Arc<dyn ResponseCache>>,
    ) -> Result<Self> {
        let transport = HttpClient::transport(&config)?;
        let auth = Arc::new(AuthMiddleware::new(
            transport.clone(),
            config.base_url.clone(),
            credentials.clone(),
            Some(AuthMethod::ClientCredentials),
        ));

        let mut chain: Vec<Arc<dyn Middleware>> = vec![Arc::clone(&auth) as Arc<dyn Middleware>];
        if let Some(cache) = &cache {
            chain.push(Arc::new(
                CacheMiddleware::new(Arc::clone(cache)).with_namespace(&credentials.client_id),
            ));
        }
        chain.push(Arc::new(ErrorMiddleware::new(config.api_limit)));

        let http = HttpClient::with_transport(transport, &config, chain)?;
        Ok(Self {
            credentials,
            config,
            cache,
            auth: Some(auth),
            http,
        })
    }

    /// Endpoint selected at runtime.
    pub fn api(&self, api: Api) -> Endpoint<'_> {
        Endpoint::new(self, api)
    }

    /// Endpoint selected by name (`order`, `product`, `reason`, `brand`).
    pub fn api_by_name(&self, name: &str) -> Result<Endpoint<'_>> {
        Ok(self.api(name.parse()?))
    }

    pub fn orders(&self) -> Order<'_> {
        Order::new(self)
    }

    pub fn products(&self) -> Product<'_> {
        Product::new(self)
    }

    pub fn brands(&self) -> Brand<'_> {
        Brand::new(self)
    }

    pub fn reasons(&self) -> Reason<'_> {
        Reason::new(self)
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http
    }

    /// Replaces the HTTP client, for instance to run a custom middleware chain.
    ///
    /// `auth` is the token holder of the new chain, if it has one; it is what
    /// [`clear_token`](Self::clear_token) resets from then on.
    pub fn set_http_client(&mut self, http: HttpClient, auth: Option<Arc<AuthMiddleware>>) {
        self.http = http;
        self.auth = auth;
    }

    pub fn set_headers(&mut self, headers: &[(&str, &str)]) -> Result<()> {
        self.http.set_headers(headers)
    }

    pub fn clear_headers(&mut self) {
        self.http.clear_headers();
    }

    /// Switches to another client id / secret pair.
    ///
    /// Custom headers survive; the cached token does not. The response cache
    /// is kept, and its entries for the previous account stay out of reach.
    /// A chain installed with [`set_http_client`](Self::set_http_client) is
    /// replaced by the default one.
    pub fn authenticate(&mut self, client_id: &str, client_secret: &str) -> Result<()> {
        let credentials = Credentials::new(client_id, client_secret)?;
        debug!("Re-authenticating as client {}", credentials.client_id);

        let headers = self.http.headers().clone();
        let mut rebuilt = Self::build(credentials, self.config.clone(), self.cache.clone())?;
        rebuilt.http.merge_headers(headers);
        *self = rebuilt;
        Ok(())
    }

    /// Forgets the bearer token so the next request fetches a new one.
    pub async fn clear_token(&self) {
        match &self.auth {
            Some(auth) => auth.clear_token().await,
            None => debug!("No token to clear, the HTTP client has no auth middleware"),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api_version(&self) -> ApiVersion {
        self.config.api_version
    }

    pub fn supported_api_versions() -> &'static [ApiVersion] {
        ApiVersion::all()
    }

    pub fn api_list() -> &'static [Api] {
        Api::all()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::http::cache::MemoryCache;
    use mockito::{Matcher, Server};
    use tempfile::tempdir;

    #[test]
    fn test_new_validates_credentials() {
        let err = Client::new("", "secret", "latest").err().unwrap();
        assert!(matches!(err, ApiError::InvalidArgument(m) if m == "You need to specify yours credentials!"));
    }

    #[test]
    fn test_new_validates_version() {
        let err = Client::new("id", "secret", "3.0").err().unwrap();
        assert!(matches!(err, ApiError::InvalidArgument(m) if m == "You need to specify a valid Api version!"));

        let client = Client::new("id", "secret", "1.0").unwrap();
        assert_eq!(client.api_version(), ApiVersion::V1);
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            Client::supported_api_versions(),
            &[ApiVersion::Latest, ApiVersion::V1]
        );
        assert_eq!(
            Client::api_list(),
            &[Api::Order, Api::Product, Api::Reason, Api::Brand]
        );
    }

    #[test]
    fn test_api_by_name() {
        let client = Client::new("id", "secret", "latest").unwrap();
        assert!(matches!(client.api(Api::Brand), Endpoint::Brand(_)));
        assert_eq!(client.api_by_name("product").unwrap().kind(), Api::Product);
        assert!(matches!(
            client.api_by_name("invoices"),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_chain_without_cache() {
        let client = Client::new("id", "secret", "latest").unwrap();
        let names: Vec<&str> = client.http_client().middleware().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["auth", "error"]);
    }

    #[test]
    fn test_chain_with_cache_dir() {
        let dir = tempdir().unwrap();
        let config = ClientConfig::new().with_cache_dir(dir.path());
        let client = Client::with_config(Credentials::new("id", "secret").unwrap(), config).unwrap();
        let names: Vec<&str> = client.http_client().middleware().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["auth", "cache", "error"]);
    }

    #[tokio::test]
    async fn test_token_is_reused_across_requests() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("GET", "/oauth/v2/token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("client_id".into(), "1_client".into()),
                Matcher::UrlEncoded("client_secret".into(), "secret".into()),
                Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token": "abc", "expires_in": 3600}"#)
            .expect(1)
            .create_async()
            .await;
        let brands = server
            .mock("GET", "/api/brands")
            .match_header("authorization", "Bearer abc")
            .with_status(200)
            .with_body("[]")
            .expect(2)
            .create_async()
            .await;

        let client = Client::with_config(
            Credentials::new("1_client", "secret").unwrap(),
            ClientConfig::new().with_base_url(server.url()),
        )
        .unwrap();
        client.brands().all().await.unwrap();
        client.brands().all().await.unwrap();

        token.assert_async().await;
        brands.assert_async().await;
    }

    #[tokio::test]
    async fn test_clear_token_fetches_a_new_one() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("GET", "/oauth/v2/token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"access_token": "abc", "expires_in": 3600}"#)
            .expect(2)
            .create_async()
            .await;
        let client = Client::with_config(
            Credentials::new("1_client", "secret").unwrap(),
            ClientConfig::new().with_base_url(server.url()),
        )
        .unwrap();
        let _brands = server
            .mock("GET", "/api/brands")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        client.brands().all().await.unwrap();
        client.clear_token().await;
        client.brands().all().await.unwrap();

        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let mut server = Server::new_async().await;
        let _token = server
            .mock("GET", "/oauth/v2/token")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error": "invalid_client"}"#)
            .create_async()
            .await;

        let client = Client::with_config(
            Credentials::new("1_client", "wrong").unwrap(),
            ClientConfig::new().with_base_url(server.url()),
        )
        .unwrap();
        let result = client.reasons().all().await;

        assert!(matches!(result, Err(ApiError::AuthenticationFailed(m)) if m == "Invalid credentials"));
    }

    #[tokio::test]
    async fn test_custom_headers_survive_authenticate() {
        let mut server = Server::new_async().await;
        let _token = server
            .mock("GET", "/oauth/v2/token")
            .match_query(Matcher::UrlEncoded("client_id".into(), "2_other".into()))
            .with_status(200)
            .with_body(r#"{"access_token": "other-token"}"#)
            .create_async()
            .await;
        let brands = server
            .mock("GET", "/api/brands")
            .match_header("authorization", "Bearer other-token")
            .match_header("x-shop", "42")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let mut client = Client::with_config(
            Credentials::new("1_client", "secret").unwrap(),
            ClientConfig::new().with_base_url(server.url()),
        )
        .unwrap();
        client.set_headers(&[("X-Shop", "42")]).unwrap();
        client.authenticate("2_other", "other-secret").unwrap();
        client.brands().all().await.unwrap();

        brands.assert_async().await;
        assert_eq!(client.credentials().client_id, "2_other");
    }

    #[tokio::test]
    async fn test_not_modified_is_served_from_cache() {
        let mut server = Server::new_async().await;
        let _token = server
            .mock("GET", "/oauth/v2/token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"access_token": "abc"}"#)
            .create_async()
            .await;
        let fresh = server
            .mock("GET", "/api/brands")
            .match_header("if-modified-since", Matcher::Missing)
            .with_status(200)
            .with_header("etag", "\"v1\"")
            .with_body(r#"[{"id": 1}]"#)
            .expect(1)
            .create_async()
            .await;
        let not_modified = server
            .mock("GET", "/api/brands")
            .match_header("if-none-match", "\"v1\"")
            .with_status(304)
            .expect(1)
            .create_async()
            .await;

        let cache = Arc::new(MemoryCache::new());
        let client = Client::with_cache(
            Credentials::new("1_client", "secret").unwrap(),
            ClientConfig::new().with_base_url(server.url()),
            cache.clone(),
        )
        .unwrap();

        let first = client.brands().all().await.unwrap();
        let second = client.brands().all().await.unwrap();

        fresh.assert_async().await;
        not_modified.assert_async().await;
        assert_eq!(first, second);
        assert_eq!(client.http_client().last_response().unwrap().status(), 200);
        assert!(cache.has("1_client:api/brands"));
    }

    #[tokio::test]
    async fn test_filtered_orders_with_cache_dir() {
        let mut server = Server::new_async().await;
        let _token = server
            .mock("GET", "/oauth/v2/token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"access_token": "abc"}"#)
            .create_async()
            .await;
        let orders = server
            .mock("GET", "/api/orders")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"_embedded": {"items": [{"id": "FA-1"}]}}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let client = Client::with_config(
            Credentials::new("1_client", "secret").unwrap(),
            ClientConfig::new()
                .with_base_url(server.url())
                .with_cache_dir(dir.path()),
        )
        .unwrap();
        let params = [
            ("status", "awaiting_preparation"),
            ("created_after", "2024-01-01T00:00:00+01:00"),
            ("created_before", "2024-12-31T23:59:59+01:00"),
            ("limit", "100"),
            ("page", "12"),
        ];

        let result = client.orders().all(&params).await.unwrap();

        orders.assert_async().await;
        assert_eq!(result["_embedded"]["items"][0]["id"], "FA-1");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_does_not_reuse_previous_account_cache() {
        let mut server = Server::new_async().await;
        let _token = server
            .mock("GET", "/oauth/v2/token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"access_token": "abc"}"#)
            .create_async()
            .await;
        let fresh = server
            .mock("GET", "/api/orders")
            .match_header("if-modified-since", Matcher::Missing)
            .match_header("if-none-match", Matcher::Missing)
            .with_status(200)
            .with_header("etag", "\"v1\"")
            .with_body(r#"{"_embedded": {"items": []}}"#)
            .expect(2)
            .create_async()
            .await;
        let not_modified = server
            .mock("GET", "/api/orders")
            .match_header("if-none-match", "\"v1\"")
            .with_status(304)
            .expect(0)
            .create_async()
            .await;

        let cache = Arc::new(MemoryCache::new());
        let mut client = Client::with_cache(
            Credentials::new("1_client", "secret").unwrap(),
            ClientConfig::new().with_base_url(server.url()),
            cache.clone(),
        )
        .unwrap();

        client.orders().all(&[]).await.unwrap();
        client.authenticate("2_other", "other-secret").unwrap();
        client.orders().all(&[]).await.unwrap();

        fresh.assert_async().await;
        not_modified.assert_async().await;
        assert!(cache.has("1_client:api/orders"));
        assert!(cache.has("2_other:api/orders"));
    }

    #[tokio::test]
    async fn test_clear_token_targets_the_installed_chain() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("GET", "/oauth/v2/token")
            .match_query(Matcher::UrlEncoded("client_id".into(), "3_custom".into()))
            .with_status(200)
            .with_body(r#"{"access_token": "custom", "expires_in": 3600}"#)
            .expect(2)
            .create_async()
            .await;
        let _brands = server
            .mock("GET", "/api/brands")
            .match_header("authorization", "Bearer custom")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let config = ClientConfig::new().with_base_url(server.url());
        let mut client =
            Client::with_config(Credentials::new("1_client", "secret").unwrap(), config.clone())
                .unwrap();

        let transport = HttpClient::transport(&config).unwrap();
        let auth = Arc::new(AuthMiddleware::new(
            transport.clone(),
            server.url(),
            Credentials::new("3_custom", "custom-secret").unwrap(),
            Some(AuthMethod::ClientCredentials),
        ));
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::clone(&auth) as Arc<dyn Middleware>];
        let http = HttpClient::with_transport(transport, &config, chain).unwrap();
        client.set_http_client(http, Some(auth));

        client.brands().all().await.unwrap();
        client.clear_token().await;
        client.brands().all().await.unwrap();

        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_clear_token_without_auth_middleware() {
        let config = ClientConfig::new();
        let mut client =
            Client::with_config(Credentials::new("1_client", "secret").unwrap(), config.clone())
                .unwrap();
        client.set_http_client(HttpClient::new(&config, vec![]).unwrap(), None);

        client.clear_token().await;
        assert!(client.http_client().middleware().is_empty());
    }
}
