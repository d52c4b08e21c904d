//! Well-known store keys.

/// Object served for the not-found page.
pub const NOT_FOUND_OBJECT: &str = "404_rewrite";
/// Object served for the server-error page.
pub const SERVER_ERROR_OBJECT: &str = "500_rewrite";
/// Object served for the JWKS endpoint.
pub const JWKS_OBJECT: &str = "jwks_rewrite";
/// Base path of the versioned static site.
pub const SITE_BASE_PATH: &str = "site_basePath";
/// Currently released site version. Written by the release process.
pub const SITE_VERSION: &str = "site_version";
/// Viewer prefix of the API origin.
pub const API_PATH: &str = "api_path";
/// Viewer prefix of the OAuth2 proxy origin.
pub const OAUTH2_PROXY_PATH: &str = "oauth2_proxyPath";
