use anyhow::Result;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

use super::paths::{expand_tilde, size_cache_dir};
use crate::archive::TarExtractor;
use crate::fork::ForkRegistry;
use crate::http::HttpClient;
use crate::release::{GitHubReleases, SizeCache};
use crate::runtime::Runtime;

/// What the command line provides before any defaults are resolved.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub extract_dir: PathBuf,
    pub output_dir: PathBuf,
    pub api_url: Option<String>,
    pub github_url: Option<String>,
}

/// Everything a command needs, built once per run.
pub struct Config<R: Runtime + 'static> {
    pub runtime: Arc<R>,
    pub registry: ForkRegistry,
    pub http: HttpClient,
    pub releases: GitHubReleases<R>,
    pub extractor: TarExtractor,
    pub extract_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl<R: Runtime + 'static> Config<R> {
    pub fn new(runtime: R, settings: Settings) -> Result<Self> {
        let runtime = Arc::new(runtime);

        let token = runtime.env_var("GITHUB_TOKEN").ok();
        if let Some(token) = token.as_deref() {
            debug!("Using GITHUB_TOKEN for authentication: {}", mask(token));
        }
        let http = HttpClient::with_token(token.as_deref())?;

        let sizes = SizeCache::new(Arc::clone(&runtime), size_cache_dir(&*runtime)?);
        let releases = GitHubReleases::new(
            http.clone(),
            settings.api_url,
            settings.github_url,
            sizes,
        );

        let extract_dir = expand_tilde(&*runtime, &settings.extract_dir)?;
        let output_dir = expand_tilde(&*runtime, &settings.output_dir)?;
        debug!("Extract dir: {:?}, output dir: {:?}", extract_dir, output_dir);

        Ok(Self {
            runtime,
            registry: ForkRegistry::builtin()?,
            http,
            releases,
            extractor: TarExtractor,
            extract_dir,
            output_dir,
        })
    }
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::ReleaseSource;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use mockito::{Matcher, Server};

    fn runtime_with_token(token: Option<&str>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        let token = token.map(|t| t.to_string());
        runtime
            .expect_env_var()
            .with(eq("GITHUB_TOKEN"))
            .returning(move |_| token.clone().ok_or(std::env::VarError::NotPresent));
        runtime
            .expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));
        runtime
            .expect_cache_dir()
            .returning(|| Some(PathBuf::from("/home/user/.cache")));
        runtime
    }

    fn settings(server: &Server) -> Settings {
        Settings {
            extract_dir: PathBuf::from("~/.steam/steam/compatibilitytools.d/"),
            output_dir: PathBuf::from("~/Downloads/"),
            api_url: Some(server.url()),
            github_url: Some(server.url()),
        }
    }

    async fn verify_authorization_header(token: Option<&str>) {
        // --- Setup ---
        let mut server = Server::new_async().await;
        let expected_header = match token {
            Some(t) => Matcher::Exact(format!("Bearer {}", t)),
            None => Matcher::Missing,
        };
        let mock = server
            .mock("GET", "/repos/o/r/releases")
            .match_header("authorization", expected_header)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        // --- Execute ---
        let config = Config::new(runtime_with_token(token), settings(&server)).unwrap();
        let tags = config.releases.list_recent_releases("o/r").await.unwrap();

        // --- Verify ---
        mock.assert_async().await;
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_config_new_with_github_token() {
        verify_authorization_header(Some("ghp_0123456789abcdef")).await;
    }

    #[tokio::test]
    async fn test_config_new_without_github_token() {
        verify_authorization_header(None).await;
    }

    #[tokio::test]
    async fn test_config_expands_home() {
        let server = Server::new_async().await;
        let config = Config::new(runtime_with_token(None), settings(&server)).unwrap();

        assert_eq!(
            config.extract_dir,
            PathBuf::from("/home/user/.steam/steam/compatibilitytools.d")
        );
        assert_eq!(config.output_dir, PathBuf::from("/home/user/Downloads"));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("ghp_0123456789abcdef"), "ghp_0123*********cdef");
        assert_eq!(mask("short"), "*********");
    }
}
