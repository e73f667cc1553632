//! Proxy address lookup.
//!
//! The proxy file lists one proxy URL per line. Lookups are memoized in
//! memory for a minute so bursts of requests do not re-read the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{MemoError, Result};
use crate::ttl::{memoize, TtlMemo};

/// How long a line read from the proxy file is reused.
pub const PROXY_LIST_TTL: Duration = Duration::from_secs(60);

/// Reads line `proxy_id` of `file`.
///
/// Falls back to the last non-empty line when `proxy_id` is out of range or
/// points at a blank line.
pub async fn read_proxy_line(proxy_id: usize, file: &Path) -> Result<String> {
    let data = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| MemoError::storage(file, e))?;

    pick_line(&data, proxy_id).ok_or_else(|| MemoError::EmptyProxyList(file.to_path_buf()))
}

fn pick_line(data: &str, proxy_id: usize) -> Option<String> {
    let lines: Vec<&str> = data.split('\n').map(str::trim).collect();

    lines
        .get(proxy_id)
        .filter(|line| !line.is_empty())
        .or_else(|| lines.iter().rev().find(|line| !line.is_empty()))
        .map(|line| line.to_string())
}

// == Proxy Resolver ==
/// Picks the proxy for a request.
#[derive(Debug, Clone)]
pub struct ProxyResolver {
    lookup: TtlMemo<(usize, PathBuf), String, MemoError>,
}

impl ProxyResolver {
    pub fn new() -> Self {
        Self::with_ttl(PROXY_LIST_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            lookup: memoize(
                |(proxy_id, file): (usize, PathBuf)| async move {
                    read_proxy_line(proxy_id, &file).await
                },
                ttl,
            ),
        }
    }

    /// A proxy file wins over a custom proxy; having neither is an error.
    pub async fn resolve(
        &self,
        proxy_file: Option<&Path>,
        proxy_id: usize,
        proxy_custom: Option<&str>,
    ) -> Result<String> {
        if let Some(file) = proxy_file {
            let proxy = self.lookup.call((proxy_id, file.to_path_buf())).await?;
            debug!("Using proxy #{} from {}", proxy_id, file.display());
            return Ok(proxy);
        }
        if let Some(custom) = proxy_custom {
            return Ok(custom.to_string());
        }
        Err(MemoError::MissingProxy)
    }
}

impl Default for ProxyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LIST: &str = "http://10.0.0.1:8080\nhttp://10.0.0.2:8080\nhttp://10.0.0.3:8080\n";

    #[test]
    fn test_pick_line_by_index() {
        assert_eq!(pick_line(LIST, 1).as_deref(), Some("http://10.0.0.2:8080"));
    }

    #[test]
    fn test_pick_line_out_of_range_uses_last() {
        assert_eq!(pick_line(LIST, 17).as_deref(), Some("http://10.0.0.3:8080"));
        assert_eq!(pick_line(LIST, 3).as_deref(), Some("http://10.0.0.3:8080"));
    }

    #[test]
    fn test_pick_line_handles_crlf_and_empty() {
        assert_eq!(pick_line("a\r\nb\r\n", 0).as_deref(), Some("a"));
        assert_eq!(pick_line("\n\n", 0), None);
    }

    #[tokio::test]
    async fn test_resolve_prefers_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("proxy.txt");
        std::fs::write(&file, LIST).unwrap();

        let resolver = ProxyResolver::new();
        let proxy = resolver
            .resolve(Some(&file), 0, Some("http://custom:1"))
            .await
            .unwrap();
        assert_eq!(proxy, "http://10.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_resolve_custom_and_missing() {
        let resolver = ProxyResolver::new();

        let proxy = resolver.resolve(None, 0, Some("http://custom:1")).await.unwrap();
        assert_eq!(proxy, "http://custom:1");

        let result = resolver.resolve(None, 0, None).await;
        assert!(matches!(result, Err(MemoError::MissingProxy)));
    }

    #[tokio::test]
    async fn test_file_lookup_is_memoized() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("proxy.txt");
        std::fs::write(&file, LIST).unwrap();

        let resolver = ProxyResolver::new();
        resolver.resolve(Some(&file), 0, None).await.unwrap();

        std::fs::write(&file, "http://10.9.9.9:8080\n").unwrap();
        let proxy = resolver.resolve(Some(&file), 0, None).await.unwrap();
        assert_eq!(proxy, "http://10.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_missing_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let resolver = ProxyResolver::new();

        let result = resolver
            .resolve(Some(&dir.path().join("absent.txt")), 0, None)
            .await;
        assert!(matches!(result, Err(MemoError::Storage { .. })));
    }
}
