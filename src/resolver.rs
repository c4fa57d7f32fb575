use reqwest::header::LOCATION;
use reqwest::{redirect, Method, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use url::Url;

/// Time limit for each of the HEAD and the GET attempt, redirects included.
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(3);
/// Redirects followed per resolve, HEAD and GET attempts together.
pub const MAX_REDIRECTS: usize = 10;

/// Well known link shortening services.
const SHORTENERS: [&str; 10] = [
    "bit.ly",
    "goo.gl",
    "t.co",
    "tinyurl.com",
    "is.gd",
    "buff.ly",
    "amzn.to",
    "lnkd.in",
    "rebrand.ly",
    "shrtco.de",
];

/// Inputs shorter than this are assumed to be short links, whatever the host.
const SHORT_LINK_LEN: usize = 30;

/// Guess whether `input` is a short link worth resolving.
///
/// Any known shortener host matches. Otherwise every URL under 30 bytes
/// that is not on localhost counts too, which catches unknown shorteners
/// at the cost of resolving some URLs that are merely short.
pub fn is_short_link(input: &str) -> bool {
    let Ok(url) = Url::parse(input) else {
        return false;
    };
    let host = host_with_port(&url);

    if SHORTENERS
        .iter()
        .any(|s| host == *s || host.ends_with(s))
    {
        return true;
    }

    input.len() < SHORT_LINK_LEN && !host.contains("localhost") && !host.contains("127.0.0.1")
}

fn host_with_port(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_owned(),
        _ => String::new(),
    }
}

/// Follows short links to their destination with one reusable client.
///
/// The client never follows redirects on its own, `resolve` chases them so
/// the HEAD and the GET attempt share one redirect budget.
#[derive(Clone, Debug)]
pub struct LinkResolver {
    client: reqwest::Client,
}

impl LinkResolver {
    /// Build a resolver with the 3 second timeout and the redirect bound.
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(RESOLVE_TIMEOUT)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(LinkResolver { client })
    }

    /// Resolve `url` to the last URL reached while following redirects.
    ///
    /// A HEAD request is tried first. Only a transport failure, not an
    /// error status, falls back to a GET. At most [`MAX_REDIRECTS`] redirects
    /// are followed over both attempts, once they are used up the response
    /// at hand is final. `None` means both attempts failed.
    pub async fn resolve(&self, url: &str) -> Option<Url> {
        let start = match Url::parse(url) {
            Ok(start) => start,
            Err(error) => {
                debug!(url, %error, "fail to parse short link");
                return None;
            }
        };
        let mut budget = MAX_REDIRECTS;

        let resolved = match self.chase(Method::HEAD, start.clone(), &mut budget).await {
            Ok(resolved) => resolved,
            Err(head_error) => {
                trace!(url, %head_error, budget, "HEAD failed, retry with GET");
                match self.chase(Method::GET, start, &mut budget).await {
                    Ok(resolved) => resolved,
                    Err(get_error) => {
                        debug!(url, %get_error, "fail to resolve short link");
                        return None;
                    }
                }
            }
        };

        trace!(
            redirect_from = url,
            redirect_to = resolved.as_str(),
            redirects = MAX_REDIRECTS - budget,
            "short link resolved",
        );
        Some(resolved)
    }

    /// Request `url` with `method` and follow `Location` headers while the
    /// budget lasts. Each followed redirect takes one from `budget`.
    async fn chase(&self, method: Method, url: Url, budget: &mut usize) -> reqwest::Result<Url> {
        let deadline = Instant::now() + RESOLVE_TIMEOUT;
        let mut current = url;

        loop {
            let response = self
                .client
                .request(method.clone(), current.clone())
                .timeout(deadline.saturating_duration_since(Instant::now()))
                .send()
                .await?;

            if !is_redirect(response.status()) || *budget == 0 {
                return Ok(current);
            }
            let next = response
                .headers()
                .get(LOCATION)
                .and_then(|location| location.to_str().ok())
                .and_then(|location| current.join(location).ok());
            let Some(next) = next else {
                return Ok(current);
            };

            *budget -= 1;
            current = next;
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/x")
    }

    #[test]
    fn test_is_short_link() {
        assert!(is_short_link("https://bit.ly/3abcdefghijklmnopqrstu"));
        assert!(is_short_link("https://t.co/aBcDeFgHiJkLmNoPqRsT"));
        assert!(is_short_link("https://www.tinyurl.com/some-long-alias-here"));
        // short enough to be suspicious
        assert!(is_short_link("https://b23.tv/C0lw13z"));

        assert!(!is_short_link("http://localhost:8080/x"));
        assert!(!is_short_link("http://127.0.0.1/abc"));
        assert!(!is_short_link(
            "https://www.example.com/articles/2024/some-story"
        ));
        assert!(!is_short_link("not a url"));
    }

    #[tokio::test]
    async fn test_resolve_follows_redirects() {
        let mut server = mockito::Server::new_async().await;
        let target = format!("{}/landing", server.url());
        let _short = server
            .mock("HEAD", "/s")
            .with_status(301)
            .with_header("location", &target)
            .create_async()
            .await;
        let _landing = server
            .mock("HEAD", "/landing")
            .with_status(200)
            .create_async()
            .await;

        let resolver = LinkResolver::new().unwrap();
        let resolved = resolver.resolve(&format!("{}/s", server.url())).await;

        assert_eq!(resolved.unwrap().as_str(), target);
    }

    #[tokio::test]
    async fn test_resolve_error_status_is_final() {
        let mut server = mockito::Server::new_async().await;
        let _gone = server
            .mock("HEAD", "/gone")
            .with_status(404)
            .create_async()
            .await;

        let resolver = LinkResolver::new().unwrap();
        let url = format!("{}/gone", server.url());

        assert_eq!(resolver.resolve(&url).await.unwrap().as_str(), url);
    }

    #[tokio::test]
    async fn test_resolve_stops_at_redirect_bound() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for hop in 0..15 {
            let next = format!("{}/r{}", server.url(), hop + 1);
            mocks.push(
                server
                    .mock("HEAD", format!("/r{hop}").as_str())
                    .with_status(302)
                    .with_header("location", &next)
                    .create_async()
                    .await,
            );
        }

        let resolver = LinkResolver::new().unwrap();
        let resolved = resolver
            .resolve(&format!("{}/r0", server.url()))
            .await
            .unwrap();

        // ten followed redirects from r0
        assert_eq!(resolved.path(), "/r10");
    }

    #[tokio::test]
    async fn test_get_fallback_when_head_breaks() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/s")
            .with_status(302)
            .with_header("location", &closed_port_url())
            .create_async()
            .await;
        let get = server
            .mock("GET", "/s")
            .with_status(302)
            .with_header("location", &format!("{}/landing", server.url()))
            .create_async()
            .await;
        let landing = server
            .mock("GET", "/landing")
            .with_status(200)
            .create_async()
            .await;

        let resolver = LinkResolver::new().unwrap();
        let resolved = resolver
            .resolve(&format!("{}/s", server.url()))
            .await
            .unwrap();

        assert_eq!(resolved.path(), "/landing");
        head.assert_async().await;
        get.assert_async().await;
        landing.assert_async().await;
    }

    #[tokio::test]
    async fn test_redirect_budget_shared_by_head_and_get() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        // HEAD follows six redirects, the last one into a closed port
        for hop in 0..6 {
            let next = if hop == 5 {
                closed_port_url()
            } else {
                format!("{}/r{}", server.url(), hop + 1)
            };
            mocks.push(
                server
                    .mock("HEAD", format!("/r{hop}").as_str())
                    .with_status(302)
                    .with_header("location", &next)
                    .create_async()
                    .await,
            );
        }
        for hop in 0..20 {
            let next = format!("{}/r{}", server.url(), hop + 1);
            mocks.push(
                server
                    .mock("GET", format!("/r{hop}").as_str())
                    .with_status(302)
                    .with_header("location", &next)
                    .create_async()
                    .await,
            );
        }

        let resolver = LinkResolver::new().unwrap();
        let resolved = resolver
            .resolve(&format!("{}/r0", server.url()))
            .await
            .unwrap();

        // four redirects left for the GET
        assert_eq!(resolved.path(), "/r4");
    }

    #[tokio::test]
    async fn test_resolve_unreachable() {
        let resolver = LinkResolver::new().unwrap();
        assert!(resolver.resolve(&closed_port_url()).await.is_none());
    }
}
