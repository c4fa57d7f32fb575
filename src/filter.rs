use crate::hooks::{self, CLOUD_HOOKS, SPECIAL_HOOKS};
use crate::resolver::{is_short_link, LinkResolver};
use crate::rules::Blocklist;
use crate::CleaningOptions;
use anyhow::Context;
use tracing::{span, trace, Instrument, Level};
use url::form_urlencoded;
use url::Url;

/// Clean a URL string. Always produces a string: when the URL cannot be
/// parsed the best URL obtained so far is handed back untouched, and when
/// nothing changed the original `url` is returned as is.
pub async fn clear(
    url: &str,
    options: CleaningOptions,
    blocklist: &Blocklist,
    resolver: &LinkResolver,
) -> String {
    let clear_rec = span!(Level::TRACE, "Clear Process", url = url);
    clear_inner(url, options, blocklist, resolver)
        .instrument(clear_rec)
        .await
}

async fn clear_inner(
    url: &str,
    options: CleaningOptions,
    blocklist: &Blocklist,
    resolver: &LinkResolver,
) -> String {
    // `working` may be replaced by the resolved destination, keep `url` for
    // comparison at the end.
    let mut working = url.to_owned();
    if options.unshorten && is_short_link(url) {
        if let Some(resolved) = resolver.resolve(url).await {
            if resolved.as_str() != url {
                trace!(redirect_from = url, redirect_to = resolved.as_str(), "url redirected");
                working = resolved.into();
            }
        }
    }

    let purl = match Url::parse(&working).context(format!("parse url {working}")) {
        Ok(purl) => purl,
        Err(error) => {
            trace!("{error:#}");
            return working;
        }
    };

    let cleaned = rewrite(purl.clone(), options, blocklist);
    if cleaned == purl && working == url {
        trace!("nothing to clean for url: {}", url);
        return url.to_owned();
    }

    cleaned.into()
}

/// The parse-free part of cleaning: strip queries, then run hooks.
pub(crate) fn rewrite(mut url: Url, options: CleaningOptions, blocklist: &Blocklist) -> Url {
    let removed = remove_query(&mut url, blocklist);
    if removed > 0 {
        trace!(removed, "tracking queries removed");
    }
    let url = hooks::apply(&SPECIAL_HOOKS, url);
    if options.cloud_boost {
        hooks::apply(&CLOUD_HOOKS, url)
    } else {
        url
    }
}

/// Drop every query pair whose key is in `blacklist`, keeping the order of
/// the rest. Returns how many pairs were removed.
pub(crate) fn remove_query(url: &mut Url, blacklist: &Blocklist) -> usize {
    // Take a copy of the query string, `set_query` below invalidates it.
    let Some(ori_queries) = url.query().map(str::to_owned) else {
        return 0;
    };
    let ori_queries = form_urlencoded::parse(ori_queries.as_bytes());

    let (kept, removed): (Vec<_>, Vec<_>) =
        ori_queries.partition(|(key, _)| !blacklist.contains(key));
    if removed.is_empty() {
        return 0;
    }

    url.set_query(None);
    if !kept.is_empty() {
        url.query_pairs_mut().extend_pairs(kept);
    }

    removed.len()
}
