use lazy_static::lazy_static;
use url::Url;

/// A rewrite applied to an already cleaned URL. Returning an error means the
/// hook does not apply and the URL is kept as it was.
pub type HookFn = fn(input: &Url) -> anyhow::Result<Url>;

lazy_static! {
    /// Always applied, whatever the options say.
    pub static ref SPECIAL_HOOKS: Vec<(&'static str, HookFn)> = vec![
        ("youtube_shorts", youtube_shorts as HookFn),
    ];

    /// Cloud storage sharing pages to direct downloads. Applied only with
    /// the cloud boost option.
    pub static ref CLOUD_HOOKS: Vec<(&'static str, HookFn)> = vec![
        ("dropbox_direct", dropbox_direct as HookFn),
        ("google_drive_direct", google_drive_direct as HookFn),
    ];
}

/// Run every hook in `hooks` in order, skipping the ones that don't apply.
pub fn apply(hooks: &[(&'static str, HookFn)], url: Url) -> Url {
    hooks.iter().fold(url, |url, (name, hook)| match hook(&url) {
        Ok(new_url) => {
            tracing::trace!(
                hook = name,
                from = url.as_str(),
                to = new_url.as_str(),
                "hook applied"
            );
            new_url
        }
        Err(_) => url,
    })
}

/// Set `key` to `value`, keeping the position of its first occurrence and
/// dropping any duplicates. Appends when the key is absent.
pub(crate) fn set_query_param(url: &mut Url, key: &str, value: &str) {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    match pairs.iter().position(|(k, _)| k == key) {
        Some(idx) => {
            pairs[idx].1 = value.to_owned();
            let mut seen = false;
            pairs.retain(|(k, _)| {
                if k != key {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
        }
        None => pairs.push((key.to_owned(), value.to_owned())),
    }

    url.set_query(None);
    url.query_pairs_mut().extend_pairs(pairs);
}

/// Path pieces come percent encoded, the query encoder would encode them
/// a second time.
fn decode(segment: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes())).into_owned()
}

fn host(input: &Url) -> anyhow::Result<&str> {
    input
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("{input} has no host"))
}

fn youtube_shorts(input: &Url) -> anyhow::Result<Url> {
    if !host(input)?.contains("youtube.com") {
        anyhow::bail!("not a youtube URL");
    }
    let Some((_, video_id)) = input.path().split_once("/shorts/") else {
        anyhow::bail!("{input} is not a shorts URL");
    };

    let video_id = decode(video_id);
    let mut new_url = input.clone();
    new_url.set_path("/watch");
    set_query_param(&mut new_url, "v", &video_id);
    Ok(new_url)
}

fn dropbox_direct(input: &Url) -> anyhow::Result<Url> {
    if !host(input)?.contains("dropbox.com") {
        anyhow::bail!("not a dropbox URL");
    }
    let mut new_url = input.clone();
    set_query_param(&mut new_url, "dl", "1");
    Ok(new_url)
}

fn google_drive_direct(input: &Url) -> anyhow::Result<Url> {
    if !host(input)?.contains("drive.google.com") || !input.path().contains("/view") {
        anyhow::bail!("not a google drive preview URL");
    }

    let segments: Vec<&str> = input.path().split('/').collect();
    let file_id = segments
        .windows(2)
        .find(|pair| pair[0] == "d")
        .map(|pair| decode(pair[1]))
        .ok_or_else(|| anyhow::anyhow!("no file id in {input}"))?;

    let mut new_url = input.clone();
    new_url.set_path("/uc");
    set_query_param(&mut new_url, "export", "download");
    set_query_param(&mut new_url, "id", &file_id);
    Ok(new_url)
}
