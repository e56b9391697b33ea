//! Frame acquisition: resolves a live broadcast's playable media URL, skips
//! past any ad break, and grabs a single decoded keyframe.

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::collaborators::{select_optimal_quality, Datastore, FrameGrabber, LiveMediaApi};
use crate::error::{LiveApiError, SnipeError};
use crate::model::{Frame, Stream};

const DEFAULT_AD_DURATION: f64 = 15.0;

/// Picks a proxy uniformly at random from the configured list, or `None`
/// if the list is empty.
pub fn pick_proxy(proxies: &[String]) -> Option<&str> {
    proxies.choose(&mut rand::thread_rng()).map(String::as_str)
}

/// Acquires a frame for `stream`. Returns `Ok(None)` if the broadcast has
/// gone offline between roster time and fetch time (not a failure).
///
/// Tries the cached URL first (fast path); on any failure there, falls
/// through to resolving a fresh playlist URL (slow path). A freshly
/// resolved URL is persisted back onto the stream record.
#[allow(clippy::too_many_arguments)]
pub async fn acquire_frame(
    live_media: &Arc<dyn LiveMediaApi>,
    frame_grabber: &Arc<dyn FrameGrabber>,
    datastore: &Arc<dyn Datastore>,
    http: &reqwest::Client,
    stream: &Stream,
    proxies: &[String],
    ads_check: bool,
) -> Result<Option<Frame>, SnipeError> {
    let proxy = pick_proxy(proxies);

    if let Some(cached) = &stream.url {
        match grab_with_ad_skip(frame_grabber, http, cached, proxy, ads_check).await {
            Ok(frame) => return Ok(Some(frame)),
            Err(e) => log::debug!(
                "fast-path frame grab failed for {}, falling back to playlist resolution: {e}",
                stream.id
            ),
        }
    }

    let playlist_url = match resolve_playlist_url(live_media, &stream.id, proxy).await? {
        Some(url) => url,
        None => return Ok(None),
    };

    let frame = grab_with_ad_skip(frame_grabber, http, &playlist_url, proxy, ads_check).await?;

    datastore
        .update_stream_url(&stream.id, &playlist_url)
        .await?;

    Ok(Some(frame))
}

/// Computes the ad-skip seek offset (if enabled) and grabs a frame at
/// `playlist_url`.
async fn grab_with_ad_skip(
    frame_grabber: &Arc<dyn FrameGrabber>,
    http: &reqwest::Client,
    playlist_url: &str,
    proxy: Option<&str>,
    ads_check: bool,
) -> Result<Frame, SnipeError> {
    let seek_secs = if ads_check {
        match fetch_playlist_text(http, playlist_url, proxy).await {
            Ok(text) => analyze_ads(&text),
            Err(_) => 0.0,
        }
    } else {
        0.0
    };

    frame_grabber
        .grab_frame(playlist_url, proxy, seek_secs)
        .await
        .map_err(SnipeError::FrameGrabber)
}

/// Resolves a fresh playlist URL via the slow path: fetch all qualities,
/// pick the best one. Returns `Ok(None)` on an upstream not-found (the
/// broadcast ended), propagates any other error.
async fn resolve_playlist_url(
    live_media: &Arc<dyn LiveMediaApi>,
    channel: &str,
    proxy: Option<&str>,
) -> Result<Option<String>, SnipeError> {
    let qualities = match live_media.get_media_playlists(channel, proxy).await {
        Ok(qualities) => qualities,
        Err(LiveApiError::NotFound) => return Ok(None),
        Err(e) => return Err(SnipeError::LiveApi(e)),
    };

    let chosen = select_optimal_quality(&qualities).map_err(SnipeError::LiveApi)?;
    Ok(Some(chosen.url.clone()))
}

async fn fetch_playlist_text(
    http: &reqwest::Client,
    url: &str,
    proxy: Option<&str>,
) -> Result<String, reqwest::Error> {
    let client = match proxy {
        Some(proxy) => reqwest::Client::builder()
            .proxy(reqwest::Proxy::all(proxy)?)
            .build()?,
        None => http.clone(),
    };
    client.get(url).send().await?.text().await
}

/// Scans an m3u8 playlist's text for ad markers and returns the seek
/// offset (in seconds) to land past the ad break, or 0.0 if none found.
fn analyze_ads(m3u8_text: &str) -> f64 {
    let mut has_ads = false;
    let mut ad_duration = 0.0_f64;

    for line in m3u8_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains(r#"CLASS="twitch-stitched-ad""#) {
            has_ads = true;
            if line.contains("DURATION=") {
                if let Some(dur) = extract_duration(line) {
                    if dur > ad_duration {
                        ad_duration = dur;
                    }
                }
            }
        }

        if line.contains(r#"CLASS="twitch-ad-quartile""#) {
            has_ads = true;
        }

        if line.contains(r#"X-TV-TWITCH-AD-ROLL-TYPE="PREROLL""#) {
            has_ads = true;
            if ad_duration == 0.0 {
                ad_duration = DEFAULT_AD_DURATION;
            }
        }

        if line.contains("X-TV-TWITCH-STREAM-SOURCE=") && !line.contains(r#"X-TV-TWITCH-STREAM-SOURCE="live""#) {
            has_ads = true;
            if ad_duration == 0.0 {
                ad_duration = DEFAULT_AD_DURATION;
            }
        }
    }

    if has_ads {
        if ad_duration > 0.0 {
            ad_duration + 1.0
        } else {
            DEFAULT_AD_DURATION
        }
    } else {
        0.0
    }
}

fn extract_duration(line: &str) -> Option<f64> {
    let dur_start = line.find("DURATION=")? + "DURATION=".len();
    let rest = &line[dur_start..];
    let end = rest.find([',', '"']).unwrap_or(rest.len());
    rest[..end].trim_matches('"').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_markers_means_no_skip() {
        assert_eq!(analyze_ads("#EXTM3U\n#EXT-X-VERSION:3\n"), 0.0);
    }

    #[test]
    fn preroll_without_duration_uses_default() {
        let text = r#"#EXTINF,X-TV-TWITCH-AD-ROLL-TYPE="PREROLL""#;
        assert_eq!(analyze_ads(text), DEFAULT_AD_DURATION);
    }

    #[test]
    fn stitched_ad_duration_adds_one_second() {
        let text = r#"#EXT-X-DATERANGE:CLASS="twitch-stitched-ad",DURATION=12.5,ID="x""#;
        assert_eq!(analyze_ads(text), 13.5);
    }

    #[test]
    fn non_live_source_uses_default() {
        let text = r#"#EXT-X-TWITCH-PREFETCH,X-TV-TWITCH-STREAM-SOURCE="ad""#;
        assert_eq!(analyze_ads(text), DEFAULT_AD_DURATION);
    }

    #[test]
    fn live_source_marker_alone_is_not_an_ad() {
        let text = r#"#EXT-X-TWITCH-INFO,X-TV-TWITCH-STREAM-SOURCE="live""#;
        assert_eq!(analyze_ads(text), 0.0);
    }
}
