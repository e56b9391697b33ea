//! Live-media-playlist collaborator: resolves a channel's current media
//! playlist qualities, used by the frame-acquisition slow path. Quality
//! selection itself lives in [`select_optimal_quality`] below; this module
//! only resolves the candidate list.

use async_trait::async_trait;

use crate::error::LiveApiError;

/// One resolution/URL pair as reported by the live-media API.
#[derive(Debug, Clone)]
pub struct MediaQuality {
    /// Resolution string in `"WxH"` form, e.g. `"1920x1080"`.
    pub resolution: String,
    pub url: String,
}

/// Resolves the set of media-playlist qualities currently available for a
/// live broadcast.
#[async_trait]
pub trait LiveMediaApi: Send + Sync {
    /// Returns the available qualities for `channel`, proxied through
    /// `proxy` if non-empty.
    ///
    /// Returns [`LiveApiError::NotFound`] if the broadcast has ended between
    /// roster time and fetch time — this is not a failure, just an offline skip.
    async fn get_media_playlists(
        &self,
        channel: &str,
        proxy: Option<&str>,
    ) -> Result<Vec<MediaQuality>, LiveApiError>;
}

/// Default `LiveMediaApi` implementation over HTTP.
pub struct HttpLiveMediaClient {
    base_url: String,
}

impl HttpLiveMediaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn build_client(proxy: Option<&str>) -> Result<reqwest::Client, LiveApiError> {
        let mut builder = reqwest::Client::builder().timeout(std::time::Duration::from_secs(30));
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(LiveApiError::Http)?;
            builder = builder.proxy(proxy);
        }
        builder.build().map_err(LiveApiError::Http)
    }
}

#[async_trait]
impl LiveMediaApi for HttpLiveMediaClient {
    async fn get_media_playlists(
        &self,
        channel: &str,
        proxy: Option<&str>,
    ) -> Result<Vec<MediaQuality>, LiveApiError> {
        let client = Self::build_client(proxy)?;

        let resp = client
            .get(format!("{}/playlists/{}", self.base_url, channel))
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LiveApiError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(LiveApiError::Status(resp.status().as_u16()));
        }

        #[derive(serde::Deserialize)]
        struct Entry {
            resolution: String,
            url: String,
        }

        let entries: Vec<Entry> = resp.json().await?;
        Ok(entries
            .into_iter()
            .map(|e| MediaQuality {
                resolution: e.resolution,
                url: e.url,
            })
            .collect())
    }
}

/// Chooses the best quality: exact 1920x1080, else exact 1280x720, else the
/// greatest parsed width. Fails if no quality has a parseable `WxH`
/// resolution.
pub fn select_optimal_quality(qualities: &[MediaQuality]) -> Result<&MediaQuality, LiveApiError> {
    if let Some(q) = qualities.iter().find(|q| q.resolution == "1920x1080") {
        return Ok(q);
    }
    if let Some(q) = qualities.iter().find(|q| q.resolution == "1280x720") {
        return Ok(q);
    }

    let mut best: Option<(&MediaQuality, u32)> = None;
    for q in qualities {
        let Some((w, _)) = parse_resolution(&q.resolution) else {
            continue;
        };
        if best.map(|(_, bw)| w > bw).unwrap_or(true) {
            best = Some((q, w));
        }
    }

    best.map(|(q, _)| q).ok_or(LiveApiError::NoQuality)
}

fn parse_resolution(res: &str) -> Option<(u32, u32)> {
    let (w, h) = res.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(resolution: &str) -> MediaQuality {
        MediaQuality {
            resolution: resolution.to_string(),
            url: format!("http://example.com/{resolution}.m3u8"),
        }
    }

    #[test]
    fn prefers_1080p_over_everything() {
        let qualities = vec![q("1280x720"), q("1920x1080"), q("640x480")];
        let chosen = select_optimal_quality(&qualities).unwrap();
        assert_eq!(chosen.resolution, "1920x1080");
    }

    #[test]
    fn falls_back_to_720p() {
        let qualities = vec![q("640x480"), q("1280x720")];
        let chosen = select_optimal_quality(&qualities).unwrap();
        assert_eq!(chosen.resolution, "1280x720");
    }

    #[test]
    fn falls_back_to_max_width() {
        let qualities = vec![q("640x480"), q("800x600")];
        let chosen = select_optimal_quality(&qualities).unwrap();
        assert_eq!(chosen.resolution, "800x600");
    }

    #[test]
    fn fails_with_no_parseable_resolution() {
        let qualities = vec![q("audio_only")];
        assert!(matches!(
            select_optimal_quality(&qualities),
            Err(LiveApiError::NoQuality)
        ));
    }
}
