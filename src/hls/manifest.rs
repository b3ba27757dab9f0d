use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::profile::TranscodeProfile;

/// One `#EXT-X-STREAM-INF` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub name: String,
    pub bandwidth: u64,
    pub width: u32,
    pub height: u32,
    /// Playlist path relative to the master playlist
    pub uri: String,
}

impl From<&TranscodeProfile> for Variant {
    fn from(profile: &TranscodeProfile) -> Self {
        Self {
            name: profile.name.to_string(),
            bandwidth: profile.bandwidth,
            width: profile.width,
            height: profile.height,
            uri: format!("{0}/{0}.m3u8", profile.name),
        }
    }
}

/// Master playlist builder; variants are written in insertion order
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    variants: Vec<Variant>,
}

impl ManifestBuilder {
    pub fn from_profiles<'a, I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = &'a TranscodeProfile>,
    {
        Self {
            variants: profiles.into_iter().map(Variant::from).collect(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
        for v in &self.variants {
            // Writing to a String cannot fail
            let _ = writeln!(
                out,
                "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}x{},NAME=\"{}\"",
                v.bandwidth, v.width, v.height, v.name
            );
            out.push_str(&v.uri);
            out.push('\n');
        }
        out
    }

    pub async fn write_to(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, self.render()).await?;
        info!("Wrote master playlist with {} variants to {}", self.variants.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::HLS_PROFILES;

    const EXPECTED: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=360x640,NAME=\"360p\"
360p/360p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=720x1280,NAME=\"720p\"
720p/720p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1080x1920,NAME=\"1080p\"
1080p/1080p.m3u8
";

    #[test]
    fn test_master_playlist_is_byte_exact() {
        let rendered = ManifestBuilder::from_profiles(&HLS_PROFILES).render();
        assert_eq!(rendered, EXPECTED);
        assert_eq!(rendered.matches("#EXT-X-STREAM-INF").count(), 3);
    }

    #[test]
    fn test_variant_uri_is_relative_to_master() {
        let variant = Variant::from(&HLS_PROFILES[1]);
        assert_eq!(variant.uri, "720p/720p.m3u8");
        assert_eq!((variant.width, variant.height), (720, 1280));
    }

    #[tokio::test]
    async fn test_write_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.m3u8");
        ManifestBuilder::from_profiles(&HLS_PROFILES).write_to(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), EXPECTED);
    }
}
