use serde::Serialize;

/// Fixed output profile for one rendition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TranscodeProfile {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub bitrate: &'static str,
    /// Quality target used instead of `bitrate` when packaging HLS
    pub crf: Option<u8>,
    /// Advertised bandwidth in the master playlist
    pub bandwidth: u64,
}

impl TranscodeProfile {
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

pub const HIGH: TranscodeProfile = TranscodeProfile {
    name: "high",
    width: 1080,
    height: 1920,
    bitrate: "5000k",
    crf: None,
    bandwidth: 5_000_000,
};

pub const MEDIUM: TranscodeProfile = TranscodeProfile {
    name: "medium",
    width: 720,
    height: 1280,
    bitrate: "2500k",
    crf: None,
    bandwidth: 2_500_000,
};

pub const LOW: TranscodeProfile = TranscodeProfile {
    name: "low",
    width: 480,
    height: 854,
    bitrate: "1000k",
    crf: None,
    bandwidth: 1_000_000,
};

/// HLS ladder in master playlist order
pub const HLS_PROFILES: [TranscodeProfile; 3] = [
    TranscodeProfile {
        name: "360p",
        width: 360,
        height: 640,
        bitrate: "800k",
        crf: Some(28),
        bandwidth: 800_000,
    },
    TranscodeProfile {
        name: "720p",
        width: 720,
        height: 1280,
        bitrate: "2500k",
        crf: Some(24),
        bandwidth: 2_500_000,
    },
    TranscodeProfile {
        name: "1080p",
        width: 1080,
        height: 1920,
        bitrate: "5000k",
        crf: Some(21),
        bandwidth: 5_000_000,
    },
];
