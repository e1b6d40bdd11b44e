//! Channel identifiers and what each channel can carry.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "image" | "photo" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

struct Capability {
    image: bool,
    video: bool,
}

const BOTH: Capability = Capability {
    image: true,
    video: true,
};
const IMAGE_ONLY: Capability = Capability {
    image: true,
    video: false,
};
const VIDEO_ONLY: Capability = Capability {
    image: false,
    video: true,
};

fn capability(channel: &str) -> Capability {
    match channel {
        "facebook" | "facebook_page" => BOTH,
        "instagram" | "instagram_feed" | "instagram_story" | "instagram_reel" => BOTH,
        "linkedin" | "linkedin_profile" | "linkedin_page" => BOTH,
        "tiktok" => VIDEO_ONLY,
        "x" | "twitter" => IMAGE_ONLY,
        // Unknown channels are assumed to take images only.
        _ => IMAGE_ONLY,
    }
}

/// Resolve a rule channel into the identifier post jobs are keyed on.
/// `aspect_ratio` is width / height of the draft's asset, when known.
pub fn canonicalize(raw: &str, aspect_ratio: Option<f64>) -> String {
    let channel = raw.trim().to_lowercase();
    match channel.as_str() {
        "instagram" => {
            if aspect_ratio.is_some_and(is_vertical_9_16) {
                "instagram_story".to_string()
            } else {
                "instagram_feed".to_string()
            }
        }
        "linkedin" => "linkedin_profile".to_string(),
        "twitter" => "x".to_string(),
        _ => channel,
    }
}

pub fn supports_media(channel: &str, media: MediaType) -> bool {
    let cap = capability(channel.trim().to_lowercase().as_str());
    match media {
        MediaType::Image => cap.image,
        MediaType::Video => cap.video,
    }
}

pub fn aspect_ratio(width: Option<i32>, height: Option<i32>) -> Option<f64> {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(f64::from(w) / f64::from(h)),
        _ => None,
    }
}

fn is_vertical_9_16(ratio: f64) -> bool {
    (ratio - 9.0 / 16.0).abs() < 0.01
}
