//! Bare URL detection and media embedding.
//!
//! Each URL found in a post body is classified once, in a fixed priority
//! order, and replaced by the matching HTML fragment. Fragments are kept on a
//! single line so that the later line-based passes leave them intact.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::IdGenerator;

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?://|www\.)\S+").expect("valid url pattern"));
static DRIVE_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://drive\.google\.com/file/d/([^/]+)/").expect("valid drive pattern")
});
static YOUTUBE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?youtu(?:\.be|be\.com)/(?:watch\?v=)?([^\s&]+)")
        .expect("valid youtube pattern")
});
static HLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.m3u8(?:\?.*)?$").expect("valid hls pattern"));
static VIDEO_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mp4|webm|ogg)$").expect("valid video pattern"));
static AUDIO_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mp3|wav|ogg|aacp)$").expect("valid audio pattern"));
static IMAGE_EXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|bmp|webp)$").expect("valid image pattern")
});

const FULLSCREEN_LABEL: &str = "Full screen";
const NO_VIDEO: &str = "Your browser does not support video.";
const NO_AUDIO: &str = "Your browser does not support audio.";
const NO_HLS: &str = "Your browser does not support HLS.";
const HLS_FALLBACK_ALERT: &str =
    "Your browser cannot play HLS streams directly. Open the stream in Safari or VLC.";
const DRIVE_DOWNLOAD_LABEL: &str = "Download file from Google Drive";
const HLS_MIME: &str = "application/vnd.apple.mpegurl";

/// What a detected URL turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embed {
    /// Google Drive `/preview` link, shown in a frame.
    DrivePreview { file_id: String },
    /// Google Drive file that looks like a video.
    DriveVideo { file_id: String },
    /// Google Drive file that looks like audio.
    DriveAudio { file_id: String },
    /// Google Drive file that looks like an image.
    DriveImage { file_id: String },
    /// Any other Google Drive file.
    DriveDownload { file_id: String },
    YouTube { video_id: String },
    /// HTTP live streaming playlist (`.m3u8`).
    Hls { url: String },
    /// Direct video file; `subtype` is the lower-cased extension.
    Video { url: String, subtype: String },
    /// Direct audio file; `.aacp` streams report `aac`.
    Audio { url: String, subtype: String },
    /// Plain hyperlink labelled with the text as written.
    Link { href: String, label: String },
}

impl Embed {
    /// Classify a URL exactly as it was matched in the text.
    pub fn classify(matched: &str) -> Self {
        let url = normalize(matched);

        if let Some(file_id) = capture(&DRIVE_FILE, &url) {
            return classify_drive(&url, file_id);
        }

        if let Some(video_id) = capture(&YOUTUBE, &url) {
            return Self::YouTube { video_id };
        }

        if HLS.is_match(&url) {
            return Self::Hls { url };
        }

        if let Some(ext) = capture(&VIDEO_EXT, &url) {
            return Self::Video {
                url,
                subtype: ext.to_ascii_lowercase(),
            };
        }

        if let Some(ext) = capture(&AUDIO_EXT, &url) {
            let ext = ext.to_ascii_lowercase();
            let subtype = if ext == "aacp" { "aac".to_string() } else { ext };
            return Self::Audio { url, subtype };
        }

        Self::Link {
            href: url,
            label: matched.to_string(),
        }
    }

    /// Produce the HTML fragment for this embed.
    ///
    /// Elements that have no stable identity of their own (HLS streams and
    /// direct video files) draw their element id from `ids`.
    pub fn to_html(&self, ids: &mut dyn IdGenerator) -> String {
        match self {
            Self::DrivePreview { file_id } => {
                let element_id = format!("gdrive-{file_id}");
                format!(
                    r#"<div class="embed"><iframe id="{element_id}" src="https://drive.google.com/file/d/{file_id}/preview" allow="autoplay" allowfullscreen></iframe>{}</div>"#,
                    fullscreen_button(&element_id)
                )
            }
            Self::DriveVideo { file_id } => {
                let element_id = format!("video-{file_id}");
                video_block(&element_id, &drive_download_url(file_id), "video/mp4", NO_VIDEO)
            }
            Self::DriveAudio { file_id } => {
                audio_block(&drive_download_url(file_id), "audio/mpeg")
            }
            Self::DriveImage { file_id } => format!(
                r#"<img src="{}" alt="Image">"#,
                drive_download_url(file_id)
            ),
            Self::DriveDownload { file_id } => {
                anchor(&drive_download_url(file_id), DRIVE_DOWNLOAD_LABEL)
            }
            Self::YouTube { video_id } => {
                let element_id = format!("youtube-{video_id}");
                format!(
                    r#"<div class="embed"><iframe id="{element_id}" src="https://www.youtube.com/embed/{video_id}" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>{}</div>"#,
                    fullscreen_button(&element_id)
                )
            }
            Self::Hls { url } => {
                let element_id = format!("hls-{}", ids.next_id());
                let player = video_block(&element_id, url, HLS_MIME, NO_HLS);
                format!(
                    "{player}<script>(function(){{var v=document.getElementById('{element_id}');if(v.canPlayType('{HLS_MIME}')){{v.src='{url}';v.addEventListener('loadedmetadata',function(){{v.play();}});}}else{{alert('{HLS_FALLBACK_ALERT}');}}}})();</script>"
                )
            }
            Self::Video { url, subtype } => {
                let element_id = format!("video-{}", ids.next_id());
                video_block(&element_id, url, &format!("video/{subtype}"), NO_VIDEO)
            }
            Self::Audio { url, subtype } => audio_block(url, &format!("audio/{subtype}")),
            Self::Link { href, label } => anchor(href, label),
        }
    }
}

/// Replace every bare URL in `text` with its embed fragment.
pub fn embed_links(text: &str, ids: &mut dyn IdGenerator) -> String {
    URL.replace_all(text, |caps: &Captures<'_>| {
        Embed::classify(&caps[0]).to_html(ids)
    })
    .into_owned()
}

fn normalize(matched: &str) -> String {
    if matched.starts_with("http") {
        matched.to_string()
    } else {
        format!("https://{matched}")
    }
}

fn capture(pattern: &Regex, haystack: &str) -> Option<String> {
    pattern
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn classify_drive(url: &str, file_id: String) -> Embed {
    if url.contains("/preview") {
        Embed::DrivePreview { file_id }
    } else if VIDEO_EXT.is_match(url) || url.contains("video") {
        Embed::DriveVideo { file_id }
    } else if AUDIO_EXT.is_match(url) || url.contains("audio") {
        Embed::DriveAudio { file_id }
    } else if IMAGE_EXT.is_match(url) || url.contains("image") {
        Embed::DriveImage { file_id }
    } else {
        Embed::DriveDownload { file_id }
    }
}

fn drive_download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={file_id}")
}

fn fullscreen_button(element_id: &str) -> String {
    format!(
        r#"<button class="fullscreen" onclick="openFullScreen('{element_id}')">{FULLSCREEN_LABEL}</button>"#
    )
}

fn video_block(element_id: &str, src: &str, mime: &str, fallback: &str) -> String {
    format!(
        r#"<div class="embed"><video id="{element_id}" controls><source src="{src}" type="{mime}">{fallback}</video>{}</div>"#,
        fullscreen_button(element_id)
    )
}

fn audio_block(src: &str, mime: &str) -> String {
    format!(r#"<audio controls><source src="{src}" type="{mime}">{NO_AUDIO}</audio>"#)
}

fn anchor(href: &str, label: &str) -> String {
    format!(r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{label}</a>"#)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::SequentialIds;

    fn html(text: &str) -> String {
        embed_links(text, &mut SequentialIds::default())
    }

    #[test]
    fn test_classify_drive_preview() {
        let embed = Embed::classify("https://drive.google.com/file/d/abc123/preview");
        assert_eq!(
            embed,
            Embed::DrivePreview {
                file_id: "abc123".to_string()
            }
        );
    }

    #[test]
    fn test_classify_drive_by_keyword_and_extension() {
        assert_eq!(
            Embed::classify("https://drive.google.com/file/d/id1/view?video"),
            Embed::DriveVideo {
                file_id: "id1".to_string()
            }
        );
        assert_eq!(
            Embed::classify("https://drive.google.com/file/d/id2/track.mp3"),
            Embed::DriveAudio {
                file_id: "id2".to_string()
            }
        );
        assert_eq!(
            Embed::classify("https://drive.google.com/file/d/id3/photo.PNG"),
            Embed::DriveImage {
                file_id: "id3".to_string()
            }
        );
        assert_eq!(
            Embed::classify("https://drive.google.com/file/d/id4/view"),
            Embed::DriveDownload {
                file_id: "id4".to_string()
            }
        );
    }

    #[test]
    fn test_drive_without_trailing_slash_is_plain_link() {
        let embed = Embed::classify("https://drive.google.com/file/d/abc");
        assert!(matches!(embed, Embed::Link { .. }));
    }

    #[test]
    fn test_classify_youtube_short_and_long_links() {
        assert_eq!(
            Embed::classify("https://youtu.be/dQw4w9WgXcQ"),
            Embed::YouTube {
                video_id: "dQw4w9WgXcQ".to_string()
            }
        );
        assert_eq!(
            Embed::classify("www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            Embed::YouTube {
                video_id: "dQw4w9WgXcQ".to_string()
            }
        );
    }

    #[test]
    fn test_classify_hls_with_query_string() {
        let embed = Embed::classify("https://cdn.example.com/live/index.m3u8?token=1");
        assert!(matches!(embed, Embed::Hls { .. }));
    }

    #[test]
    fn test_classify_direct_video_lowercases_subtype() {
        assert_eq!(
            Embed::classify("https://example.com/clip.WEBM"),
            Embed::Video {
                url: "https://example.com/clip.WEBM".to_string(),
                subtype: "webm".to_string()
            }
        );
    }

    #[test]
    fn test_ogg_is_treated_as_video() {
        let embed = Embed::classify("https://example.com/sound.ogg");
        assert!(matches!(embed, Embed::Video { .. }));
    }

    #[test]
    fn test_classify_audio_maps_aacp_to_aac() {
        assert_eq!(
            Embed::classify("https://radio.example.com/stream.aacp"),
            Embed::Audio {
                url: "https://radio.example.com/stream.aacp".to_string(),
                subtype: "aac".to_string()
            }
        );
        assert_eq!(
            Embed::classify("https://example.com/a.wav"),
            Embed::Audio {
                url: "https://example.com/a.wav".to_string(),
                subtype: "wav".to_string()
            }
        );
    }

    #[test]
    fn test_link_keeps_original_text_as_label() {
        let out = html("see www.example.com/page now");
        assert_eq!(
            out,
            r#"see <a href="https://www.example.com/page" target="_blank" rel="noopener noreferrer">www.example.com/page</a> now"#
        );
    }

    #[test]
    fn test_video_embed_uses_generated_id_and_mime() {
        let out = html("https://example.com/video.mp4");
        assert!(out.contains(r#"<video id="video-000000001" controls>"#));
        assert!(out.contains(r#"type="video/mp4""#));
        assert!(out.contains("openFullScreen('video-000000001')"));
    }

    #[test]
    fn test_hls_embed_includes_capability_check() {
        let out = html("https://example.com/live.m3u8");
        assert!(out.contains(r#"id="hls-000000001""#));
        assert!(out.contains("canPlayType('application/vnd.apple.mpegurl')"));
        assert!(out.contains("v.src='https://example.com/live.m3u8'"));
        assert!(out.contains("loadedmetadata"));
    }

    #[test]
    fn test_drive_ids_are_deterministic() {
        let out = html("https://drive.google.com/file/d/XYZ/preview");
        assert!(out.contains(r#"id="gdrive-XYZ""#));
        assert!(out.contains("openFullScreen('gdrive-XYZ')"));
        let out = html("https://drive.google.com/file/d/XYZ/movie.mp4");
        assert!(out.contains(r#"id="video-XYZ""#));
        assert!(out.contains("https://drive.google.com/uc?export=download&id=XYZ"));
    }

    #[test]
    fn test_drive_audio_image_and_download_markup() {
        assert_eq!(
            html("https://drive.google.com/file/d/AUD/song.mp3"),
            r#"<audio controls><source src="https://drive.google.com/uc?export=download&id=AUD" type="audio/mpeg">Your browser does not support audio.</audio>"#
        );
        assert_eq!(
            html("https://drive.google.com/file/d/IMG/photo.png"),
            r#"<img src="https://drive.google.com/uc?export=download&id=IMG" alt="Image">"#
        );
        assert_eq!(
            html("https://drive.google.com/file/d/DOC/view"),
            r#"<a href="https://drive.google.com/uc?export=download&id=DOC" target="_blank" rel="noopener noreferrer">Download file from Google Drive</a>"#
        );
    }

    #[test]
    fn test_youtube_embed_points_at_player() {
        let out = html("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42");
        assert!(out.contains(
            r#"<iframe id="youtube-dQw4w9WgXcQ" src="https://www.youtube.com/embed/dQw4w9WgXcQ""#
        ));
        assert!(out.contains("openFullScreen('youtube-dQw4w9WgXcQ')"));
        let out = html("https://youtu.be/abc123");
        assert!(out.contains(r#"src="https://www.youtube.com/embed/abc123""#));
    }

    #[test]
    fn test_audio_markup_uses_mapped_mime() {
        assert_eq!(
            html("https://radio.example.com/stream.aacp"),
            r#"<audio controls><source src="https://radio.example.com/stream.aacp" type="audio/aac">Your browser does not support audio.</audio>"#
        );
        assert!(html("https://example.com/a.WAV").contains(r#"type="audio/wav""#));
    }

    #[test]
    fn test_embeds_are_single_line() {
        for url in [
            "https://drive.google.com/file/d/a/preview",
            "https://youtu.be/abc",
            "https://example.com/s.m3u8",
            "https://example.com/v.mp4",
            "https://example.com/a.mp3",
        ] {
            assert!(!html(url).contains('\n'), "{url} produced multi-line markup");
        }
    }

    #[test]
    fn test_each_random_embed_gets_a_fresh_id() {
        let out = html("https://a.com/1.mp4 https://a.com/2.mp4");
        assert!(out.contains("video-000000001"));
        assert!(out.contains("video-000000002"));
    }
}
