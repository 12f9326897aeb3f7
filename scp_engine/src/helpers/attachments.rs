use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Display classification of a message, derived purely from its attachment's file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Text,
    Image,
    Audio,
    File,
}

impl Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttachmentKind::Text => write!(f, "text"),
            AttachmentKind::Image => write!(f, "image"),
            AttachmentKind::Audio => write!(f, "audio"),
            AttachmentKind::File => write!(f, "file"),
        }
    }
}

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "m4a", "aac", "ogg"];

/// Classifies a message by its attachment URL. No attachment means `Text`; a recognised image or audio extension
/// maps accordingly; any other attachment, including one with an unknown or missing extension, is a generic `File`.
pub fn classify_attachment(attachment_url: Option<&str>) -> AttachmentKind {
    let url = match attachment_url {
        Some(url) if !url.is_empty() => url,
        _ => return AttachmentKind::Text,
    };
    let extension = url.rsplit('.').next().filter(|ext| !ext.contains('/')).map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => AttachmentKind::Image,
        Some(ext) if AUDIO_EXTENSIONS.contains(&ext) => AttachmentKind::Audio,
        _ => AttachmentKind::File,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_attachment_is_text() {
        assert_eq!(classify_attachment(None), AttachmentKind::Text);
        assert_eq!(classify_attachment(Some("")), AttachmentKind::Text);
    }

    #[test]
    fn recognised_extensions_map_to_their_kind() {
        assert_eq!(classify_attachment(Some("/uploads/photo.jpg")), AttachmentKind::Image);
        assert_eq!(classify_attachment(Some("/uploads/photo.WEBP")), AttachmentKind::Image);
        assert_eq!(classify_attachment(Some("/uploads/voice.ogg")), AttachmentKind::Audio);
        assert_eq!(classify_attachment(Some("/uploads/voice.M4A")), AttachmentKind::Audio);
    }

    #[test]
    fn unknown_extensions_default_to_file() {
        assert_eq!(classify_attachment(Some("/uploads/contract.pdf")), AttachmentKind::File);
        assert_eq!(classify_attachment(Some("/uploads/archive.tar.xz")), AttachmentKind::File);
        assert_eq!(classify_attachment(Some("/uploads/no_extension")), AttachmentKind::File);
    }
}
