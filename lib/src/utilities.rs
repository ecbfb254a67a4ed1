use infer::MatcherType;

// Content type for the classification request. The endpoint wants the actual
// image MIME; jpeg when the magic bytes are not a known image format.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == MatcherType::Image => kind.mime_type(),
        _ => "image/jpeg",
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_png_magic_bytes() {
        let bytes = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];
        assert_eq!(detect_image_mime(&bytes), "image/png");
    }

    #[test]
    fn detects_jpeg_magic_bytes() {
        let bytes = [0xff, 0xd8, 0xff, 0xe0, 0, 0, 0, 0];
        assert_eq!(detect_image_mime(&bytes), "image/jpeg");
    }

    #[test]
    fn unknown_bytes_default_to_jpeg() {
        assert_eq!(detect_image_mime(b"not an image"), "image/jpeg");
        assert_eq!(detect_image_mime(&[]), "image/jpeg");
    }
}
