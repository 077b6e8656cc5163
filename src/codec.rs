//! PNG data-URL encoding and decoding

use std::io::Cursor;

use base64::prelude::*;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

/// Header prepended to every encoded frame
pub const PNG_DATA_URL_HEADER: &str = "data:image/png;base64,";

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("data URL has no ',' separated payload")]
    MissingPayload,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image codec failure: {0}")]
    Image(#[from] image::ImageError),
}

/// Encode an image as a `data:image/png;base64,...` URL
pub fn encode_data_url(image: &RgbaImage) -> Result<String, CodecError> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    let mut url = String::with_capacity(PNG_DATA_URL_HEADER.len() + png.len() * 4 / 3 + 4);
    url.push_str(PNG_DATA_URL_HEADER);
    BASE64_STANDARD.encode_string(&png, &mut url);
    Ok(url)
}

/// Decode any base64 image data URL into RGBA pixels.
///
/// Everything up to the first `,` is treated as the header, so replies
/// in other image formats decode as long as the codec supports them.
pub fn decode_data_url(url: &str) -> Result<RgbaImage, CodecError> {
    let (_header, payload) = url.split_once(',').ok_or(CodecError::MissingPayload)?;
    let bytes = BASE64_STANDARD.decode(payload.trim())?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encoded_url_has_png_header_and_decodes_back() {
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(2, 1, Rgba([10, 20, 30, 255]));

        let url = encode_data_url(&image).unwrap();
        assert!(url.starts_with(PNG_DATA_URL_HEADER));

        let decoded = decode_data_url(&url).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(matches!(
            decode_data_url("data:image/png;base64"),
            Err(CodecError::MissingPayload)
        ));
    }

    #[test]
    fn garbage_payload_is_rejected() {
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(CodecError::Base64(_))
        ));
        let not_an_image = format!("data:image/png;base64,{}", BASE64_STANDARD.encode(b"hello"));
        assert!(matches!(decode_data_url(&not_an_image), Err(CodecError::Image(_))));
    }
}
