//! Off-thread decoding of reply images

use std::sync::Arc;
use std::thread;

use image::RgbaImage;

use super::session::{AttemptId, PaintRequest, ReplyTarget};
use crate::codec::{decode_data_url, CodecError};

/// Result of decoding one [`PaintRequest`]
#[derive(Debug)]
pub struct DecodedReply {
    pub attempt: AttemptId,
    pub target: ReplyTarget,
    pub surface_id: String,
    pub image: Result<RgbaImage, CodecError>,
}

/// Receives finished decodes, on the worker thread that produced them
pub type DecodeSink = Arc<dyn Fn(DecodedReply) + Send + Sync>;

/// Decodes reply data URLs on worker threads.
///
/// Each request gets its own short-lived thread; completions are handed to
/// the sink in whatever order they finish.
pub struct ReplyDecoder {
    sink: DecodeSink,
}

impl ReplyDecoder {
    pub fn new(sink: DecodeSink) -> Self {
        Self { sink }
    }

    /// Start decoding `request` in the background
    pub fn decode(&self, request: PaintRequest) {
        let sink = Arc::clone(&self.sink);
        let spawned = thread::Builder::new()
            .name(format!("decode-{}", request.surface_id))
            .spawn(move || {
                let image = decode_data_url(&request.data_url);
                if let Err(error) = &image {
                    log::warn!("Failed to decode reply for {:?}: {error}", request.surface_id);
                }
                sink(DecodedReply {
                    attempt: request.attempt,
                    target: request.target,
                    surface_id: request.surface_id,
                    image,
                });
            });
        if let Err(error) = spawned {
            log::error!("Failed to spawn decode thread: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_data_url;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn decoded_image_reaches_the_sink() {
        let (tx, rx) = mpsc::channel();
        let decoder = ReplyDecoder::new(Arc::new(move |reply| {
            let _ = tx.send(reply);
        }));

        let url = encode_data_url(&RgbaImage::new(4, 3)).unwrap();
        decoder.decode(PaintRequest {
            attempt: AttemptId(1),
            target: ReplyTarget::Display,
            surface_id: "out".into(),
            data_url: url,
        });

        let reply = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(reply.attempt, AttemptId(1));
        assert_eq!(reply.image.unwrap().dimensions(), (4, 3));
    }

    #[test]
    fn bad_payload_is_reported_not_dropped() {
        let (tx, rx) = mpsc::channel();
        let decoder = ReplyDecoder::new(Arc::new(move |reply| {
            let _ = tx.send(reply);
        }));
        decoder.decode(PaintRequest {
            attempt: AttemptId(2),
            target: ReplyTarget::Annotation,
            surface_id: "out".into(),
            data_url: "garbage".into(),
        });

        let reply = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(reply.image, Err(CodecError::MissingPayload)));
    }
}
