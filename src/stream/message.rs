//! Wire messages exchanged with the image processor

use serde::{Deserialize, Serialize};

use crate::projection::NormalizedBBox;

/// Text frame sent right before the client closes the transport
pub const CLOSE_SENTINEL: &str = "close";

/// Bounding box of one tracked object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedBBox {
    pub bbox: NormalizedBBox,
    pub obj_tag: String,
}

/// Outbound frame: both renders plus the boxes of every display object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMessage {
    pub image: String,
    pub seg_image: String,
    pub bboxes: Vec<TaggedBBox>,
}

/// Inbound reply; each field is independently optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seg_image: Option<String>,
}
