//! Property IDs read by the messaging layer.

use crate::ltp::{PropertyTag, PropertyType};

pub const DISPLAY_NAME: u16 = 0x3001;
pub const ADDRESS_TYPE: u16 = 0x3002;
pub const EMAIL_ADDRESS: u16 = 0x3003;

// Message store.
pub const RECORD_KEY: u16 = 0x0FF9;
pub const IPM_SUBTREE_ENTRY_ID: u16 = 0x35E0;
pub const PST_PASSWORD: u16 = 0x67FF;

// Folders.
pub const CONTENT_COUNT: u16 = 0x3602;
pub const CONTENT_UNREAD_COUNT: u16 = 0x3603;
pub const SUBFOLDERS: u16 = 0x360A;
pub const CONTAINER_CLASS: u16 = 0x3613;

// Messages.
pub const MESSAGE_CLASS: u16 = 0x001A;
pub const SUBJECT: u16 = 0x0037;
pub const CLIENT_SUBMIT_TIME: u16 = 0x0039;
pub const SENT_REPRESENTING_NAME: u16 = 0x0042;
pub const TRANSPORT_MESSAGE_HEADERS: u16 = 0x007D;
pub const SENDER_NAME: u16 = 0x0C1A;
pub const DISPLAY_TO: u16 = 0x0E04;
pub const MESSAGE_DELIVERY_TIME: u16 = 0x0E06;
pub const MESSAGE_FLAGS: u16 = 0x0E07;
pub const MESSAGE_SIZE: u16 = 0x0E08;
pub const HAS_ATTACHMENTS: u16 = 0x0E1B;
pub const BODY: u16 = 0x1000;
pub const BODY_HTML: u16 = 0x1013;

// Recipients.
pub const RECIPIENT_TYPE: u16 = 0x0C15;

// Attachments.
pub const ATTACH_SIZE: u16 = 0x0E20;
pub const ATTACH_DATA: u16 = 0x3701;
pub const ATTACH_EXTENSION: u16 = 0x3703;
pub const ATTACH_FILENAME: u16 = 0x3704;
pub const ATTACH_METHOD: u16 = 0x3705;
pub const ATTACH_LONG_FILENAME: u16 = 0x3707;
pub const ATTACH_PATHNAME: u16 = 0x3708;
pub const ATTACH_LONG_PATHNAME: u16 = 0x370D;
pub const ATTACH_MIME_TAG: u16 = 0x370E;

// Name-to-ID map streams.
pub const NAMEID_STREAM_GUID: u16 = 0x0002;
pub const NAMEID_STREAM_ENTRY: u16 = 0x0003;
pub const NAMEID_STREAM_STRING: u16 = 0x0004;

/// The string form of a property, matching both string encodings.
#[must_use]
pub const fn string_tag(id: u16) -> PropertyTag {
    PropertyTag::new(id, PropertyType::String)
}

#[must_use]
pub const fn int_tag(id: u16) -> PropertyTag {
    PropertyTag::new(id, PropertyType::Integer32)
}

#[must_use]
pub const fn time_tag(id: u16) -> PropertyTag {
    PropertyTag::new(id, PropertyType::Time)
}
