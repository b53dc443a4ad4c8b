//! A small but complete mailbox: store, name-to-ID map, folder tree,
//! messages with recipients and attachments.
//!
//! ```text
//! store (0x21) ── root folder (0x122)
//!                   ├─ Inbox (0x8022)
//!                   │    ├─ Projects (0x8082)
//!                   │    ├─ message 0x200024  IPM.Note, 2 recipients,
//!                   │    │                    report.pdf + embedded message
//!                   │    └─ message 0x200044  IPM.Appointment
//!                   └─ Deleted Items (0x8042)   no tables
//! ```

#![allow(clippy::cast_possible_truncation)]

use std::io::Write;

use tempfile::NamedTempFile;

use crate::ltp::data_type::{FileTime, Guid, PropertyType};
use crate::ltp::tag::PropertyTag;
use crate::messaging::tags;
use crate::ndb::crc::compute_crc;
use crate::ndb::crypt::Encryption;
use crate::ndb::header::FileFormat;
use crate::ndb::ids::{Bid, Nid, NidType};
use crate::testing::ltp::{PcProperty, TcRow, encode_unicode, property_context, table_context};
use crate::testing::ndb::FixtureBuilder;

/// A built image and the identifiers tests look things up by.
pub struct SampleMailbox {
    pub bytes: Vec<u8>,
    pub format: FileFormat,
    pub encryption: Encryption,
}

impl SampleMailbox {
    pub const STORE_NAME: &'static str = "Personal Folders";
    pub const ROOT: Nid = Nid::ROOT_FOLDER;
    pub const INBOX: Nid = Nid::new(NidType::NormalFolder, 0x401);
    pub const DELETED_ITEMS: Nid = Nid::new(NidType::NormalFolder, 0x402);
    pub const PROJECTS: Nid = Nid::new(NidType::NormalFolder, 0x404);
    /// Listed in the root hierarchy table by [`MailboxBuilder::with_dangling_folder`]
    /// but never written.
    pub const DANGLING_FOLDER: Nid = Nid::new(NidType::NormalFolder, 0x403);
    pub const REPORT: Nid = Nid::new(NidType::NormalMessage, 0x1_0001);
    pub const MEETING: Nid = Nid::new(NidType::NormalMessage, 0x1_0002);
    pub const PDF_ATTACHMENT: Nid = Nid::new(NidType::Attachment, 0x401);
    pub const EMBEDDED_ATTACHMENT: Nid = Nid::new(NidType::Attachment, 0x402);
    pub const EMBEDDED_MESSAGE: Nid = Nid::new(NidType::NormalMessage, 0x20);
    pub const PASSWORD: &'static str = "hunter2";

    /// Seconds since the Unix epoch of the report's delivery time.
    pub const DELIVERY_SECONDS: i64 = 1_700_000_000;

    /// The PDF attachment's content, large enough to need its own sub-node.
    #[must_use]
    pub fn pdf_bytes() -> Vec<u8> {
        (0..5000u32).map(|i| (i % 251) as u8).collect()
    }
}

/// The custom property set used by the sample name-to-ID map.
pub const SAMPLE_PROPERTY_SET: Guid =
    Guid::from_fields(0x0006_2008, 0, 0, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);

/// Assembles the sample mailbox, with switches for the variations tests
/// need.
pub struct MailboxBuilder {
    fixture: FixtureBuilder,
    format: FileFormat,
    encryption: Encryption,
    password: bool,
    dangling_folder: bool,
    name_to_id: bool,
    rows_in_subnode: bool,
}

impl MailboxBuilder {
    pub const fn new(format: FileFormat, encryption: Encryption) -> Self {
        Self {
            fixture: FixtureBuilder::new(format, encryption),
            format,
            encryption,
            password: false,
            dangling_folder: false,
            name_to_id: true,
            rows_in_subnode: false,
        }
    }

    /// Protect the store with [`SampleMailbox::PASSWORD`].
    #[must_use]
    pub const fn with_password(mut self) -> Self {
        self.password = true;
        self
    }

    /// List [`SampleMailbox::DANGLING_FOLDER`] in the root hierarchy table.
    #[must_use]
    pub const fn with_dangling_folder(mut self) -> Self {
        self.dangling_folder = true;
        self
    }

    #[must_use]
    pub const fn without_name_to_id_map(mut self) -> Self {
        self.name_to_id = false;
        self
    }

    /// Store table row matrices in sub-nodes instead of the heap.
    #[must_use]
    pub const fn with_rows_in_subnodes(mut self) -> Self {
        self.rows_in_subnode = true;
        self
    }

    #[must_use]
    pub fn with_page_fanout(mut self, fanout: usize) -> Self {
        self.fixture = self.fixture.with_page_fanout(fanout);
        self
    }

    /// The string tag this format's writer would use.
    const fn string_tag(&self, id: u16) -> PropertyTag {
        match self.format {
            FileFormat::Ansi => PropertyTag::new(id, PropertyType::String8),
            FileFormat::Unicode | FileFormat::Ost2013 => PropertyTag::new(id, PropertyType::String),
        }
    }

    fn encode_string(&self, value: &str) -> Vec<u8> {
        match self.format {
            FileFormat::Ansi => value.chars().map(|c| c as u8).collect(),
            FileFormat::Unicode | FileFormat::Ost2013 => encode_unicode(value),
        }
    }

    fn text(&self, id: u16, value: &str) -> PcProperty {
        PcProperty {
            tag: self.string_tag(id),
            bytes: self.encode_string(value),
        }
    }

    fn text_cell(&self, id: u16, value: &str) -> (PropertyTag, Vec<u8>) {
        (self.string_tag(id), self.encode_string(value))
    }

    pub fn build(mut self) -> SampleMailbox {
        self.write_store();
        if self.name_to_id {
            self.write_name_to_id_map();
        }
        self.write_root_folder();
        self.write_inbox();
        self.write_folder(SampleMailbox::DELETED_ITEMS, SampleMailbox::ROOT, "Deleted Items", false);
        self.write_folder(SampleMailbox::PROJECTS, SampleMailbox::INBOX, "Projects", true);
        self.write_report();
        self.write_meeting();
        SampleMailbox {
            bytes: self.fixture.build(),
            format: self.format,
            encryption: self.encryption,
        }
    }

    fn write_store(&mut self) {
        let mut entry_id = vec![0u8; 20];
        entry_id.extend(SampleMailbox::ROOT.raw().to_le_bytes());
        let mut properties = vec![
            self.text(tags::DISPLAY_NAME, SampleMailbox::STORE_NAME),
            PcProperty::new(tags::RECORD_KEY, PropertyType::Binary, vec![0x5A; 16]),
            PcProperty::new(tags::IPM_SUBTREE_ENTRY_ID, PropertyType::Binary, entry_id),
        ];
        if self.password {
            let crc = compute_crc(SampleMailbox::PASSWORD.as_bytes());
            properties.push(PcProperty::new(
                tags::PST_PASSWORD,
                PropertyType::Integer32,
                crc.to_le_bytes().to_vec(),
            ));
        }
        let (data, subnodes) = property_context(&mut self.fixture, &properties, &[]);
        self.fixture
            .add_node(Nid::MESSAGE_STORE, data, subnodes, Nid::from_raw(0));
    }

    fn write_name_to_id_map(&mut self) {
        let name = encode_unicode("Keywords");
        let mut strings = (name.len() as u32).to_le_bytes().to_vec();
        strings.extend(name);

        // 0x8000: numeric 0x8501 in the custom set (GUID stream index 3).
        // 0x8001: "Keywords" in PS_PUBLIC_STRINGS.
        let mut entries = 0x8501u32.to_le_bytes().to_vec();
        entries.extend((3u16 << 1).to_le_bytes());
        entries.extend(0u16.to_le_bytes());
        entries.extend(0u32.to_le_bytes());
        entries.extend(((2u16 << 1) | 1).to_le_bytes());
        entries.extend(1u16.to_le_bytes());

        let properties = [
            PcProperty::new(tags::NAMEID_STREAM_GUID, PropertyType::Binary, SAMPLE_PROPERTY_SET.0.to_vec()),
            PcProperty::new(tags::NAMEID_STREAM_ENTRY, PropertyType::Binary, entries),
            PcProperty::new(tags::NAMEID_STREAM_STRING, PropertyType::Binary, strings),
        ];
        let (data, subnodes) = property_context(&mut self.fixture, &properties, &[]);
        self.fixture
            .add_node(Nid::NAME_TO_ID_MAP, data, subnodes, Nid::from_raw(0));
    }

    fn folder_properties(&self, name: &str, content_count: i32, has_subfolders: bool) -> Vec<PcProperty> {
        vec![
            self.text(tags::DISPLAY_NAME, name),
            PcProperty::new(tags::CONTENT_COUNT, PropertyType::Integer32, content_count.to_le_bytes().to_vec()),
            PcProperty::new(tags::CONTENT_UNREAD_COUNT, PropertyType::Integer32, vec![0; 4]),
            PcProperty::new(tags::SUBFOLDERS, PropertyType::Boolean, vec![u8::from(has_subfolders)]),
        ]
    }

    fn hierarchy_row(&self, nid: Nid, name: &str) -> TcRow {
        let (tag, bytes) = self.text_cell(tags::DISPLAY_NAME, name);
        TcRow::new(nid.raw()).with(tag, bytes)
    }

    /// Write the three tables of `folder`.
    fn write_folder_tables(&mut self, folder: Nid, subfolders: &[TcRow], contents: &[TcRow]) {
        let hierarchy_columns = [self.string_tag(tags::DISPLAY_NAME)];
        let contents_columns = [
            self.string_tag(tags::SUBJECT),
            self.string_tag(tags::MESSAGE_CLASS),
            PropertyTag::new(tags::MESSAGE_DELIVERY_TIME, PropertyType::Time),
            PropertyTag::new(tags::MESSAGE_FLAGS, PropertyType::Integer32),
            PropertyTag::new(tags::MESSAGE_SIZE, PropertyType::Integer32),
        ];
        let tables: [(NidType, &[PropertyTag], &[TcRow]); 3] = [
            (NidType::HierarchyTable, &hierarchy_columns, subfolders),
            (NidType::ContentsTable, &contents_columns, contents),
            (NidType::AssocContentsTable, &contents_columns, &[]),
        ];
        for (nid_type, columns, rows) in tables {
            let (data, subnodes) =
                table_context(&mut self.fixture, columns, rows, &[], self.rows_in_subnode);
            self.fixture
                .add_node(folder.with_type(nid_type), data, subnodes, folder);
        }
    }

    fn write_root_folder(&mut self) {
        let properties = self.folder_properties("", 0, true);
        let (data, subnodes) = property_context(&mut self.fixture, &properties, &[]);
        self.fixture
            .add_node(SampleMailbox::ROOT, data, subnodes, SampleMailbox::ROOT);

        let mut subfolders = vec![
            self.hierarchy_row(SampleMailbox::INBOX, "Inbox"),
            self.hierarchy_row(SampleMailbox::DELETED_ITEMS, "Deleted Items"),
        ];
        if self.dangling_folder {
            subfolders.push(self.hierarchy_row(SampleMailbox::DANGLING_FOLDER, "Lost"));
        }
        self.write_folder_tables(SampleMailbox::ROOT, &subfolders, &[]);
    }

    fn write_inbox(&mut self) {
        let mut properties = self.folder_properties("Inbox", 2, true);
        properties.push(self.text(tags::CONTAINER_CLASS, "IPF.Note"));
        let (data, subnodes) = property_context(&mut self.fixture, &properties, &[]);
        self.fixture
            .add_node(SampleMailbox::INBOX, data, subnodes, SampleMailbox::ROOT);

        let subfolders = [self.hierarchy_row(SampleMailbox::PROJECTS, "Projects")];
        let delivery = FileTime::from_unix_seconds(SampleMailbox::DELIVERY_SECONDS);
        let (subject_tag, subject) = self.text_cell(tags::SUBJECT, "\u{1}\u{4}RE: Quarterly report");
        let (class_tag, class) = self.text_cell(tags::MESSAGE_CLASS, "IPM.Note");
        let (meeting_subject_tag, meeting_subject) = self.text_cell(tags::SUBJECT, "Team sync");
        let (meeting_class_tag, meeting_class) = self.text_cell(tags::MESSAGE_CLASS, "IPM.Appointment");
        let contents = [
            TcRow::new(SampleMailbox::REPORT.raw())
                .with(subject_tag, subject)
                .with(class_tag, class)
                .with(
                    PropertyTag::new(tags::MESSAGE_DELIVERY_TIME, PropertyType::Time),
                    delivery.0.to_le_bytes().to_vec(),
                )
                .with(PropertyTag::new(tags::MESSAGE_FLAGS, PropertyType::Integer32), 1i32.to_le_bytes().to_vec())
                .with(PropertyTag::new(tags::MESSAGE_SIZE, PropertyType::Integer32), 6144i32.to_le_bytes().to_vec()),
            TcRow::new(SampleMailbox::MEETING.raw())
                .with(meeting_subject_tag, meeting_subject)
                .with(meeting_class_tag, meeting_class),
        ];
        self.write_folder_tables(SampleMailbox::INBOX, &subfolders, &contents);
    }

    /// A folder with only its property context.
    fn write_folder(&mut self, nid: Nid, parent: Nid, name: &str, with_class: bool) {
        let mut properties = self.folder_properties(name, 0, false);
        if with_class {
            properties.push(self.text(tags::CONTAINER_CLASS, "IPF.Note"));
        }
        let (data, subnodes) = property_context(&mut self.fixture, &properties, &[]);
        self.fixture.add_node(nid, data, subnodes, parent);
    }

    fn recipient_table(&mut self) -> (Bid, Bid) {
        let columns = [
            self.string_tag(tags::DISPLAY_NAME),
            self.string_tag(tags::EMAIL_ADDRESS),
            self.string_tag(tags::ADDRESS_TYPE),
            PropertyTag::new(tags::RECIPIENT_TYPE, PropertyType::Integer32),
        ];
        let recipient = |row_id: u32, name: &str, address: &str, kind: i32| {
            let (name_tag, name) = self.text_cell(tags::DISPLAY_NAME, name);
            let (address_tag, address) = self.text_cell(tags::EMAIL_ADDRESS, address);
            let (type_tag, address_type) = self.text_cell(tags::ADDRESS_TYPE, "SMTP");
            TcRow::new(row_id)
                .with(name_tag, name)
                .with(address_tag, address)
                .with(type_tag, address_type)
                .with(
                    PropertyTag::new(tags::RECIPIENT_TYPE, PropertyType::Integer32),
                    kind.to_le_bytes().to_vec(),
                )
        };
        let rows = [
            recipient(0, "Bob Example", "bob@example.com", 1),
            recipient(1, "Carol Example", "carol@example.com", 2),
        ];
        table_context(&mut self.fixture, &columns, &rows, &[], self.rows_in_subnode)
    }

    fn attachment_table(&mut self) -> (Bid, Bid) {
        let columns = [
            self.string_tag(tags::ATTACH_LONG_FILENAME),
            PropertyTag::new(tags::ATTACH_METHOD, PropertyType::Integer32),
        ];
        let (name_tag, name) = self.text_cell(tags::ATTACH_LONG_FILENAME, "report.pdf");
        let rows = [
            TcRow::new(SampleMailbox::PDF_ATTACHMENT.raw())
                .with(name_tag, name)
                .with(
                    PropertyTag::new(tags::ATTACH_METHOD, PropertyType::Integer32),
                    1i32.to_le_bytes().to_vec(),
                ),
            TcRow::new(SampleMailbox::EMBEDDED_ATTACHMENT.raw()).with(
                PropertyTag::new(tags::ATTACH_METHOD, PropertyType::Integer32),
                5i32.to_le_bytes().to_vec(),
            ),
        ];
        table_context(&mut self.fixture, &columns, &rows, &[], self.rows_in_subnode)
    }

    fn pdf_attachment(&mut self) -> (Bid, Bid) {
        let data = SampleMailbox::pdf_bytes();
        let properties = [
            PcProperty::new(tags::ATTACH_METHOD, PropertyType::Integer32, 1i32.to_le_bytes().to_vec()),
            self.text(tags::ATTACH_LONG_FILENAME, "report.pdf"),
            self.text(tags::ATTACH_FILENAME, "REPORT.PDF"),
            self.text(tags::ATTACH_EXTENSION, ".pdf"),
            self.text(tags::ATTACH_MIME_TAG, "Application/PDF"),
            PcProperty::new(
                tags::ATTACH_SIZE,
                PropertyType::Integer32,
                (data.len() as i32).to_le_bytes().to_vec(),
            ),
            PcProperty::new(tags::ATTACH_DATA, PropertyType::Binary, data),
        ];
        property_context(&mut self.fixture, &properties, &[])
    }

    /// A message attachment whose message lives in the attachment's own
    /// sub-node tree.
    fn embedded_attachment(&mut self) -> (Bid, Bid) {
        let message_properties = [
            self.text(tags::SUBJECT, "Original request"),
            self.text(tags::MESSAGE_CLASS, "IPM.Note"),
            self.text(tags::BODY, "Please send the numbers."),
        ];
        let (message_data, message_subnodes) =
            property_context(&mut self.fixture, &message_properties, &[]);

        let mut object = SampleMailbox::EMBEDDED_MESSAGE.raw().to_le_bytes().to_vec();
        object.extend(512u32.to_le_bytes());
        let properties = [
            PcProperty::new(tags::ATTACH_METHOD, PropertyType::Integer32, 5i32.to_le_bytes().to_vec()),
            self.text(tags::DISPLAY_NAME, "Original request"),
            PcProperty::new(tags::ATTACH_DATA, PropertyType::Object, object),
        ];
        property_context(
            &mut self.fixture,
            &properties,
            &[(SampleMailbox::EMBEDDED_MESSAGE, message_data, message_subnodes)],
        )
    }

    fn write_report(&mut self) {
        let (attachments_data, attachments_subnodes) = self.attachment_table();
        let (recipients_data, recipients_subnodes) = self.recipient_table();
        let (pdf_data, pdf_subnodes) = self.pdf_attachment();
        let (embedded_data, embedded_subnodes) = self.embedded_attachment();

        let delivery = FileTime::from_unix_seconds(SampleMailbox::DELIVERY_SECONDS);
        let properties = [
            self.text(tags::SUBJECT, "\u{1}\u{4}RE: Quarterly report"),
            self.text(tags::MESSAGE_CLASS, "IPM.Note"),
            self.text(tags::BODY, "Numbers attached."),
            self.text(tags::SENDER_NAME, "Alice Example"),
            self.text(tags::DISPLAY_TO, "Bob Example"),
            PcProperty::new(tags::MESSAGE_DELIVERY_TIME, PropertyType::Time, delivery.0.to_le_bytes().to_vec()),
            PcProperty::new(tags::MESSAGE_FLAGS, PropertyType::Integer32, 1i32.to_le_bytes().to_vec()),
            PcProperty::new(tags::MESSAGE_SIZE, PropertyType::Integer32, 6144i32.to_le_bytes().to_vec()),
            PcProperty::new(tags::HAS_ATTACHMENTS, PropertyType::Boolean, vec![1]),
            PcProperty::new(0x8000, PropertyType::Integer32, 42i32.to_le_bytes().to_vec()),
        ];
        let subnodes = [
            (
                crate::messaging::message::ATTACHMENT_TABLE,
                attachments_data,
                attachments_subnodes,
            ),
            (
                crate::messaging::message::RECIPIENT_TABLE,
                recipients_data,
                recipients_subnodes,
            ),
            (SampleMailbox::PDF_ATTACHMENT, pdf_data, pdf_subnodes),
            (SampleMailbox::EMBEDDED_ATTACHMENT, embedded_data, embedded_subnodes),
        ];
        let (data, subnodes) = property_context(&mut self.fixture, &properties, &subnodes);
        self.fixture
            .add_node(SampleMailbox::REPORT, data, subnodes, SampleMailbox::INBOX);
    }

    fn write_meeting(&mut self) {
        let properties = [
            self.text(tags::SUBJECT, "Team sync"),
            self.text(tags::MESSAGE_CLASS, "IPM.Appointment"),
        ];
        let (data, subnodes) = property_context(&mut self.fixture, &properties, &[]);
        self.fixture
            .add_node(SampleMailbox::MEETING, data, subnodes, SampleMailbox::INBOX);
    }
}

/// The default sample mailbox in `format` and `encryption`.
pub fn sample_mailbox(format: FileFormat, encryption: Encryption) -> SampleMailbox {
    MailboxBuilder::new(format, encryption).build()
}

/// Write `bytes` to a temporary file that lives as long as the handle.
pub fn write_temp_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}
