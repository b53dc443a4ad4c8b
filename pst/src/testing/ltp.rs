//! Writers for LTP structures: heaps, BTHs, property and table contexts.

#![allow(clippy::cast_possible_truncation)]

use std::cmp::Reverse;

use crate::bytes::put_uint;
use crate::ltp::data_type::PropertyType;
use crate::ltp::heap::{ClientSignature, HEAP_SIGNATURE, Hid, MAX_ALLOCATION_SIZE};
use crate::ltp::tag::PropertyTag;
use crate::ndb::header::FileFormat;
use crate::ndb::ids::{Bid, Nid, NidType};
use crate::testing::ndb::FixtureBuilder;

/// Bytes a heap block may use, page map included. Below the smallest
/// block payload of every format.
const HEAP_BLOCK_LIMIT: usize = 8000;

struct HeapBlock {
    allocations: Vec<Vec<u8>>,
}

impl HeapBlock {
    fn used(&self, header: usize) -> usize {
        let data: usize = self.allocations.iter().map(Vec::len).sum();
        header + data + 4 + 2 * (self.allocations.len() + 1)
    }
}

/// Builds heap-on-node blocks.
pub struct HeapWriter {
    signature: ClientSignature,
    user_root: Hid,
    blocks: Vec<HeapBlock>,
}

impl HeapWriter {
    pub fn new(signature: ClientSignature) -> Self {
        Self {
            signature,
            user_root: Hid::default(),
            blocks: vec![HeapBlock {
                allocations: Vec::new(),
            }],
        }
    }

    const fn header_size(block_index: usize) -> usize {
        if block_index == 0 { 12 } else { 2 }
    }

    /// Store `bytes`, opening a new block when the current one is full.
    pub fn allocate(&mut self, bytes: &[u8]) -> Hid {
        let last = self.blocks.len() - 1;
        let used = self.blocks[last].used(Self::header_size(last));
        if used + bytes.len() + 2 > HEAP_BLOCK_LIMIT {
            self.start_block();
        }
        let block_index = self.blocks.len() - 1;
        let block = &mut self.blocks[block_index];
        block.allocations.push(bytes.to_vec());
        Hid::new(block_index as u16, block.allocations.len() as u16)
    }

    /// Further allocations go to a new block.
    pub fn start_block(&mut self) {
        self.blocks.push(HeapBlock {
            allocations: Vec::new(),
        });
    }

    pub const fn set_user_root(&mut self, root: Hid) {
        self.user_root = root;
    }

    /// The heap's data blocks, in chain order.
    pub fn finish(self) -> Vec<Vec<u8>> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| {
                let header = Self::header_size(index);
                let mut out = vec![0u8; header];
                if index == 0 {
                    out[2] = HEAP_SIGNATURE;
                    out[3] = self.signature.code();
                    out[4..8].copy_from_slice(&self.user_root.raw().to_le_bytes());
                }
                let mut offsets = vec![out.len() as u16];
                for allocation in &block.allocations {
                    out.extend(allocation);
                    offsets.push(out.len() as u16);
                }
                let map = out.len() as u16;
                out[0..2].copy_from_slice(&map.to_le_bytes());
                put_uint(&mut out, block.allocations.len() as u64, 2);
                put_uint(&mut out, 0, 2);
                for offset in offsets {
                    put_uint(&mut out, u64::from(offset), 2);
                }
                out
            })
            .collect()
    }
}

/// Write a BTH over `records` and return the HID of its header.
///
/// `fanout` caps records per node to force intermediate levels.
pub fn write_bth(
    heap: &mut HeapWriter,
    key_size: usize,
    value_size: usize,
    records: &[(u64, Vec<u8>)],
    fanout: Option<usize>,
) -> Hid {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|(key, _)| *key);

    let mut root = Hid::default();
    let mut levels = 0u8;
    if !sorted.is_empty() {
        let per_leaf = fanout.unwrap_or(MAX_ALLOCATION_SIZE / (key_size + value_size));
        let mut level: Vec<(u64, Hid)> = sorted
            .chunks(per_leaf.max(1))
            .map(|chunk| {
                let mut node = Vec::new();
                for (key, value) in chunk {
                    put_uint(&mut node, *key, key_size);
                    let mut value = value.clone();
                    value.resize(value_size, 0);
                    node.extend(value);
                }
                (chunk[0].0, heap.allocate(&node))
            })
            .collect();

        let per_branch = fanout.unwrap_or(MAX_ALLOCATION_SIZE / (key_size + 4)).max(2);
        while level.len() > 1 {
            level = level
                .chunks(per_branch)
                .map(|chunk| {
                    let mut node = Vec::new();
                    for (key, hid) in chunk {
                        put_uint(&mut node, *key, key_size);
                        put_uint(&mut node, u64::from(hid.raw()), 4);
                    }
                    (chunk[0].0, heap.allocate(&node))
                })
                .collect();
            levels += 1;
        }
        root = level[0].1;
    }

    let mut header = vec![0xB5, key_size as u8, value_size as u8, levels];
    header.extend(root.raw().to_le_bytes());
    heap.allocate(&header)
}

/// UTF-16LE bytes of `s`.
pub fn encode_unicode(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// A variable-size multi-value: count, offsets, then the elements.
pub fn encode_multi_value(elements: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    put_uint(&mut out, elements.len() as u64, 4);
    let mut offset = 4 + 4 * elements.len();
    for element in elements {
        put_uint(&mut out, offset as u64, 4);
        offset += element.len();
    }
    for element in elements {
        out.extend(element);
    }
    out
}

/// One property to store in a property context, as raw value bytes.
#[derive(Debug, Clone)]
pub struct PcProperty {
    pub tag: PropertyTag,
    pub bytes: Vec<u8>,
}

impl PcProperty {
    pub const fn new(id: u16, ptype: PropertyType, bytes: Vec<u8>) -> Self {
        Self {
            tag: PropertyTag::new(id, ptype),
            bytes,
        }
    }

    /// A property whose type code may be unknown.
    pub const fn new_raw(id: u16, type_code: u16, bytes: Vec<u8>) -> Self {
        Self {
            tag: PropertyTag::from_raw(((id as u32) << 16) | type_code as u32),
            bytes,
        }
    }
}

/// Allocates value storage: the heap for small values, sub-nodes for large
/// ones.
struct ValueStore {
    next_subnode: u32,
    subnodes: Vec<(Nid, Bid, Bid)>,
}

impl ValueStore {
    const fn new() -> Self {
        Self {
            next_subnode: 1,
            subnodes: Vec::new(),
        }
    }

    /// Store `bytes` and return the HNID that refers to them.
    fn store(&mut self, fixture: &mut FixtureBuilder, heap: &mut HeapWriter, bytes: &[u8]) -> u32 {
        if bytes.len() <= MAX_ALLOCATION_SIZE {
            return heap.allocate(bytes).raw();
        }
        let nid = Nid::new(NidType::Ltp, self.next_subnode);
        self.next_subnode += 1;
        let data = fixture.add_data_block(bytes);
        self.subnodes.push((nid, data, Bid::default()));
        nid.raw()
    }

    fn add_subnode(&mut self, fixture: &mut FixtureBuilder, blocks: &[Vec<u8>]) -> Nid {
        let nid = Nid::new(NidType::Ltp, self.next_subnode);
        self.next_subnode += 1;
        let data = fixture.add_block_list(blocks);
        self.subnodes.push((nid, data, Bid::default()));
        nid
    }

    /// Write the sub-node tree holding generated and `extra` sub-nodes.
    fn finish(mut self, fixture: &mut FixtureBuilder, extra: &[(Nid, Bid, Bid)]) -> Bid {
        self.subnodes.extend_from_slice(extra);
        if self.subnodes.is_empty() {
            return Bid::default();
        }
        self.subnodes.sort_by_key(|(nid, _, _)| *nid);
        fixture.add_subnode_tree(&self.subnodes)
    }
}

/// Store a property context and return its (data, sub-node) BIDs.
///
/// `extra_subnodes` joins the node's sub-node tree, for attachments and
/// tables that belong to the same node.
pub fn property_context(
    fixture: &mut FixtureBuilder,
    properties: &[PcProperty],
    extra_subnodes: &[(Nid, Bid, Bid)],
) -> (Bid, Bid) {
    let mut heap = HeapWriter::new(ClientSignature::PropertyContext);
    let mut store = ValueStore::new();

    let mut records = Vec::with_capacity(properties.len());
    for property in properties {
        let inline = property
            .tag
            .property_type()
            .is_ok_and(PropertyType::is_inline_in_property_context);
        let slot = if inline {
            let mut slot = property.bytes.clone();
            slot.resize(4, 0);
            slot
        } else {
            store.store(fixture, &mut heap, &property.bytes).to_le_bytes().to_vec()
        };
        let mut record = property.tag.type_code().to_le_bytes().to_vec();
        record.extend(slot);
        records.push((u64::from(property.tag.id()), record));
    }

    let root = write_bth(&mut heap, 2, 6, &records, None);
    heap.set_user_root(root);
    let data = fixture.add_block_list(&heap.finish());
    let subnodes = store.finish(fixture, extra_subnodes);
    (data, subnodes)
}

/// One row to store in a table context.
#[derive(Debug, Clone)]
pub struct TcRow {
    pub row_id: u32,
    pub cells: Vec<(PropertyTag, Vec<u8>)>,
}

impl TcRow {
    pub const fn new(row_id: u32) -> Self {
        Self {
            row_id,
            cells: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, tag: PropertyTag, bytes: Vec<u8>) -> Self {
        self.cells.push((tag, bytes));
        self
    }

    #[must_use]
    pub fn with_if(self, condition: bool, tag: PropertyTag, bytes: Vec<u8>) -> Self {
        if condition { self.with(tag, bytes) } else { self }
    }
}

/// `PidTagLtpRowId`, the first column of every table.
pub const LTP_ROW_ID: PropertyTag = PropertyTag::new(0x67F2, PropertyType::Integer32);
/// `PidTagLtpRowVer`, the second column of every table.
pub const LTP_ROW_VER: PropertyTag = PropertyTag::new(0x67F3, PropertyType::Integer32);

struct ColumnLayout {
    tag: PropertyTag,
    offset: usize,
    size: usize,
    bit: usize,
}

fn cell_size(tag: PropertyTag) -> usize {
    match tag.property_type() {
        Ok(ptype) if ptype.is_inline_in_table_context() => ptype.fixed_size().unwrap_or(4),
        _ => 4,
    }
}

/// Lay out columns: row ID and version first, then 8/4, 2 and 1-byte
/// cells. Returns the layouts sorted by tag and the `rgib` boundaries.
fn layout_columns(columns: &[PropertyTag]) -> (Vec<ColumnLayout>, [usize; 4]) {
    let mut all = vec![LTP_ROW_ID, LTP_ROW_VER];
    all.extend_from_slice(columns);
    let mut order: Vec<(usize, PropertyTag)> = all.into_iter().enumerate().collect();
    order[2..].sort_by_key(|(_, tag)| Reverse(cell_size(*tag)));

    let mut layouts = Vec::with_capacity(order.len());
    let mut boundaries = [0usize; 4];
    let mut offset = 0;
    for (bit, tag) in order {
        let size = cell_size(tag);
        layouts.push(ColumnLayout {
            tag,
            offset,
            size,
            bit,
        });
        offset += size;
        let group = match size {
            2 => 1,
            1 => 2,
            _ => 0,
        };
        for boundary in &mut boundaries[group..] {
            *boundary = offset;
        }
    }
    layouts.sort_by_key(|layout| layout.tag);
    (layouts, boundaries)
}

/// Store a table context and return its (data, sub-node) BIDs.
///
/// Cells absent from a row are left unset in its existence bitmap. With
/// `rows_in_subnode` the row matrix goes to a sub-node, split into blocks
/// that each hold whole rows.
pub fn table_context(
    fixture: &mut FixtureBuilder,
    columns: &[PropertyTag],
    rows: &[TcRow],
    extra_subnodes: &[(Nid, Bid, Bid)],
    rows_in_subnode: bool,
) -> (Bid, Bid) {
    let format = fixture.format();
    let mut heap = HeapWriter::new(ClientSignature::TableContext);
    let mut store = ValueStore::new();

    let (layouts, boundaries) = layout_columns(columns);
    let cells_end = boundaries[3];
    let row_size = cells_end + layouts.len().div_ceil(8);

    let mut matrix = Vec::with_capacity(rows.len() * row_size);
    for row in rows {
        let mut bytes = vec![0u8; row_size];
        let mut cells = vec![(LTP_ROW_ID, row.row_id.to_le_bytes().to_vec())];
        cells.push((LTP_ROW_VER, vec![0; 4]));
        cells.extend(row.cells.iter().cloned());
        for (tag, value) in cells {
            let Some(layout) = layouts.iter().find(|layout| layout.tag == tag) else {
                continue;
            };
            let inline = tag
                .property_type()
                .is_ok_and(PropertyType::is_inline_in_table_context);
            let mut cell = if inline {
                value
            } else {
                store.store(fixture, &mut heap, &value).to_le_bytes().to_vec()
            };
            cell.resize(layout.size, 0);
            bytes[layout.offset..layout.offset + layout.size].copy_from_slice(&cell);
            bytes[cells_end + layout.bit / 8] |= 0x80 >> (layout.bit % 8);
        }
        matrix.extend(bytes);
    }

    let rows_hnid = if rows.is_empty() {
        0
    } else if rows_in_subnode {
        let per_block = format.max_block_data() / row_size;
        let blocks: Vec<Vec<u8>> = matrix.chunks(per_block * row_size).map(<[u8]>::to_vec).collect();
        store.add_subnode(fixture, &blocks).raw()
    } else {
        heap.allocate(&matrix).raw()
    };

    let index_value_size = if format == FileFormat::Ansi { 2 } else { 4 };
    let index_records: Vec<(u64, Vec<u8>)> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut value = Vec::new();
            put_uint(&mut value, index as u64, index_value_size);
            (u64::from(row.row_id), value)
        })
        .collect();
    let row_index = write_bth(&mut heap, 4, index_value_size, &index_records, None);

    let mut info = vec![0x7C, layouts.len() as u8];
    for boundary in boundaries {
        put_uint(&mut info, boundary as u64, 2);
    }
    put_uint(&mut info, u64::from(row_index.raw()), 4);
    put_uint(&mut info, u64::from(rows_hnid), 4);
    put_uint(&mut info, 0, 4);
    for layout in &layouts {
        put_uint(&mut info, u64::from(layout.tag.raw()), 4);
        put_uint(&mut info, layout.offset as u64, 2);
        info.push(layout.size as u8);
        info.push(layout.bit as u8);
    }
    let root = heap.allocate(&info);
    heap.set_user_root(root);

    let data = fixture.add_block_list(&heap.finish());
    let subnodes = store.finish(fixture, extra_subnodes);
    (data, subnodes)
}
