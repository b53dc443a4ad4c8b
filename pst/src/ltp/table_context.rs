//! Table context: rows of cells sharing one column layout.
//!
//! The heap's user root is a `TCINFO`:
//!
//! ```text
//! +-------+-------+----------------+-------------+----------+----------+
//! | bType | cCols | rgib u16[4]    | hidRowIndex | hnidRows | hidIndex |
//! | 0x7C  | u8    |                | u32         | u32      | u32      |
//! +-------+-------+----------------+-------------+----------+----------+
//! | TCOLDESC[cCols]: tag u32, ibData u16, cbData u8, iBit u8          |
//! +--------------------------------------------------------------------+
//! ```
//!
//! Each row is `rgib[3]` bytes of cells followed by a cell existence bitmap
//! of `ceil(cCols / 8)` bytes. The row matrix lives in one heap allocation,
//! or in a sub-node whose blocks each hold a whole number of rows.
//! `hidRowIndex` is a BTH mapping row IDs to row indexes.

#![allow(clippy::cast_possible_truncation)]

use tracing::debug;

use crate::bytes::{bytes_at, u8_at, u16_at, u32_at};
use crate::ltp::bth::BTreeOnHeap;
use crate::ltp::data_type::{PropertyValue, decode_inline, decode_value};
use crate::ltp::error::LtpError;
use crate::ltp::heap::{ClientSignature, HeapOnNode, Hid, Hnid};
use crate::ltp::tag::PropertyTag;
use crate::ndb::database::{Ndb, NodeRef};

/// `bType` of a TCINFO.
pub const TCINFO_SIGNATURE: u8 = 0x7C;

const TCINFO_SIZE: usize = 22;
const COLUMN_SIZE: usize = 8;

/// Index into `rgib` of the end of the cells, where the bitmap starts.
const TCI_BM: usize = 3;

/// One column description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub tag: PropertyTag,
    /// Offset of the cell in the row.
    pub offset: usize,
    /// Size of the cell.
    pub size: usize,
    /// Bit of the cell existence bitmap.
    pub bit: usize,
}

#[derive(Debug)]
enum RowMatrix {
    Empty,
    Blocks(Vec<Vec<u8>>),
}

/// An opened table context.
#[derive(Debug)]
pub struct TableContext<'a> {
    ndb: &'a Ndb,
    node: NodeRef,
    heap: HeapOnNode,
    columns: Vec<Column>,
    /// `rgib` boundaries: ends of the 4/8-byte, 2-byte, 1-byte cells, and of all cells.
    boundaries: [usize; 4],
    row_index: Hid,
    rows: RowMatrix,
    row_count: usize,
}

impl<'a> TableContext<'a> {
    pub fn open(ndb: &'a Ndb, node: &NodeRef) -> Result<Self, LtpError> {
        let heap = HeapOnNode::open(ndb, node)?;
        if heap.client_signature() != ClientSignature::TableContext {
            return Err(LtpError::NotTableContext(heap.client_signature()));
        }
        let info = heap.get(heap.user_root())?;
        if info.len() < TCINFO_SIZE || u8_at(info, 0) != Some(TCINFO_SIGNATURE) {
            return Err(LtpError::UnparseableTableContext("bad TCINFO header"));
        }
        let column_count = usize::from(u8_at(info, 1).unwrap_or_default());
        let mut boundaries = [0usize; 4];
        for (i, boundary) in boundaries.iter_mut().enumerate() {
            *boundary = usize::from(u16_at(info, 2 + 2 * i).unwrap_or_default());
        }
        if boundaries.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(LtpError::UnparseableTableContext("rgib offsets out of order"));
        }
        let row_index = Hid::from_raw(u32_at(info, 10).unwrap_or_default());
        let rows_hnid = Hnid::from_raw(u32_at(info, 14).unwrap_or_default());

        let columns = parse_columns(info, column_count, boundaries[TCI_BM])?;

        let mut table = Self {
            ndb,
            node: *node,
            heap,
            columns,
            boundaries,
            row_index,
            rows: RowMatrix::Empty,
            row_count: 0,
        };
        table.load_rows(rows_hnid)?;
        debug!(
            nid = %node.nid,
            columns = table.columns.len(),
            rows = table.row_count,
            "opened table context"
        );
        Ok(table)
    }

    fn load_rows(&mut self, hnid: Hnid) -> Result<(), LtpError> {
        let blocks = match hnid {
            Hnid::Null => return Ok(()),
            Hnid::Heap(hid) => vec![self.heap.get(hid)?.to_vec()],
            Hnid::Subnode(nid) => {
                let entry = self
                    .ndb
                    .subnodes(self.node.subnodes)
                    .find(nid)?
                    .ok_or(LtpError::SubnodeNotFound(nid))?;
                self.ndb.read_node_blocks(&NodeRef::from(entry))?
            }
        };
        let row_size = self.row_size();
        if row_size == 0 {
            return Err(LtpError::UnparseableTableContext("zero row size"));
        }
        self.row_count = blocks.iter().map(|block| block.len() / row_size).sum();
        self.rows = RowMatrix::Blocks(blocks);
        Ok(())
    }

    #[must_use]
    pub const fn node(&self) -> &NodeRef {
        &self.node
    }

    /// Columns in the order they are stored.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    /// Size of one row: the cells plus the existence bitmap.
    #[must_use]
    pub fn row_size(&self) -> usize {
        self.boundaries[TCI_BM] + self.columns.len().div_ceil(8)
    }

    fn row(&self, row: usize) -> Result<&[u8], LtpError> {
        let out_of_range = LtpError::RowOutOfRange {
            row,
            rows: self.row_count,
        };
        let RowMatrix::Blocks(blocks) = &self.rows else {
            return Err(out_of_range);
        };
        let row_size = self.row_size();
        let mut remaining = row;
        for block in blocks {
            let in_block = block.len() / row_size;
            if remaining < in_block {
                return bytes_at(block, remaining * row_size, row_size).ok_or(out_of_range);
            }
            remaining -= in_block;
        }
        Err(out_of_range)
    }

    /// The row ID stored in the first cell of `row`.
    pub fn row_id(&self, row: usize) -> Result<u32, LtpError> {
        let bytes = self.row(row)?;
        u32_at(bytes, 0).ok_or(LtpError::UnparseableTableContext("row shorter than its ID"))
    }

    /// The index of the row whose ID is `row_id`, via the row index BTH.
    pub fn find_row(&self, row_id: u32) -> Result<Option<usize>, LtpError> {
        if self.row_index.is_null() {
            return Ok(None);
        }
        let bth = BTreeOnHeap::open(&self.heap, self.row_index)?;
        let Some(value) = bth.find(u64::from(row_id))? else {
            return Ok(None);
        };
        let index = match value.len() {
            2 => u16_at(&value, 0).map(u32::from),
            _ => u32_at(&value, 0),
        };
        Ok(index.map(|index| index as usize))
    }

    #[must_use]
    pub fn column(&self, tag: PropertyTag) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.tag == tag)
            .or_else(|| self.columns.iter().find(|column| column.tag.matches(tag)))
    }

    /// The value of `tag` in `row`.
    ///
    /// `Ok(None)` when the table has no such column or the cell is unset.
    pub fn get(&self, row: usize, tag: PropertyTag) -> Result<Option<PropertyValue>, LtpError> {
        let bytes = self.row(row)?;
        let Some(column) = self.column(tag).copied() else {
            return Ok(None);
        };
        self.cell(bytes, &column)
    }

    /// Every set cell of `row`, in column order.
    pub fn row_values(&self, row: usize) -> Result<Vec<(PropertyTag, PropertyValue)>, LtpError> {
        let bytes = self.row(row)?;
        let mut values = Vec::new();
        for column in &self.columns {
            if let Some(value) = self.cell(bytes, column)? {
                values.push((column.tag, value));
            }
        }
        Ok(values)
    }

    fn cell(&self, row: &[u8], column: &Column) -> Result<Option<PropertyValue>, LtpError> {
        let bitmap = &row[self.boundaries[TCI_BM].min(row.len())..];
        let present = bitmap
            .get(column.bit / 8)
            .is_some_and(|byte| byte & (0x80 >> (column.bit % 8)) != 0);
        if !present {
            return Ok(None);
        }

        let ptype = column
            .tag
            .property_type()
            .map_err(LtpError::UnknownPropertyType)?;
        let cell = bytes_at(row, column.offset, column.size).ok_or(LtpError::DataOverflow {
            needed: column.offset + column.size,
            available: row.len(),
        })?;
        if ptype.is_inline_in_table_context() {
            return decode_inline(ptype, cell).map(Some);
        }
        let hnid = Hnid::from_raw(u32_at(cell, 0).unwrap_or_default());
        let value = self.heap.read_hnid(self.ndb, self.node.subnodes, hnid)?;
        decode_value(ptype, &value).map(Some)
    }
}

fn parse_columns(info: &[u8], count: usize, cells_end: usize) -> Result<Vec<Column>, LtpError> {
    let mut columns = Vec::with_capacity(count);
    for i in 0..count {
        let at = TCINFO_SIZE + i * COLUMN_SIZE;
        let descriptor = bytes_at(info, at, COLUMN_SIZE)
            .ok_or(LtpError::UnparseableTableContext("TCINFO shorter than its columns"))?;
        let column = Column {
            tag: PropertyTag::from_raw(u32_at(descriptor, 0).unwrap_or_default()),
            offset: usize::from(u16_at(descriptor, 4).unwrap_or_default()),
            size: usize::from(u8_at(descriptor, 6).unwrap_or_default()),
            bit: usize::from(u8_at(descriptor, 7).unwrap_or_default()),
        };
        if column.offset + column.size > cells_end {
            return Err(LtpError::UnparseableTableContext("column cell past the end of the row"));
        }
        if column.bit >= count.max(1).div_ceil(8) * 8 {
            return Err(LtpError::UnparseableTableContext("column bit past the bitmap"));
        }
        columns.push(column);
    }
    Ok(columns)
}
