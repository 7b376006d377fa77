//! Buffer-to-table decoding: header, field descriptor table, record loop.

use chrono::naive::NaiveDate;
use tracing::debug;

use crate::error::Result;
use crate::{Field, FieldType, FileVersion, Record, Table};

pub(crate) mod field;
pub(crate) mod memo;


use field::{read_u16_be, read_u16_le, read_u32_le, slice, DecodeContext};

/// Field descriptor terminator byte.
const DESCRIPTOR_TERMINATOR: u8 = 0x0D;
/// Deletion flag value in the first byte of a record.
const DELETED_FLAG: u8 = 0x2A;

struct HeaderMeta {
    version: FileVersion,
    last_update: Option<NaiveDate>,
    record_count: usize,
    header_length: usize,
    record_length: usize,
    has_structural_cdx: bool,
    has_memo_field: bool,
    is_dbc_database: bool,
}

/// Decodes a DBF byte buffer, and optionally the companion memo file's
/// bytes, into a [Table](../struct.Table.html).
///
/// ```no_run
/// use dbf_reader::TableReader;
///
/// let dbf = std::fs::read("accounts.dbf")?;
/// let memo = std::fs::read("accounts.fpt")?;
/// let table = TableReader::new(&dbf, Some(&memo)).read()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TableReader<'a> {
    dbf: &'a [u8],
    memo: Option<&'a [u8]>,
}

impl<'a> TableReader<'a> {
    pub fn new(dbf: &'a [u8], memo: Option<&'a [u8]>) -> TableReader<'a> {
        TableReader { dbf, memo }
    }

    /// Decode the whole file. Each stage depends on the previous one:
    /// header, then schema, then memo block size, then records.
    pub fn read(&self) -> Result<Table> {
        let header = self.read_header()?;
        let fields = self.read_fields(header.header_length)?;
        let memo_block_size = self.memo_block_size(header.version)?;
        let records = self.read_records(&header, &fields, memo_block_size)?;

        debug!(
            records = records.len(),
            fields = fields.len(),
            "table decoded"
        );

        Ok(Table {
            version: header.version,
            last_update: header.last_update,
            record_count: header.record_count,
            header_length: header.header_length,
            record_length: header.record_length,
            memo_block_size,
            has_structural_cdx: header.has_structural_cdx,
            has_memo_field: header.has_memo_field,
            is_dbc_database: header.is_dbc_database,
            fields,
            records,
        })
    }

    /// ## Header layout
    /// | Byte offset | Description |
    /// |---|---|
    /// | 0 | File version code |
    /// | 1 - 3 | Last update as year since 1900, month, day |
    /// | 4 - 7 | Number of records (32-bit LE) |
    /// | 8 - 9 | Position of first data record (16-bit LE) |
    /// | 10 - 11 | Length of one record including the delete flag (16-bit LE) |
    /// | 12 - 27 | Reserved |
    /// | 28 | Table flags: 0x01 structural .cdx, 0x02 memo field, 0x04 .dbc database |
    /// | 29 | Code page mark |
    /// | 30 - 31 | Reserved |
    fn read_header(&self) -> Result<HeaderMeta> {
        let version = FileVersion::from_code(slice(self.dbf, 0, 1, "version byte")?[0])?;

        let stamp = slice(self.dbf, 1, 3, "last update date")?;
        let last_update = NaiveDate::from_ymd_opt(
            1900 + stamp[0] as i32,
            stamp[1] as u32,
            stamp[2] as u32,
        );

        let record_count = read_u32_le(self.dbf, 4, "record count")? as usize;
        let header_length = read_u16_le(self.dbf, 8, "header length")? as usize;
        let record_length = read_u16_le(self.dbf, 10, "record length")? as usize;

        let table_flags = slice(self.dbf, 28, 1, "table flags")?[0];

        debug!(
            version = version.name(),
            record_count,
            header_length,
            record_length,
            table_flags,
            "header parsed"
        );

        Ok(HeaderMeta {
            version,
            last_update,
            record_count,
            header_length,
            record_length,
            has_structural_cdx: table_flags & 0x01 != 0,
            has_memo_field: table_flags & 0x02 != 0,
            is_dbc_database: table_flags & 0x04 != 0,
        })
    }

    /// Walk the 32-byte field descriptors starting at absolute offset 32,
    /// stopping at the declared header length or at the terminator byte,
    /// whichever comes first.
    ///
    /// ## Descriptor layout
    /// | Byte offset | Description |
    /// |---|---|
    /// | 0 - 10 | Field name, NUL padded past its length |
    /// | 11 | Field type tag |
    /// | 12 - 15 | Displacement of field in record |
    /// | 16 | Length of field in bytes |
    /// | 17 | Number of decimal places |
    /// | 18 - 31 | Field flags, autoincrement bookkeeping, reserved |
    fn read_fields(&self, header_length: usize) -> Result<Vec<Field>> {
        let mut fields = vec![];

        while header_length > 32 + fields.len() * 32 {
            let position = 32 + fields.len() * 32;
            if slice(self.dbf, position, 1, "field descriptor")?[0] == DESCRIPTOR_TERMINATOR {
                break;
            }

            let descriptor = slice(self.dbf, position, 32, "field descriptor")?;
            let name_len = descriptor[..10]
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(10);

            fields.push(Field {
                name: field::ascii_str(&descriptor[..name_len]),
                field_type: FieldType::from_tag(descriptor[11]),
                size: descriptor[16] as usize,
                decimal_places: descriptor[17] as usize,
            });
        }

        debug!(count = fields.len(), "field descriptors parsed");

        Ok(fields)
    }

    /// Block size of the companion memo file, derived per file version.
    /// `None` when no memo buffer was supplied; memo fields then decode to
    /// null.
    fn memo_block_size(&self, version: FileVersion) -> Result<Option<u32>> {
        let memo = match self.memo {
            Some(memo) => memo,
            None => return Ok(None),
        };

        let block_size = if version.is_visual_fox_pro() || version == FileVersion::FoxPro2Memo {
            // The memo file header is big-endian, unlike the DBF header.
            match read_u16_be(memo, 6, "memo block size")? as u32 {
                0 => 512,
                size => size,
            }
        } else if version == FileVersion::DBaseIVMemo {
            read_u32_le(memo, 4, "memo block size")?
        } else {
            512
        };

        debug!(block_size, "memo block size derived");

        Ok(Some(block_size))
    }

    fn read_records(
        &self,
        header: &HeaderMeta,
        fields: &[Field],
        memo_block_size: Option<u32>,
    ) -> Result<Vec<Record>> {
        let ctx = DecodeContext {
            version: header.version,
            memo: self.memo,
            memo_block_size: memo_block_size.unwrap_or(0),
        };

        let mut records = Vec::with_capacity(header.record_count);

        for i in 0..header.record_count {
            let start = header.header_length + header.record_length * i;
            let record = slice(self.dbf, start, header.record_length, "record")?;

            let deleted = record.first() == Some(&DELETED_FLAG);

            // Offset 0 is the deletion flag; fields follow back to back in
            // declared order.
            let mut offset = 1;
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                values.push(field::decode(field, record, offset, &ctx)?);
                offset += field.size;
            }

            records.push(Record { deleted, values });
        }

        Ok(records)
    }
}

/// Decode a DBF buffer without a memo file. Memo fields come back null.
pub fn decode(dbf: &[u8]) -> Result<Table> {
    TableReader::new(dbf, None).read()
}

/// Decode a DBF buffer together with its companion memo file's bytes.
pub fn decode_with_memo(dbf: &[u8], memo: &[u8]) -> Result<Table> {
    TableReader::new(dbf, Some(memo)).read()
}
