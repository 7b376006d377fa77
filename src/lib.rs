//! Decoder for the DBF tabular file format (xBase/dBASE/Visual FoxPro
//! family) and its companion memo file.
//!
//! The caller supplies the table file as a byte buffer, optionally together
//! with the memo file's bytes, and gets back a fully materialized
//! [Table](struct.Table.html): header metadata, the field schema and one
//! decoded [Record](struct.Record.html) per data row. Decoding is a single
//! synchronous pass; distinct buffers can be decoded on distinct threads.

use chrono::naive::NaiveDate;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;


pub mod csv;
pub mod error;
pub mod reader;

pub use error::{DbfError, Result};
pub use reader::TableReader;

/// File version identifier stored in the first byte of a DBF file.
///
/// The set of codes is fixed; a byte outside this table fails the whole
/// decode with [DbfError::UnknownFileVersion](error/enum.DbfError.html).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileVersion {
    FoxBase,
    DBaseIIIPlusNoMemo,
    VisualFoxPro,
    VisualFoxProAutoInc,
    VisualFoxProVar,
    DBaseIVSQLTableNoMemo,
    DBaseIVSQLSystemNoMemo,
    DBaseIIIPlusMemo,
    DBaseIVMemo,
    DBaseIVSQLTableMemo,
    HiPerSix,
    FoxPro2Memo,
    FoxBaseAlt,
}

impl FileVersion {
    /// Look up a version byte in the registry.
    pub fn from_code(code: u8) -> Result<FileVersion> {
        match code {
            0x02 => Ok(FileVersion::FoxBase),
            0x03 => Ok(FileVersion::DBaseIIIPlusNoMemo),
            0x30 => Ok(FileVersion::VisualFoxPro),
            0x31 => Ok(FileVersion::VisualFoxProAutoInc),
            0x32 => Ok(FileVersion::VisualFoxProVar),
            0x43 => Ok(FileVersion::DBaseIVSQLTableNoMemo),
            0x63 => Ok(FileVersion::DBaseIVSQLSystemNoMemo),
            0x83 => Ok(FileVersion::DBaseIIIPlusMemo),
            0x8b => Ok(FileVersion::DBaseIVMemo),
            0xcb => Ok(FileVersion::DBaseIVSQLTableMemo),
            0xe5 => Ok(FileVersion::HiPerSix),
            0xf5 => Ok(FileVersion::FoxPro2Memo),
            0xfb => Ok(FileVersion::FoxBaseAlt),
            _ => Err(DbfError::UnknownFileVersion(code)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            FileVersion::FoxBase => 0x02,
            FileVersion::DBaseIIIPlusNoMemo => 0x03,
            FileVersion::VisualFoxPro => 0x30,
            FileVersion::VisualFoxProAutoInc => 0x31,
            FileVersion::VisualFoxProVar => 0x32,
            FileVersion::DBaseIVSQLTableNoMemo => 0x43,
            FileVersion::DBaseIVSQLSystemNoMemo => 0x63,
            FileVersion::DBaseIIIPlusMemo => 0x83,
            FileVersion::DBaseIVMemo => 0x8b,
            FileVersion::DBaseIVSQLTableMemo => 0xcb,
            FileVersion::HiPerSix => 0xe5,
            FileVersion::FoxPro2Memo => 0xf5,
            FileVersion::FoxBaseAlt => 0xfb,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FileVersion::FoxBase => "FoxBASE",
            FileVersion::DBaseIIIPlusNoMemo => "FoxBASE+/Dbase III plus, no memo",
            FileVersion::VisualFoxPro => "Visual FoxPro",
            FileVersion::VisualFoxProAutoInc => "Visual FoxPro, autoincrement enabled",
            FileVersion::VisualFoxProVar => {
                "Visual FoxPro with field type Varchar or Varbinary"
            }
            FileVersion::DBaseIVSQLTableNoMemo => "dBASE IV SQL table files, no memo",
            FileVersion::DBaseIVSQLSystemNoMemo => "dBASE IV SQL system files, no memo",
            FileVersion::DBaseIIIPlusMemo => "FoxBASE+/dBASE III PLUS, with memo",
            FileVersion::DBaseIVMemo => "dBASE IV with memo",
            FileVersion::DBaseIVSQLTableMemo => "dBASE IV SQL table files, with memo",
            FileVersion::HiPerSix => "HiPer-Six format with SMT memo file",
            FileVersion::FoxPro2Memo => "FoxPro 2.x (or earlier) with memo",
            FileVersion::FoxBaseAlt => "FoxBASE",
        }
    }

    /// The 0x30/0x31/0x32 family shares the memo pointer encoding and the
    /// 8-byte memo block header layout.
    pub fn is_visual_fox_pro(self) -> bool {
        match self {
            FileVersion::VisualFoxPro
            | FileVersion::VisualFoxProAutoInc
            | FileVersion::VisualFoxProVar => true,
            _ => false,
        }
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Field type tag from byte 11 of a field descriptor.
///
/// Tags the decoder does not model are carried as
/// [Unsupported](#variant.Unsupported) and decode to
/// [Value::Null](enum.Value.html#variant.Null) rather than failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// C - fixed length text, right padded with spaces
    Character,
    /// N - number stored as ASCII text, right justified
    Numeric,
    /// F - same on-disk representation as N
    Float,
    /// Y - 8 byte integer carrying 4 implied decimal digits
    Currency,
    /// L - one byte logical
    Logical,
    /// D - 8 ASCII digits, YYYYMMDD
    Date,
    /// T - date plus time of day; returned as raw text
    DateTime,
    /// B - 8 byte IEEE-754 double
    Double,
    /// I - 4 byte signed integer
    Integer,
    /// M - block pointer into the memo file
    Memo,
    Unsupported(u8),
}

impl FieldType {
    pub fn from_tag(tag: u8) -> FieldType {
        match tag {
            b'C' => FieldType::Character,
            b'N' => FieldType::Numeric,
            b'F' => FieldType::Float,
            b'Y' => FieldType::Currency,
            b'L' => FieldType::Logical,
            b'D' => FieldType::Date,
            b'T' => FieldType::DateTime,
            b'B' => FieldType::Double,
            b'I' => FieldType::Integer,
            b'M' => FieldType::Memo,
            other => FieldType::Unsupported(other),
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Numeric => b'N',
            FieldType::Float => b'F',
            FieldType::Currency => b'Y',
            FieldType::Logical => b'L',
            FieldType::Date => b'D',
            FieldType::DateTime => b'T',
            FieldType::Double => b'B',
            FieldType::Integer => b'I',
            FieldType::Memo => b'M',
            FieldType::Unsupported(tag) => tag,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag() as char)
    }
}

/// One entry of the field descriptor table. Field order is byte-offset
/// order: a field's window starts at the sum of the preceding sizes, after
/// the 1-byte deletion flag.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub size: usize,
    pub decimal_places: usize,
}

/// A decoded field slot. Every slot is exactly one variant; per-value
/// failures (numeric literals, memo resolution) degrade to `Null`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "{}", text),
            Value::Number(number) => write!(f, "{}", number),
            Value::Boolean(boolean) => write!(f, "{}", boolean),
            Value::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Value::Null => Ok(()),
        }
    }
}

/// One data row: decoded values in field order plus the soft-delete marker
/// (first record byte == `*`).
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub deleted: bool,
    pub values: Vec<Value>,
}

/// A fully decoded DBF file. Built once per decode call and not mutated
/// afterwards; the decoder keeps no reference to the input buffers.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub version: FileVersion,
    pub last_update: Option<NaiveDate>,
    pub record_count: usize,
    pub header_length: usize,
    pub record_length: usize,
    /// Derived from the memo file header; `None` when no memo buffer was
    /// supplied.
    pub memo_block_size: Option<u32>,
    pub has_structural_cdx: bool,
    pub has_memo_field: bool,
    pub is_dbc_database: bool,
    pub fields: Vec<Field>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Value of the named field in the record at `index`, or `None` when
    /// either lookup misses.
    pub fn value(&self, index: usize, name: &str) -> Option<&Value> {
        let field = self.field_index(name)?;
        self.records.get(index)?.values.get(field)
    }
}

/// Read the first byte of a DBF file and resolve it in the version
/// registry, without decoding the rest of the file.
pub fn read_file_version<P: AsRef<Path>>(path: P) -> Result<FileVersion> {
    let mut file = File::open(path)?;
    let flag = &mut [0];
    file.read_exact(flag)?;

    FileVersion::from_code(flag[0])
}

/// Load a DBF file, and optionally its companion memo file, and decode the
/// whole table.
pub fn read_table<P: AsRef<Path>>(dbf_path: P, memo_path: Option<P>) -> Result<Table> {
    let dbf = std::fs::read(dbf_path)?;
    let memo = match memo_path {
        Some(path) => Some(std::fs::read(path)?),
        None => None,
    };

    TableReader::new(&dbf, memo.as_deref()).read()
}
