use std::cmp::Ordering;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// On-disk width of a record. Also the unit in which the memory planner
/// converts its budget into a dense-table cutoff and a buffer capacity.
pub const RECORD_BYTES: usize = 16;

/// Accumulated co-occurrence weight between two vocabulary ranks, written
/// to chunk files and to the final stream as a packed little-endian
/// (int32, int32, float64) record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoocRecord {
    pub w1: i32,
    pub w2: i32,
    pub val: f64,
}

impl CoocRecord {
    pub fn new(w1: i32, w2: i32, val: f64) -> Self {
        Self { w1, w2, val }
    }

    pub fn key(&self) -> (i32, i32) {
        (self.w1, self.w2)
    }

    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }

    pub fn write_into<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i32::<LittleEndian>(self.w1)?;
        writer.write_i32::<LittleEndian>(self.w2)?;
        writer.write_f64::<LittleEndian>(self.val)
    }

    /// Read the next record, `None` on a clean end of stream.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Option<Self>> {
        let w1 = match reader.read_i32::<LittleEndian>() {
            Ok(w1) => w1,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        };
        let w2 = reader.read_i32::<LittleEndian>()?;
        let val = reader.read_f64::<LittleEndian>()?;

        Ok(Some(Self { w1, w2, val }))
    }
}
