use crate::common::{HEADER_LEN, INDEX_LEN, read_u24, read_u32};
use std::cmp::Ordering;

/// Bounds of the range index, read from the first 8 bytes of the file.
///
/// `start` is the offset of the first entry and `end` the offset of the last
/// one; both are inclusive.
///
/// 范围索引的起止位置，来自文件前 8 字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    pub start: u32,
    pub end: u32,
}

/// One 7-byte entry of the range index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub start_ip: u32,
    pub offset: u32,
}

impl IndexHeader {
    /// Parse and validate the header. Returns `None` for an unusable index.
    ///
    /// 解析并校验文件头，索引不可用时返回 `None`。
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_LEN {
            log::debug!("buffer of {} bytes has no header", data.len());
            return None;
        }
        let header = Self {
            start: read_u32(data, 0)?,
            end: read_u32(data, 4)?,
        };
        if header.end < header.start
            || (header.end - header.start) as usize % INDEX_LEN != 0
            || header.end as usize + INDEX_LEN > data.len()
        {
            log::debug!("invalid index bounds {header:?} for {} bytes", data.len());
            return None;
        }
        Some(header)
    }

    /// Number of entries in the index.
    pub fn entry_count(&self) -> u32 {
        (self.end - self.start) / INDEX_LEN as u32 + 1
    }
}

/// Read the index entry at byte position `pos`.
pub fn read_entry(data: &[u8], pos: u32) -> Option<IndexEntry> {
    let pos = pos as usize;
    Some(IndexEntry {
        start_ip: read_u32(data, pos)?,
        offset: read_u24(data, pos + 4)?,
    })
}

/// Binary search the range index for `ip`.
///
/// Returns the record offset of the range containing `ip`, or `None` when the
/// address is not covered. An offset of 0 is never a valid record and is
/// reported as `None`.
///
/// With two or more entries, the entry at `end` closes the final range: an
/// address at or past its start is not found. A single-entry index covers
/// every address from its start upward.
///
/// 在范围索引中二分查找 `ip`，返回记录偏移；未覆盖时返回 `None`。
pub fn search(data: &[u8], ip: u32) -> Option<u32> {
    let header = IndexHeader::parse(data)?;
    let first = read_entry(data, header.start)?;
    if ip < first.start_ip {
        return None;
    }
    if header.start == header.end {
        return non_zero(first.offset);
    }

    let stride = INDEX_LEN as u32;
    let mut pos_a = header.start;
    let mut pos_z = header.end;
    loop {
        let span = pos_z - pos_a;
        let mid = pos_a + ((span / stride) >> 1) * stride;
        let entry = read_entry(data, mid)?;
        if span == stride {
            let next = read_entry(data, mid + stride)?;
            return if ip < next.start_ip {
                non_zero(entry.offset)
            } else {
                None
            };
        }
        match entry.start_ip.cmp(&ip) {
            Ordering::Greater => pos_z = mid,
            Ordering::Less => pos_a = mid,
            Ordering::Equal => return non_zero(entry.offset),
        }
    }
}

fn non_zero(offset: u32) -> Option<u32> {
    (offset != 0).then_some(offset)
}
