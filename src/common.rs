use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::GB18030;
use serde::Serialize;
use std::fmt;

/// Length of one range index entry: 4-byte start IP + 3-byte record offset.
pub const INDEX_LEN: usize = 7;
/// Length of the little-endian offsets embedded in index entries and records.
pub const OFFSET_LEN: usize = 3;
/// Bytes at the head of a record before its mode byte.
pub const RECORD_IP_LEN: usize = 4;
/// Size of the file header (index start + index end).
pub const HEADER_LEN: usize = 8;

/// Record redirect: the following offset points at another record.
pub const REDIRECT_MODE_1: u8 = 0x01;
/// String redirect: the following offset points directly at a string.
pub const REDIRECT_MODE_2: u8 = 0x02;

/// Vendor placeholder stored in the ISP field when no ISP is known.
pub const NO_ISP_MARKER: &str = "CZ88.NET";

/// City and ISP resolved for one address.
///
/// 单个地址对应的城市与运营商。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Location {
    pub city: String,
    pub isp: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.city.is_empty(), self.isp.is_empty()) {
            (_, true) => f.write_str(&self.city),
            (true, false) => f.write_str(&self.isp),
            (false, false) => write!(f, "{} {}", self.city, self.isp),
        }
    }
}

/// Read a three-byte little-endian offset at `pos`, zero-extended to `u32`.
///
/// 读取 `pos` 处的三字节小端偏移。
pub fn read_u24(data: &[u8], pos: usize) -> Option<u32> {
    data.get(pos..pos.checked_add(OFFSET_LEN)?)
        .map(LittleEndian::read_u24)
}

/// Read a four-byte little-endian integer at `pos`.
pub fn read_u32(data: &[u8], pos: usize) -> Option<u32> {
    data.get(pos..pos.checked_add(4)?).map(LittleEndian::read_u32)
}

/// Bytes of the null-terminated string starting at `pos`, terminator excluded.
///
/// A missing terminator runs to the end of the buffer; a start past the end
/// yields an empty slice.
///
/// 读取以 0 结尾的字符串字节；缺少结束符时读到缓冲区末尾。
pub fn read_cstr(data: &[u8], pos: usize) -> &[u8] {
    let Some(tail) = data.get(pos..) else {
        return &[];
    };
    match tail.iter().position(|&b| b == 0) {
        Some(end) => &tail[..end],
        None => {
            log::debug!("unterminated string at offset {pos}");
            tail
        }
    }
}

/// Decode GB18030/GBK bytes into trimmed UTF-8 text.
///
/// Malformed sequences decode to an empty string.
///
/// 将 GB18030/GBK 字节解码为 UTF-8，非法序列返回空字符串。
pub fn decode_text(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }
    match GB18030.decode_without_bom_handling_and_without_replacement(raw) {
        Some(text) => text.trim().to_string(),
        None => {
            log::debug!("malformed GB18030 sequence: {raw:02x?}");
            String::new()
        }
    }
}
