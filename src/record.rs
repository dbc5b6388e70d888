use crate::common::{
    Location, NO_ISP_MARKER, OFFSET_LEN, RECORD_IP_LEN, REDIRECT_MODE_1, REDIRECT_MODE_2,
    decode_text, read_cstr, read_u24,
};

/// How the bytes at a record position locate their string.
///
/// 记录位置上字符串的定位方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Inline string; the inspected byte is its first byte.
    Direct,
    /// `0x01`: the next 3 bytes point at another record.
    RedirectToRecord,
    /// `0x02`: the next 3 bytes point directly at a string.
    RedirectToString,
}

impl Mode {
    /// Classify the byte at `pos`. Out-of-range positions read as `Direct`,
    /// which then yields an empty string.
    pub fn at(data: &[u8], pos: usize) -> Self {
        match data.get(pos) {
            Some(&REDIRECT_MODE_1) => Mode::RedirectToRecord,
            Some(&REDIRECT_MODE_2) => Mode::RedirectToString,
            _ => Mode::Direct,
        }
    }
}

/// Target of the 3-byte redirect following the mode byte at `pos`.
fn redirect_target(data: &[u8], pos: usize) -> usize {
    read_u24(data, pos + 1).unwrap_or(0) as usize
}

/// City bytes and the position of the ISP field.
struct CityField<'a> {
    raw: &'a [u8],
    isp_pos: usize,
}

/// Resolve the record at `offset` into a [`Location`].
///
/// The record's first 4 bytes hold the range end address and are skipped.
/// The byte after them selects one of three shapes:
///
/// - direct: the city string is inline and the ISP field follows it;
/// - `0x02`: the city string is elsewhere and the ISP field sits at `offset + 8`;
/// - `0x01`: the whole field pair lives in another record, which may itself
///   redirect its city string with `0x02`.
///
/// Malformed records never fail; they yield truncated or empty strings.
///
/// 解析 `offset` 处的记录，得到城市与运营商。格式错误时返回截断或空字符串。
pub fn resolve(data: &[u8], offset: u32) -> Location {
    let mode_pos = offset as usize + RECORD_IP_LEN;
    let city = match Mode::at(data, mode_pos) {
        Mode::Direct => inline_city(data, mode_pos),
        Mode::RedirectToString => CityField {
            raw: read_cstr(data, redirect_target(data, mode_pos)),
            isp_pos: mode_pos + 1 + OFFSET_LEN,
        },
        Mode::RedirectToRecord => follow_record(data, redirect_target(data, mode_pos)),
    };

    let isp = read_isp(data, city.isp_pos);
    Location {
        city: decode_text(city.raw),
        isp: normalize_isp(decode_text(isp)),
    }
}

fn inline_city(data: &[u8], pos: usize) -> CityField<'_> {
    let raw = read_cstr(data, pos);
    CityField {
        raw,
        isp_pos: pos + raw.len() + 1,
    }
}

/// Second hop of a `0x01` record. Only `0x02` is honoured here; any other
/// leading byte is the start of an inline city string.
fn follow_record(data: &[u8], pos: usize) -> CityField<'_> {
    match Mode::at(data, pos) {
        Mode::RedirectToString => CityField {
            raw: read_cstr(data, redirect_target(data, pos)),
            isp_pos: pos + 1 + OFFSET_LEN,
        },
        Mode::Direct | Mode::RedirectToRecord => inline_city(data, pos),
    }
}

/// ISP bytes at `pos`, following at most one redirect of either kind.
fn read_isp(data: &[u8], pos: usize) -> &[u8] {
    let pos = match Mode::at(data, pos) {
        Mode::Direct => pos,
        Mode::RedirectToRecord | Mode::RedirectToString => redirect_target(data, pos),
    };
    if pos == 0 {
        return &[];
    }
    read_cstr(data, pos)
}

fn normalize_isp(isp: String) -> String {
    if isp.contains(NO_ISP_MARKER) {
        String::new()
    } else {
        isp
    }
}
