//! `CFF ` table and Type2 charstring builders.

use crate::write::PutBe;

pub mod op {
    pub const HSTEM: u8 = 1;
    pub const VMOVETO: u8 = 4;
    pub const RLINETO: u8 = 5;
    pub const HLINETO: u8 = 6;
    pub const VLINETO: u8 = 7;
    pub const RRCURVETO: u8 = 8;
    pub const CALLSUBR: u8 = 10;
    pub const RETURN: u8 = 11;
    pub const ESCAPE: u8 = 12;
    pub const ENDCHAR: u8 = 14;
    pub const HINTMASK: u8 = 19;
    pub const RMOVETO: u8 = 21;
    pub const HMOVETO: u8 = 22;
    pub const CALLGSUBR: u8 = 29;
    pub const VHCURVETO: u8 = 30;
    pub const HVCURVETO: u8 = 31;

    /// Escaped operators, written after [`ESCAPE`].
    pub const FLEX: u8 = 35;
}

/// Subroutine index bias for an INDEX of `count` subroutines.
pub fn subr_bias(count: usize) -> i32 {
    if count < 1240 {
        107
    } else if count < 33900 {
        1131
    } else {
        32768
    }
}

/// Writes Type2 charstring bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Charstring {
    bytes: Vec<u8>,
}

impl Charstring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an integer operand using the shortest encoding.
    pub fn num(mut self, v: i32) -> Self {
        let out = &mut self.bytes;
        match v {
            -107..=107 => out.put_u8((v + 139) as u8),
            108..=1131 => {
                let v = v - 108;
                out.put_u8((v / 256 + 247) as u8);
                out.put_u8((v % 256) as u8);
            }
            -1131..=-108 => {
                let v = -v - 108;
                out.put_u8((v / 256 + 251) as u8);
                out.put_u8((v % 256) as u8);
            }
            -32768..=32767 => {
                out.put_u8(28);
                out.put_i16(v as i16);
            }
            _ => {
                out.put_u8(255);
                out.put_i32(v << 16);
            }
        }
        self
    }

    /// Push a 16.16 fixed operand.
    pub fn fixed(mut self, v: f32) -> Self {
        self.bytes.put_u8(255);
        self.bytes.put_fixed(v);
        self
    }

    pub fn nums(self, values: &[i32]) -> Self {
        values.iter().fold(self, |cs, &v| cs.num(v))
    }

    pub fn op(mut self, op: u8) -> Self {
        self.bytes.put_u8(op);
        self
    }

    pub fn escaped(mut self, op: u8) -> Self {
        self.bytes.put_u8(op::ESCAPE);
        self.bytes.put_u8(op);
        self
    }

    pub fn rmoveto(self, dx: i32, dy: i32) -> Self {
        self.nums(&[dx, dy]).op(op::RMOVETO)
    }

    pub fn rlineto(self, deltas: &[(i32, i32)]) -> Self {
        deltas
            .iter()
            .fold(self, |cs, &(dx, dy)| cs.nums(&[dx, dy]))
            .op(op::RLINETO)
    }

    pub fn rrcurveto(self, dxa: i32, dya: i32, dxb: i32, dyb: i32, dxc: i32, dyc: i32) -> Self {
        self.nums(&[dxa, dya, dxb, dyb, dxc, dyc]).op(op::RRCURVETO)
    }

    /// Call local subroutine `index` of an INDEX holding `count` entries.
    pub fn callsubr(self, index: i32, count: usize) -> Self {
        self.num(index - subr_bias(count)).op(op::CALLSUBR)
    }

    pub fn callgsubr(self, index: i32, count: usize) -> Self {
        self.num(index - subr_bias(count)).op(op::CALLGSUBR)
    }

    pub fn ret(self) -> Self {
        self.op(op::RETURN)
    }

    pub fn endchar(self) -> Self {
        self.op(op::ENDCHAR)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// INDEX with 4-byte offsets.
pub fn index(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.put_u16(items.len() as u16);
    if items.is_empty() {
        return out;
    }
    out.put_u8(4);
    let mut offset = 1u32;
    out.put_u32(offset);
    for item in items {
        offset += item.len() as u32;
        out.put_u32(offset);
    }
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// DICT integer operand with the fixed five-byte encoding, so offsets can be
/// patched without changing the DICT size.
fn dict_int(out: &mut Vec<u8>, v: i32) {
    out.put_u8(29);
    out.put_i32(v);
}

/// Single-font, non-CID `CFF ` table.
#[derive(Debug, Clone, PartialEq)]
pub struct CffBuilder {
    pub name: String,
    pub charstrings: Vec<Vec<u8>>,
    pub global_subrs: Vec<Vec<u8>>,
    pub local_subrs: Vec<Vec<u8>>,
    pub default_width_x: i32,
    pub nominal_width_x: i32,
}

impl CffBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            charstrings: Vec::new(),
            global_subrs: Vec::new(),
            local_subrs: Vec::new(),
            default_width_x: 0,
            nominal_width_x: 0,
        }
    }

    pub fn glyph(mut self, charstring: Vec<u8>) -> Self {
        self.charstrings.push(charstring);
        self
    }

    pub fn global_subr(mut self, subr: Vec<u8>) -> Self {
        self.global_subrs.push(subr);
        self
    }

    pub fn local_subr(mut self, subr: Vec<u8>) -> Self {
        self.local_subrs.push(subr);
        self
    }

    pub fn widths(mut self, default_width_x: i32, nominal_width_x: i32) -> Self {
        self.default_width_x = default_width_x;
        self.nominal_width_x = nominal_width_x;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let name_index = index(&[self.name.as_bytes().to_vec()]);
        let string_index = index(&[]);
        let gsubr_index = index(&self.global_subrs);
        let charstrings_index = index(&self.charstrings);

        let mut private = Vec::new();
        dict_int(&mut private, self.default_width_x);
        private.put_u8(20);
        dict_int(&mut private, self.nominal_width_x);
        private.put_u8(21);
        if !self.local_subrs.is_empty() {
            // Subrs is relative to the Private DICT; it follows directly.
            let subrs_offset = private.len() + 6;
            dict_int(&mut private, subrs_offset as i32);
            private.put_u8(19);
        }

        // Top DICT: CharStrings, then Private (size, offset). Fixed size 17.
        let top_dict_len = 17;
        let top_index_len = 2 + 1 + 8 + top_dict_len;
        let charstrings_offset =
            4 + name_index.len() + top_index_len + string_index.len() + gsubr_index.len();
        let private_offset = charstrings_offset + charstrings_index.len();

        let mut top = Vec::with_capacity(top_dict_len);
        dict_int(&mut top, charstrings_offset as i32);
        top.put_u8(17);
        dict_int(&mut top, private.len() as i32);
        dict_int(&mut top, private_offset as i32);
        top.put_u8(18);

        let mut out = vec![1, 0, 4, 4];
        out.extend_from_slice(&name_index);
        out.extend_from_slice(&index(&[top]));
        out.extend_from_slice(&string_index);
        out.extend_from_slice(&gsubr_index);
        out.extend_from_slice(&charstrings_index);
        out.extend_from_slice(&private);
        if !self.local_subrs.is_empty() {
            out.extend_from_slice(&index(&self.local_subrs));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_encodings() {
        assert_eq!(Charstring::new().num(0).build(), vec![139]);
        assert_eq!(Charstring::new().num(108).build(), vec![247, 0]);
        assert_eq!(Charstring::new().num(-108).build(), vec![251, 0]);
        assert_eq!(Charstring::new().num(2000).build(), vec![28, 0x07, 0xD0]);
    }

    #[test]
    fn test_index_layout() {
        let bytes = index(&[vec![1, 2], vec![3]]);
        assert_eq!(&bytes[0..3], &[0, 2, 4]);
        assert_eq!(&bytes[3..7], &[0, 0, 0, 1]);
        assert_eq!(&bytes[bytes.len() - 3..], &[1, 2, 3]);
        assert_eq!(index(&[]), vec![0, 0]);
    }

    #[test]
    fn test_private_follows_charstrings() {
        let glyph = Charstring::new().rmoveto(0, 0).endchar().build();
        let cff = CffBuilder::new("Test")
            .glyph(glyph.clone())
            .local_subr(Charstring::new().ret().build())
            .build();
        // Header, Name INDEX (2 + 1 + 8 + 4), then the Top DICT INDEX.
        let top = 4 + 15 + 11;
        assert_eq!(cff[top], 29);
        let charstrings = i32::from_be_bytes([cff[top + 1], cff[top + 2], cff[top + 3], cff[top + 4]]) as usize;
        assert_eq!(&cff[charstrings..charstrings + 2], &[0, 1]);
        assert!(cff.ends_with(&[0, 1, 4, 0, 0, 0, 1, 0, 0, 0, 2, 11]));
    }
}
