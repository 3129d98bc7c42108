//! Big-endian writers shared by the table builders.

pub(crate) trait PutBe {
    fn put_u8(&mut self, v: u8);
    fn put_u16(&mut self, v: u16);
    fn put_i16(&mut self, v: i16);
    fn put_u32(&mut self, v: u32);
    fn put_i32(&mut self, v: i32);
    /// 16.16 fixed point.
    fn put_fixed(&mut self, v: f32);
    /// 2.14 fixed point.
    fn put_f2dot14(&mut self, v: f32);
}

impl PutBe for Vec<u8> {
    fn put_u8(&mut self, v: u8) {
        self.push(v);
    }

    fn put_u16(&mut self, v: u16) {
        self.extend_from_slice(&v.to_be_bytes());
    }

    fn put_i16(&mut self, v: i16) {
        self.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.extend_from_slice(&v.to_be_bytes());
    }

    fn put_i32(&mut self, v: i32) {
        self.extend_from_slice(&v.to_be_bytes());
    }

    fn put_fixed(&mut self, v: f32) {
        self.put_i32((v * 65536.0).round() as i32);
    }

    fn put_f2dot14(&mut self, v: f32) {
        self.put_i16((v * 16384.0).round() as i16);
    }
}

/// Pad to a multiple of `align` with zero bytes.
pub(crate) fn pad_to(out: &mut Vec<u8>, align: usize) {
    while out.len() % align != 0 {
        out.push(0);
    }
}
