//! Type2 charstring interpreter.
//!
//! The operand stack and pen state live outside the interpreter and are passed
//! into [`evaluate`]; path output goes to an [`OutlineSink`].

use crate::cursor::ByteCursor;
use crate::error::{FontError, FontResult};

use super::index::Index;

/// Maximum operands on the Type2 argument stack.
pub const MAX_OPERANDS: usize = 48;

/// Maximum nesting of subroutine calls.
pub const NESTING_DEPTH_LIMIT: usize = 10;

/// Type2 argument stack.
#[derive(Debug, Clone)]
pub struct OperandStack {
    values: [f32; MAX_OPERANDS],
    len: usize,
}

impl Default for OperandStack {
    fn default() -> Self {
        Self::new()
    }
}

impl OperandStack {
    pub fn new() -> Self {
        Self {
            values: [0.0; MAX_OPERANDS],
            len: 0,
        }
    }

    pub fn push(&mut self, value: f32) -> FontResult<()> {
        if self.len == MAX_OPERANDS {
            return Err(FontError::StackOverflow);
        }
        self.values[self.len] = value;
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> FontResult<f32> {
        if self.len == 0 {
            return Err(FontError::StackUnderflow);
        }
        self.len -= 1;
        Ok(self.values[self.len])
    }

    /// Operand `i`, counted from the bottom of the stack.
    pub fn get(&self, i: usize) -> FontResult<f32> {
        if i >= self.len {
            return Err(FontError::StackUnderflow);
        }
        Ok(self.values[i])
    }

    /// `N` consecutive operands starting at `i`.
    pub fn get_array<const N: usize>(&self, i: usize) -> FontResult<[f32; N]> {
        if i + N > self.len {
            return Err(FontError::StackUnderflow);
        }
        let mut out = [0.0; N];
        out.copy_from_slice(&self.values[i..i + N]);
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len_is_odd(&self) -> bool {
        self.len % 2 == 1
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// Receives path commands in absolute font units.
pub trait OutlineSink {
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32);
    fn close(&mut self);
}

/// Pen and hint state carried across subroutine calls.
#[derive(Debug, Clone, Default)]
pub struct CharstringState {
    pub x: f32,
    pub y: f32,
    pub is_open: bool,
    /// Width operand preceding the first stack-clearing operator, if present.
    pub width: Option<f32>,
    pub have_read_width: bool,
    pub stem_count: usize,
}

impl CharstringState {
    /// Consume the leading width operand on the first stack-clearing operator.
    /// Returns how many operands to skip.
    fn take_width(&mut self, stack: &OperandStack, has_extra: bool) -> usize {
        if !self.have_read_width {
            self.have_read_width = true;
            if has_extra {
                self.width = stack.get(0).ok();
                return 1;
            }
        }
        0
    }

    /// Current pen position.
    fn pos(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// Global and local subroutines for one glyph.
#[derive(Debug, Clone, Copy)]
pub struct Subroutines<'a> {
    pub data: &'a [u8],
    pub global: &'a Index,
    pub local: Option<&'a Index>,
}

/// Evaluate a charstring, emitting its path to `sink`.
pub fn evaluate(
    charstring: &[u8],
    subrs: Subroutines<'_>,
    stack: &mut OperandStack,
    state: &mut CharstringState,
    sink: &mut impl OutlineSink,
) -> FontResult<()> {
    let mut eval = Evaluator {
        subrs,
        stack,
        state,
        sink,
    };
    eval.run(charstring, 0)?;
    // A charstring that runs off its end without endchar still closes.
    if eval.state.is_open {
        eval.state.is_open = false;
        eval.sink.close();
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Return,
    End,
}

struct Evaluator<'s, 'a, S> {
    subrs: Subroutines<'a>,
    stack: &'s mut OperandStack,
    state: &'s mut CharstringState,
    sink: &'s mut S,
}

// One-byte operators.
const HSTEM: u8 = 1;
const VSTEM: u8 = 3;
const VMOVETO: u8 = 4;
const RLINETO: u8 = 5;
const HLINETO: u8 = 6;
const VLINETO: u8 = 7;
const RRCURVETO: u8 = 8;
const CALLSUBR: u8 = 10;
const RETURN: u8 = 11;
const ESCAPE: u8 = 12;
const ENDCHAR: u8 = 14;
const HSTEMHM: u8 = 18;
const HINTMASK: u8 = 19;
const CNTRMASK: u8 = 20;
const RMOVETO: u8 = 21;
const HMOVETO: u8 = 22;
const VSTEMHM: u8 = 23;
const RCURVELINE: u8 = 24;
const RLINECURVE: u8 = 25;
const VVCURVETO: u8 = 26;
const HHCURVETO: u8 = 27;
const SHORTINT: u8 = 28;
const CALLGSUBR: u8 = 29;
const VHCURVETO: u8 = 30;
const HVCURVETO: u8 = 31;

// Escaped operators.
const HFLEX: u8 = 34;
const FLEX: u8 = 35;
const HFLEX1: u8 = 36;
const FLEX1: u8 = 37;

impl<S: OutlineSink> Evaluator<'_, '_, S> {
    fn run(&mut self, charstring: &[u8], depth: usize) -> FontResult<Flow> {
        if depth > NESTING_DEPTH_LIMIT {
            return Err(FontError::SubroutineDepthExceeded);
        }

        let mut c = ByteCursor::new(charstring);
        while !c.eof() {
            let b0 = c.read_u8()?;
            let flow = match b0 {
                SHORTINT => {
                    self.stack.push(c.read_i16()? as f32)?;
                    Flow::Continue
                }
                32..=246 => {
                    self.stack.push(b0 as f32 - 139.0)?;
                    Flow::Continue
                }
                247..=250 => {
                    let b1 = c.read_u8()? as f32;
                    self.stack.push((b0 as f32 - 247.0) * 256.0 + b1 + 108.0)?;
                    Flow::Continue
                }
                251..=254 => {
                    let b1 = c.read_u8()? as f32;
                    self.stack.push(-(b0 as f32 - 251.0) * 256.0 - b1 - 108.0)?;
                    Flow::Continue
                }
                255 => {
                    self.stack.push(c.read_i32()? as f32 / 65536.0)?;
                    Flow::Continue
                }
                ESCAPE => {
                    let b1 = c.read_u8()?;
                    self.escaped_operator(b1)?;
                    Flow::Continue
                }
                _ => self.operator(b0, &mut c, depth)?,
            };
            if flow != Flow::Continue {
                return Ok(flow);
            }
        }
        Ok(Flow::Continue)
    }

    fn operator(&mut self, op: u8, c: &mut ByteCursor<'_>, depth: usize) -> FontResult<Flow> {
        match op {
            HSTEM | VSTEM | HSTEMHM | VSTEMHM => {
                let skip = self.state.take_width(self.stack, self.stack.len_is_odd());
                self.state.stem_count += (self.stack.len() - skip) / 2;
                self.stack.clear();
            }
            HINTMASK | CNTRMASK => {
                // Operands here are an implied vstemhm.
                let skip = self.state.take_width(self.stack, self.stack.len_is_odd());
                self.state.stem_count += (self.stack.len() - skip) / 2;
                self.stack.clear();
                c.skip(self.state.stem_count.div_ceil(8))?;
            }
            RMOVETO => {
                let i = self.state.take_width(self.stack, self.stack.len() > 2);
                let [dx, dy] = self.stack.get_array::<2>(i)?;
                let (x, y) = self.state.pos();
                self.move_to(x + dx, y + dy);
            }
            HMOVETO | VMOVETO => {
                let i = self.state.take_width(self.stack, self.stack.len() > 1);
                let d = self.stack.get(i)?;
                let (x, y) = self.state.pos();
                if op == HMOVETO {
                    self.move_to(x + d, y);
                } else {
                    self.move_to(x, y + d);
                }
            }
            RLINETO => {
                let mut i = 0;
                while i + 2 <= self.stack.len() {
                    let [dx, dy] = self.stack.get_array::<2>(i)?;
                    self.line_by(dx, dy);
                    i += 2;
                }
                self.stack.clear();
            }
            HLINETO | VLINETO => {
                let mut horizontal = op == HLINETO;
                for i in 0..self.stack.len() {
                    let d = self.stack.get(i)?;
                    if horizontal {
                        self.line_by(d, 0.0);
                    } else {
                        self.line_by(0.0, d);
                    }
                    horizontal = !horizontal;
                }
                self.stack.clear();
            }
            RRCURVETO | RCURVELINE => {
                let count = self.stack.len();
                let mut i = 0;
                while i + 6 <= count {
                    let a = self.stack.get_array::<6>(i)?;
                    self.curve_by(a[0], a[1], a[2], a[3], a[4], a[5]);
                    i += 6;
                }
                if op == RCURVELINE {
                    let [dx, dy] = self.stack.get_array::<2>(i)?;
                    self.line_by(dx, dy);
                }
                self.stack.clear();
            }
            RLINECURVE => {
                let count = self.stack.len();
                if count < 6 {
                    return Err(FontError::StackUnderflow);
                }
                let mut i = 0;
                while i + 6 < count {
                    let [dx, dy] = self.stack.get_array::<2>(i)?;
                    self.line_by(dx, dy);
                    i += 2;
                }
                let a = self.stack.get_array::<6>(i)?;
                self.curve_by(a[0], a[1], a[2], a[3], a[4], a[5]);
                self.stack.clear();
            }
            VVCURVETO => {
                let mut i = 0;
                let mut dx1 = 0.0;
                if self.stack.len_is_odd() {
                    dx1 = self.stack.get(0)?;
                    i = 1;
                }
                while i + 4 <= self.stack.len() {
                    let [dya, dxb, dyb, dyc] = self.stack.get_array::<4>(i)?;
                    self.curve_by(dx1, dya, dxb, dyb, 0.0, dyc);
                    dx1 = 0.0;
                    i += 4;
                }
                self.stack.clear();
            }
            HHCURVETO => {
                let mut i = 0;
                let mut dy1 = 0.0;
                if self.stack.len_is_odd() {
                    dy1 = self.stack.get(0)?;
                    i = 1;
                }
                while i + 4 <= self.stack.len() {
                    let [dxa, dxb, dyb, dxc] = self.stack.get_array::<4>(i)?;
                    self.curve_by(dxa, dy1, dxb, dyb, dxc, 0.0);
                    dy1 = 0.0;
                    i += 4;
                }
                self.stack.clear();
            }
            VHCURVETO | HVCURVETO => {
                let count = self.stack.len();
                let mut horizontal = op == HVCURVETO;
                let mut i = 0;
                while i + 4 <= count {
                    let [a, b, cc, d] = self.stack.get_array::<4>(i)?;
                    // A fifth operand on the last curve bends its end tangent.
                    let last = if count - i == 5 { self.stack.get(i + 4)? } else { 0.0 };
                    if horizontal {
                        self.curve_by(a, 0.0, b, cc, last, d);
                    } else {
                        self.curve_by(0.0, a, b, cc, d, last);
                    }
                    horizontal = !horizontal;
                    i += 4;
                }
                self.stack.clear();
            }
            CALLSUBR | CALLGSUBR => {
                let index = if op == CALLSUBR {
                    self.subrs.local.ok_or_else(|| {
                        FontError::InvalidCharstring("callsubr without local subroutines".into())
                    })?
                } else {
                    self.subrs.global
                };
                let number = self.stack.pop()? as i32 + index.subr_bias();
                let subr = usize::try_from(number)
                    .map_err(|_| FontError::InvalidCharstring(format!("negative subroutine {}", number)))
                    .and_then(|n| index.get(self.subrs.data, n))?;
                if self.run(subr, depth + 1)? == Flow::End {
                    return Ok(Flow::End);
                }
            }
            RETURN => return Ok(Flow::Return),
            ENDCHAR => {
                // Four trailing operands are the seac accent form.
                let extra = self.stack.len() == 1 || self.stack.len() == 5;
                let skip = self.state.take_width(self.stack, extra);
                if self.stack.len() - skip == 4 {
                    return Err(FontError::UnsupportedCharstringOperator(ENDCHAR as u16));
                }
                self.close_path();
                self.stack.clear();
                return Ok(Flow::End);
            }
            _ => {
                return Err(FontError::InvalidCharstring(format!("reserved operator {}", op)));
            }
        }
        Ok(Flow::Continue)
    }

    fn escaped_operator(&mut self, op: u8) -> FontResult<()> {
        let (x, y) = self.state.pos();
        match op {
            FLEX => {
                // The trailing flex depth operand is ignored.
                let a = self.stack.get_array::<12>(0)?;
                self.curve_by(a[0], a[1], a[2], a[3], a[4], a[5]);
                self.curve_by(a[6], a[7], a[8], a[9], a[10], a[11]);
            }
            HFLEX => {
                let [dx1, dx2, dy2, dx3, dx4, dx5, dx6] = self.stack.get_array::<7>(0)?;
                self.curve_by(dx1, 0.0, dx2, dy2, dx3, 0.0);
                self.curve_by(dx4, 0.0, dx5, -dy2, dx6, 0.0);
            }
            HFLEX1 => {
                let [dx1, dy1, dx2, dy2, dx3, dx4, dx5, dy5, dx6] = self.stack.get_array::<9>(0)?;
                self.curve_by(dx1, dy1, dx2, dy2, dx3, 0.0);
                let (_, y_mid) = self.state.pos();
                // The final point returns to the starting y.
                let dy6 = y - (y_mid + dy5);
                self.curve_by(dx4, 0.0, dx5, dy5, dx6, dy6);
            }
            FLEX1 => {
                let a = self.stack.get_array::<11>(0)?;
                let dx: f32 = a[0] + a[2] + a[4] + a[6] + a[8];
                let dy: f32 = a[1] + a[3] + a[5] + a[7] + a[9];
                self.curve_by(a[0], a[1], a[2], a[3], a[4], a[5]);
                let (cx, cy) = self.state.pos();
                // d6 runs along whichever axis moved further overall.
                let (end_x, end_y) = if dx.abs() > dy.abs() {
                    (x + dx + a[10], y)
                } else {
                    (x, y + dy + a[10])
                };
                let c0 = (cx + a[6], cy + a[7]);
                let c1 = (c0.0 + a[8], c0.1 + a[9]);
                self.curve_to(c0, c1, (end_x, end_y));
            }
            // and, or, not, abs, add, sub, div, neg, eq, drop, put, get,
            // ifelse, random, mul, sqrt, dup, exch, index, roll
            3 | 4 | 5 | 9 | 10 | 11 | 12 | 14 | 15 | 18 | 20 | 21 | 22 | 23 | 24 | 26 | 27
            | 28 | 29 | 30 => {
                return Err(FontError::UnsupportedCharstringOperator(
                    (ESCAPE as u16) << 8 | op as u16,
                ));
            }
            _ => {
                return Err(FontError::InvalidCharstring(format!(
                    "reserved operator 12 {}",
                    op
                )));
            }
        }
        self.stack.clear();
        Ok(())
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.close_path();
        self.state.x = x;
        self.state.y = y;
        self.state.is_open = true;
        self.sink.move_to(x, y);
        self.stack.clear();
    }

    fn line_by(&mut self, dx: f32, dy: f32) {
        self.state.x += dx;
        self.state.y += dy;
        self.sink.line_to(self.state.x, self.state.y);
    }

    /// Relative curve: each control point is relative to the previous one.
    fn curve_by(&mut self, dxa: f32, dya: f32, dxb: f32, dyb: f32, dxc: f32, dyc: f32) {
        let c0 = (self.state.x + dxa, self.state.y + dya);
        let c1 = (c0.0 + dxb, c0.1 + dyb);
        let end = (c1.0 + dxc, c1.1 + dyc);
        self.curve_to(c0, c1, end);
    }

    fn curve_to(&mut self, c0: (f32, f32), c1: (f32, f32), end: (f32, f32)) {
        self.state.x = end.0;
        self.state.y = end.1;
        self.sink.curve_to(c0.0, c0.1, c1.0, c1.1, end.0, end.1);
    }

    fn close_path(&mut self) {
        if self.state.is_open {
            self.state.is_open = false;
            self.sink.close();
        }
    }
}
