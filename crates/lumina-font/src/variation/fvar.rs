//! `fvar` axes and named instances.

use crate::cursor::ByteCursor;
use crate::error::{FontError, FontResult};
use crate::tables::Tag;

/// A variation axis in user-space units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontAxis {
    pub tag: Tag,
    pub min_value: f32,
    pub default_value: f32,
    pub max_value: f32,
    pub flags: u16,
    pub name_id: u16,
}

impl FontAxis {
    /// Set when the axis should not be exposed in user interfaces.
    pub const HIDDEN_AXIS: u16 = 0x0001;

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min_value, self.max_value)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags & Self::HIDDEN_AXIS != 0
    }
}

/// A named instance: a predefined point in the design space.
#[derive(Debug, Clone, PartialEq)]
pub struct FontInstance {
    pub subfamily_name_id: u16,
    pub postscript_name_id: Option<u16>,
    /// One user-space coordinate per axis, in axis order.
    pub coordinates: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FvarTable {
    pub axes: Vec<FontAxis>,
    pub instances: Vec<FontInstance>,
}

impl FvarTable {
    pub fn parse(data: &[u8]) -> FontResult<Self> {
        let mut c = ByteCursor::new(data);
        let major = c.read_u16()?;
        let _minor = c.read_u16()?;
        if major != 1 {
            return Err(FontError::malformed(
                Tag::FVAR,
                format!("unsupported version {}", major),
            ));
        }
        let axes_offset = c.read_u16()? as usize;
        let _reserved = c.read_u16()?;
        let axis_count = c.read_u16()? as usize;
        let axis_size = c.read_u16()? as usize;
        let instance_count = c.read_u16()? as usize;
        let instance_size = c.read_u16()? as usize;

        if axis_size < 20 {
            return Err(FontError::malformed(
                Tag::FVAR,
                format!("axis record size {} is too small", axis_size),
            ));
        }

        let mut axes = Vec::with_capacity(axis_count);
        for i in 0..axis_count {
            let mut a = ByteCursor::at(data, axes_offset + i * axis_size)?;
            let axis = FontAxis {
                tag: a.read_tag()?,
                min_value: a.read_fixed()?,
                default_value: a.read_fixed()?,
                max_value: a.read_fixed()?,
                flags: a.read_u16()?,
                name_id: a.read_u16()?,
            };
            if !(axis.min_value <= axis.default_value && axis.default_value <= axis.max_value) {
                return Err(FontError::malformed(
                    Tag::FVAR,
                    format!(
                        "axis '{}' range {}..{}..{} is not ordered",
                        axis.tag, axis.min_value, axis.default_value, axis.max_value
                    ),
                ));
            }
            axes.push(axis);
        }

        // Instances follow the axis records; the PostScript name id is present
        // only when the record has room for it.
        let instances_offset = axes_offset + axis_count * axis_size;
        let has_postscript_name = instance_size >= axis_count * 4 + 6;
        let mut instances = Vec::with_capacity(instance_count);
        for i in 0..instance_count {
            let mut r = ByteCursor::at(data, instances_offset + i * instance_size)?;
            let subfamily_name_id = r.read_u16()?;
            let _flags = r.read_u16()?;
            let mut coordinates = Vec::with_capacity(axis_count);
            for _ in 0..axis_count {
                coordinates.push(r.read_fixed()?);
            }
            let postscript_name_id = if has_postscript_name {
                Some(r.read_u16()?)
            } else {
                None
            };
            instances.push(FontInstance {
                subfamily_name_id,
                postscript_name_id,
                coordinates,
            });
        }

        Ok(Self { axes, instances })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(v: f32) -> [u8; 4] {
        ((v * 65536.0) as i32).to_be_bytes()
    }

    fn fvar_weight(with_ps_name: bool) -> Vec<u8> {
        let instance_size: u16 = if with_ps_name { 10 } else { 8 };
        let mut out = Vec::new();
        for v in [1u16, 0, 16, 2, 1, 20, 1, instance_size] {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out.extend_from_slice(b"wght");
        out.extend_from_slice(&fixed(100.0));
        out.extend_from_slice(&fixed(400.0));
        out.extend_from_slice(&fixed(900.0));
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&256u16.to_be_bytes());
        out.extend_from_slice(&257u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&fixed(700.0));
        if with_ps_name {
            out.extend_from_slice(&300u16.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_axes_and_instances() {
        let fvar = FvarTable::parse(&fvar_weight(true)).unwrap();
        assert_eq!(fvar.axes.len(), 1);
        let axis = fvar.axes[0];
        assert_eq!(axis.tag, Tag::new(b"wght"));
        assert_eq!((axis.min_value, axis.default_value, axis.max_value), (100.0, 400.0, 900.0));
        assert_eq!(axis.name_id, 256);
        assert_eq!(fvar.instances[0].coordinates, vec![700.0]);
        assert_eq!(fvar.instances[0].postscript_name_id, Some(300));
    }

    #[test]
    fn test_instance_without_postscript_name() {
        let fvar = FvarTable::parse(&fvar_weight(false)).unwrap();
        assert_eq!(fvar.instances[0].postscript_name_id, None);
    }

    #[test]
    fn test_axis_clamp() {
        let fvar = FvarTable::parse(&fvar_weight(false)).unwrap();
        assert_eq!(fvar.axes[0].clamp(1000.0), 900.0);
        assert_eq!(fvar.axes[0].clamp(0.0), 100.0);
    }
}
