//! Variable formatter: a labelled, typed view of a caller-owned value.
//!
//! The logger never owns sampled data. Each [`Variable`] holds a shared
//! reference to a `Cell` the caller keeps updating between cycles, and
//! renders its current value into one delimited text field on demand.

use std::cell::Cell;
use std::fmt;

use crate::error::{DatalogError, Result};

/// Upper bound on the length of one rendered field.
pub const MAX_FIELD_CHARS: usize = 32;

/// Non-owning reference to the sampled value, one variant per numeric kind.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Int(&'a Cell<i32>),
    Float(&'a Cell<f32>),
    Double(&'a Cell<f64>),
}

impl<'a> From<&'a Cell<i32>> for Source<'a> {
    fn from(v: &'a Cell<i32>) -> Self {
        Source::Int(v)
    }
}
impl<'a> From<&'a Cell<f32>> for Source<'a> {
    fn from(v: &'a Cell<f32>) -> Self {
        Source::Float(v)
    }
}
impl<'a> From<&'a Cell<f64>> for Source<'a> {
    fn from(v: &'a Cell<f64>) -> Self {
        Source::Double(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Int,
    Float,
    Double,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Int => write!(f, "int"),
            Kind::Float => write!(f, "float"),
            Kind::Double => write!(f, "double"),
        }
    }
}

/// Field formatting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Minimum field width. Negative left-aligns floating values.
    pub min_digits: i32,
    /// Digits after the decimal point; ignored for integers.
    pub float_precision: u8,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            min_digits: 1,
            float_precision: 2,
        }
    }
}

impl Format {
    pub fn new(min_digits: i32, float_precision: u8) -> Self {
        Self {
            min_digits,
            float_precision,
        }
    }

    pub fn width(min_digits: i32) -> Self {
        Self {
            min_digits,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Variable<'a> {
    label: String,
    source: Source<'a>,
    format: Format,
}

impl<'a> Variable<'a> {
    /// Fails if the requested width, or for floating kinds the sign, leading
    /// digit, point and fractional digits, would not fit in a field.
    pub fn new(label: impl Into<String>, source: Source<'a>, format: Format) -> Result<Self> {
        let label = label.into();
        if format.min_digits.unsigned_abs() as usize > MAX_FIELD_CHARS {
            return Err(DatalogError::WidthTooLarge {
                label,
                width: format.min_digits,
                max: MAX_FIELD_CHARS,
            });
        }
        let floating = !matches!(source, Source::Int(_));
        if floating && usize::from(format.float_precision) + 2 > MAX_FIELD_CHARS {
            return Err(DatalogError::PrecisionTooLarge {
                label,
                precision: format.float_precision,
                max: MAX_FIELD_CHARS,
            });
        }
        Ok(Self {
            label,
            source,
            format,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> Kind {
        match self.source {
            Source::Int(_) => Kind::Int,
            Source::Float(_) => Kind::Float,
            Source::Double(_) => Kind::Double,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Render the current value of the referenced variable.
    pub fn serialize(&self) -> Result<String> {
        let text = match self.source {
            Source::Int(v) => pad_int(v.get(), self.format.min_digits),
            Source::Float(v) => fixed(v.get(), self.format),
            Source::Double(v) => fixed(v.get(), self.format),
        };
        if text.len() > MAX_FIELD_CHARS {
            return Err(DatalogError::FieldOverflow {
                label: self.label.clone(),
                len: text.len(),
                max: MAX_FIELD_CHARS,
            });
        }
        Ok(text)
    }
}

fn pad_int(value: i32, min_digits: i32) -> String {
    let width = min_digits.max(0) as usize;
    format!("{value:>width$}")
}

// Right-aligned for positive widths, left-aligned for negative ones.
fn fixed<T>(value: T, format: Format) -> String
where
    T: fmt::Display + Into<f64> + Copy,
{
    let precision = usize::from(format.float_precision);
    let width = format.min_digits.unsigned_abs() as usize;

    let wide: f64 = value.into();
    let body = if wide.is_nan() {
        "nan".to_string()
    } else if wide.is_infinite() {
        (if wide < 0.0 { "-inf" } else { "inf" }).to_string()
    } else {
        format!("{value:.precision$}")
    };

    if format.min_digits < 0 {
        format!("{body:<width$}")
    } else {
        format!("{body:>width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_var(cell: &Cell<i32>, min_digits: i32) -> Variable<'_> {
        Variable::new("i", cell.into(), Format::width(min_digits)).unwrap()
    }

    #[test]
    fn int_is_left_padded_to_min_digits() {
        let x = Cell::new(42);
        assert_eq!(int_var(&x, 3).serialize().unwrap(), " 42");
        assert_eq!(int_var(&x, 1).serialize().unwrap(), "42");
        x.set(-7);
        assert_eq!(int_var(&x, 4).serialize().unwrap(), "  -7");
    }

    #[test]
    fn int_width_is_a_minimum_not_a_maximum() {
        let x = Cell::new(-123_456);
        assert_eq!(int_var(&x, 3).serialize().unwrap(), "-123456");
        assert_eq!(int_var(&x, 0).serialize().unwrap(), "-123456");
        assert_eq!(int_var(&x, -5).serialize().unwrap(), "-123456");
    }

    #[test]
    fn int_padding_strips_back_to_decimal() {
        for v in [i32::MIN, -1000, -1, 0, 7, 99, 12345, i32::MAX] {
            let x = Cell::new(v);
            for d in 0..=12 {
                let s = int_var(&x, d).serialize().unwrap();
                assert!(s.len() >= d as usize);
                assert_eq!(s.trim_start_matches(' '), v.to_string());
            }
        }
    }

    #[test]
    fn reads_the_live_value_each_time() {
        let x = Cell::new(1);
        let var = int_var(&x, 1);
        assert_eq!(var.serialize().unwrap(), "1");
        x.set(2);
        assert_eq!(var.serialize().unwrap(), "2");
    }

    #[test]
    fn float_uses_width_and_precision() {
        let y = Cell::new(3.14159_f32);
        let var = Variable::new("Y", (&y).into(), Format::new(1, 2)).unwrap();
        assert_eq!(var.kind(), Kind::Float);
        assert_eq!(var.serialize().unwrap(), "3.14");

        let wide = Variable::new("Y", (&y).into(), Format::new(8, 3)).unwrap();
        assert_eq!(wide.serialize().unwrap(), "   3.142");
    }

    #[test]
    fn negative_width_left_aligns_floats() {
        let z = Cell::new(-1.5_f64);
        let var = Variable::new("Z", (&z).into(), Format::new(-7, 1)).unwrap();
        assert_eq!(var.serialize().unwrap(), "-1.5   ");
    }

    #[test]
    fn double_never_uses_scientific_notation() {
        let z = Cell::new(1.0e20_f64);
        let var = Variable::new("Z", (&z).into(), Format::new(1, 2)).unwrap();
        assert_eq!(var.serialize().unwrap(), "100000000000000000000.00");

        z.set(1.0e-9);
        assert_eq!(var.serialize().unwrap(), "0.00");
    }

    #[test]
    fn precision_digits_and_parse_back() {
        for v in [0.0_f64, 1.25, -2.5, 123.456, -0.001, 98765.4321] {
            let z = Cell::new(v);
            for p in 0..=6u8 {
                let var = Variable::new("Z", (&z).into(), Format::new(1, p)).unwrap();
                let s = var.serialize().unwrap();
                let frac = s.split('.').nth(1).map_or(0, str::len);
                assert_eq!(frac, usize::from(p), "{s}");
                let back: f64 = s.trim().parse().unwrap();
                assert!((back - v).abs() <= 0.5 * 10f64.powi(-i32::from(p)) + 1e-12);
            }
        }
    }

    #[test]
    fn non_finite_values() {
        let z = Cell::new(f64::NAN);
        let var = Variable::new("Z", (&z).into(), Format::new(5, 2)).unwrap();
        assert_eq!(var.serialize().unwrap(), "  nan");
        z.set(f64::NEG_INFINITY);
        assert_eq!(var.serialize().unwrap(), " -inf");
    }

    #[test]
    fn oversized_value_is_an_error() {
        let z = Cell::new(1.0e40_f64);
        let var = Variable::new("big", (&z).into(), Format::default()).unwrap();
        match var.serialize() {
            Err(DatalogError::FieldOverflow { label, max, .. }) => {
                assert_eq!(label, "big");
                assert_eq!(max, MAX_FIELD_CHARS);
            }
            other => panic!("expected overflow, got {other:?}"),
        }
    }

    #[test]
    fn oversized_precision_is_rejected_at_registration() {
        let y = Cell::new(1.0_f32);
        let err = Variable::new("Y", (&y).into(), Format::new(1, 40)).unwrap_err();
        assert!(matches!(err, DatalogError::PrecisionTooLarge { precision: 40, .. }));

        // Widest accepted precision still renders within the field limit.
        let z = Cell::new(0.5_f64);
        let edge = Variable::new("Z", (&z).into(), Format::new(1, 30)).unwrap();
        assert_eq!(edge.serialize().unwrap().len(), 32);

        // Integers ignore precision entirely.
        let x = Cell::new(3);
        assert!(Variable::new("X", (&x).into(), Format::new(1, 40)).is_ok());
    }

    #[test]
    fn oversized_width_is_rejected_at_registration() {
        let x = Cell::new(0);
        let err = Variable::new("w", (&x).into(), Format::width(40)).unwrap_err();
        assert!(matches!(err, DatalogError::WidthTooLarge { width: 40, .. }));
    }
}
