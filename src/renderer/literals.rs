use crate::model::*;
use crate::renderer::components::FLAGS_ATTRIBUTE;
use crate::renderer::traits::{EnumLiteralOptions, RenderContext};
use crate::renderer::type_names::TypeNameResolver;

const UNRESOLVED_MARKER: &str = " /* unresolved */";

/// Escapes one code point for a string (`quote = '"'`) or char
/// (`quote = '\''`) literal.
fn escape_into(out: &mut String, c: char, quote: char) {
    match c {
        '\0' => out.push_str("\\0"),
        '\u{07}' => out.push_str("\\a"),
        '\u{08}' => out.push_str("\\b"),
        '\u{0C}' => out.push_str("\\f"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{0B}' => out.push_str("\\v"),
        '\\' => out.push_str("\\\\"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if needs_unicode_escape(c as u32) => out.push_str(&format!("\\u{:04X}", c as u32)),
        c => out.push(c),
    }
}

fn needs_unicode_escape(code: u32) -> bool {
    code < 0x20
        || (0x7F..=0x9F).contains(&code)
        || matches!(code, 0x2028 | 0x2029 | 0xFEFF | 0xFFFE | 0xFFFF)
        || (0xD800..=0xDFFF).contains(&code)
}

pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        escape_into(&mut out, c, '"');
    }
    out.push('"');
    out
}

/// A UTF-16 code unit as a char literal; lone surrogates get `\u` escapes.
pub fn char_literal(unit: u16) -> String {
    let mut out = String::from("'");
    match char::from_u32(u32::from(unit)) {
        Some(c) => escape_into(&mut out, c, '\''),
        None => out.push_str(&format!("\\u{:04X}", unit)),
    }
    out.push('\'');
    out
}

/// Shortest round-trip text of a float in the `1E+300` exponent style.
fn float_text(debug: String) -> String {
    let (mantissa, exponent) = match debug.split_once('e') {
        Some((m, e)) => (m.to_string(), Some(e.to_string())),
        None => (debug, None),
    };
    let mantissa = mantissa
        .strip_suffix(".0")
        .map(str::to_string)
        .unwrap_or(mantissa);
    match exponent {
        None => mantissa,
        Some(exponent) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits.to_string()),
                None => ('+', exponent),
            };
            format!("{}E{}{:0>2}", mantissa, sign, digits)
        }
    }
}

/// Selected constant names of a flags decomposition plus the bits no
/// constant accounts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagTerms {
    pub names: Vec<String>,
    pub remainder: u64,
}

/// Decomposes `value` into a minimal set of named constants.
///
/// Candidates are the non-zero constants fully contained in `value`, in
/// ordinal name order. Candidates that are a strict bit-subset of another
/// candidate are dropped first. A survivor is then dropped when the other
/// survivors already cover all of its bits, later names first, so
/// overlapping sets such as `A=0b011`, `B=0b101`, `C=0b110` for `0b111`
/// yield two terms instead of three.
pub fn decompose_flags(value: u64, constants: &[(&str, u64)]) -> FlagTerms {
    let mut sorted: Vec<(&str, u64)> = constants.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let selected: Vec<(&str, u64)> = sorted
        .into_iter()
        .filter(|(_, bits)| *bits != 0 && value & bits == *bits)
        .collect();

    let is_strict_subset = |a: u64, b: u64| a != b && a & b == a;
    let mut alive: Vec<bool> = selected
        .iter()
        .map(|(_, bits)| !selected.iter().any(|(_, other)| is_strict_subset(*bits, *other)))
        .collect();
    for i in (0..selected.len()).rev() {
        if !alive[i] {
            continue;
        }
        let others = selected
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i && alive[*j])
            .fold(0u64, |acc, (_, (_, bits))| acc | bits);
        if others & selected[i].1 == selected[i].1 {
            alive[i] = false;
        }
    }

    let mut union = 0u64;
    let mut names = Vec::new();
    for ((name, bits), keep) in selected.into_iter().zip(alive) {
        if keep {
            union |= bits;
            names.push(name.to_string());
        }
    }
    FlagTerms {
        names,
        remainder: value & !union,
    }
}

fn width_mask(underlying: PrimitiveType) -> u64 {
    match underlying.integral_width() {
        Some(width) if width < 8 => (1u64 << (width * 8)) - 1,
        _ => u64::MAX,
    }
}

/// Raw integer spelling of an enum value under the configured modes.
/// Negative values are always decimal.
pub fn raw_enum_literal(value: i128, options: EnumLiteralOptions) -> String {
    if value < 0 {
        return value.to_string();
    }
    if options.char && (0x20..=0x7E).contains(&value) {
        if let Some(c) = char::from_u32(value as u32) {
            let mut out = String::from("'");
            escape_into(&mut out, c, '\'');
            out.push('\'');
            return out;
        }
    }
    if options.binary {
        format!("0b{:b}", value)
    } else if options.hex {
        format!("0x{:X}", value)
    } else {
        value.to_string()
    }
}

/// Formats constant values as source literals.
pub struct LiteralFormatter<'c, 'a> {
    ctx: &'c RenderContext<'a>,
}

impl<'c, 'a> LiteralFormatter<'c, 'a> {
    pub fn new(ctx: &'c RenderContext<'a>) -> Self {
        Self { ctx }
    }

    fn resolver(&self) -> TypeNameResolver<'c, 'a> {
        TypeNameResolver::new(self.ctx)
    }

    fn system_qualified(&self, name: &str) -> String {
        if self.ctx.namespace == "System" {
            name.to_string()
        } else {
            format!("System.{}", name)
        }
    }

    /// `declared` is the type of the slot the value initializes, when known.
    pub fn format(&self, value: &ConstantValue, declared: Option<&TypeReference>) -> String {
        if let Some(enum_type) = declared.and_then(|d| self.declared_enum(d)) {
            if value.as_integer().is_some() && !matches!(value, ConstantValue::Enum(_)) {
                return self.enum_value(enum_type, value);
            }
        }
        match value {
            ConstantValue::Null => self.null(declared),
            ConstantValue::Boolean(v) => v.to_string(),
            ConstantValue::Char(v) => char_literal(*v),
            ConstantValue::Int8(v) => match *v {
                i8::MAX => "sbyte.MaxValue".to_string(),
                i8::MIN => "sbyte.MinValue".to_string(),
                v => format!("(sbyte){}", v),
            },
            ConstantValue::UInt8(v) => match *v {
                u8::MAX => "byte.MaxValue".to_string(),
                v => format!("(byte){}", v),
            },
            ConstantValue::Int16(v) => match *v {
                i16::MAX => "short.MaxValue".to_string(),
                i16::MIN => "short.MinValue".to_string(),
                v => format!("(short){}", v),
            },
            ConstantValue::UInt16(v) => match *v {
                u16::MAX => "ushort.MaxValue".to_string(),
                v => format!("(ushort){}", v),
            },
            ConstantValue::Int32(v) => match *v {
                i32::MAX => "int.MaxValue".to_string(),
                i32::MIN => "int.MinValue".to_string(),
                v => v.to_string(),
            },
            ConstantValue::UInt32(v) => match *v {
                u32::MAX => "uint.MaxValue".to_string(),
                v => format!("{}U", v),
            },
            ConstantValue::Int64(v) => match *v {
                i64::MAX => "long.MaxValue".to_string(),
                i64::MIN => "long.MinValue".to_string(),
                v => format!("{}L", v),
            },
            ConstantValue::UInt64(v) => match *v {
                u64::MAX => "ulong.MaxValue".to_string(),
                v => format!("{}UL", v),
            },
            ConstantValue::Float32(v) => self.float32(*v),
            ConstantValue::Float64(v) => self.float64(*v),
            ConstantValue::Decimal(text) => match text.as_str() {
                "79228162514264337593543950335" => "decimal.MaxValue".to_string(),
                "-79228162514264337593543950335" => "decimal.MinValue".to_string(),
                text => format!("{}M", text),
            },
            ConstantValue::String(text) => string_literal(text),
            ConstantValue::Type(ty) => format!("typeof({})", self.resolver().render_plain(ty)),
            ConstantValue::Enum(e) => self.enum_value(&e.enum_type, &e.value),
            ConstantValue::Array(array) => self.array(array),
        }
    }

    fn null(&self, declared: Option<&TypeReference>) -> String {
        let Some(declared) = declared else {
            return "null".to_string();
        };
        match declared.unmodified() {
            TypeReference::Pointer(_) | TypeReference::FunctionPointer(_) => "null".to_string(),
            TypeReference::GenericParameter(_) => "default".to_string(),
            other if other.is_value_type() && other.nullable_value_argument().is_none() => {
                "default".to_string()
            }
            _ => "null".to_string(),
        }
    }

    fn declared_enum<'t>(&self, declared: &'t TypeReference) -> Option<&'t NamedType> {
        let declared = declared.nullable_value_argument().unwrap_or(declared);
        let named = declared.as_named()?;
        let decl = self.ctx.index.get(named)?;
        (decl.kind == TypeKind::Enum).then_some(named)
    }

    fn float64(&self, v: f64) -> String {
        let named = if v.is_nan() {
            Some("double.NaN".to_string())
        } else if v == f64::INFINITY {
            Some("double.PositiveInfinity".to_string())
        } else if v == f64::NEG_INFINITY {
            Some("double.NegativeInfinity".to_string())
        } else if v == f64::MAX {
            Some("double.MaxValue".to_string())
        } else if v == f64::MIN {
            Some("double.MinValue".to_string())
        } else if v == f64::from_bits(1) {
            Some("double.Epsilon".to_string())
        } else if v == std::f64::consts::PI {
            Some(self.system_qualified("Math.PI"))
        } else if v == std::f64::consts::E {
            Some(self.system_qualified("Math.E"))
        } else {
            None
        };
        named.unwrap_or_else(|| format!("{}D", float_text(format!("{:?}", v))))
    }

    fn float32(&self, v: f32) -> String {
        let named = if v.is_nan() {
            Some("float.NaN".to_string())
        } else if v == f32::INFINITY {
            Some("float.PositiveInfinity".to_string())
        } else if v == f32::NEG_INFINITY {
            Some("float.NegativeInfinity".to_string())
        } else if v == f32::MAX {
            Some("float.MaxValue".to_string())
        } else if v == f32::MIN {
            Some("float.MinValue".to_string())
        } else if v == f32::from_bits(1) {
            Some("float.Epsilon".to_string())
        } else if v == std::f32::consts::PI {
            Some(self.system_qualified("MathF.PI"))
        } else if v == std::f32::consts::E {
            Some(self.system_qualified("MathF.E"))
        } else {
            None
        };
        named.unwrap_or_else(|| format!("{}F", float_text(format!("{:?}", v))))
    }

    fn array(&self, array: &ArrayValue) -> String {
        let Some(elements) = &array.elements else {
            return "null".to_string();
        };
        let element_type = self.resolver().render_plain(&array.element_type);
        if elements.is_empty() {
            return format!("new {}[] {{ }}", element_type);
        }
        let items: Vec<String> = elements
            .iter()
            .map(|e| self.format(e, Some(&array.element_type)))
            .collect();
        format!("new {}[] {{ {} }}", element_type, items.join(", "))
    }

    fn cast(&self, type_text: &str, value: i128) -> String {
        let raw = raw_enum_literal(value, self.ctx.options.enum_literals);
        if value < 0 {
            format!("({})({})", type_text, raw)
        } else {
            format!("({}){}", type_text, raw)
        }
    }

    /// An enum value by constant name where possible, else as a cast.
    pub fn enum_value(&self, enum_type: &NamedType, value: &ConstantValue) -> String {
        let type_text = self.resolver().render_named(enum_type);
        let Some(raw) = value.as_integer() else {
            return format!("({}){}", type_text, self.format(value, None));
        };
        let decl = match self.ctx.index.get(enum_type) {
            Some(decl) if decl.kind == TypeKind::Enum => decl,
            _ => return format!("{}{}", self.cast(&type_text, raw), UNRESOLVED_MARKER),
        };

        let mut constants: Vec<(&str, i128)> = decl
            .fields
            .iter()
            .filter(|f| f.modifiers.contains(FieldModifiers::LITERAL))
            .filter_map(|f| Some((f.name.as_str(), f.constant.as_ref()?.as_integer()?)))
            .collect();
        constants.sort_by(|a, b| a.0.cmp(b.0));

        if !has_flags(decl) {
            return match constants.iter().find(|(_, v)| *v == raw) {
                Some((name, _)) => format!("{}.{}", type_text, name),
                None => self.cast(&type_text, raw),
            };
        }

        let mask = width_mask(decl.underlying_type());
        let bits = (raw as u64) & mask;
        if bits == 0 {
            return match constants.iter().find(|(_, v)| *v == 0) {
                Some((name, _)) => format!("{}.{}", type_text, name),
                None => format!("({})0", type_text),
            };
        }
        let masked: Vec<(&str, u64)> = constants
            .iter()
            .map(|(name, v)| (*name, (*v as u64) & mask))
            .collect();
        let terms = decompose_flags(bits, &masked);
        let mut parts: Vec<String> = terms
            .names
            .iter()
            .map(|name| format!("{}.{}", type_text, name))
            .collect();
        if terms.remainder != 0 || parts.is_empty() {
            let remainder = if parts.is_empty() { raw } else { i128::from(terms.remainder) };
            parts.push(self.cast(&type_text, remainder));
        }
        parts.join(" | ")
    }
}

fn has_flags(decl: &TypeDeclaration) -> bool {
    decl.annotations.iter().any(|a| a.is(FLAGS_ATTRIBUTE))
}
