//! Enum metadata and the [`db_enum!`](crate::db_enum) declaration macro.
//!
//! Database enums are open: a column can hold any integer even if the Rust
//! side only names a few of them. Enums declared through `db_enum!` are
//! therefore integer newtypes with associated constants rather than closed
//! Rust enums, so an unchecked raw value can always be represented.

use super::value::DbType;

/// A named member of an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumMember {
    pub name: &'static str,
    pub value: i64,
}

/// Static description of an enum type.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumInfo {
    /// Type name, used in error messages.
    pub name: &'static str,
    /// Integral storage type.
    pub underlying: DbType,
    /// Bitmask enum: any combination of bits is accepted.
    pub flags: bool,
    pub members: &'static [EnumMember],
}

/// Result of interpreting text as an enum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedLabel {
    /// The text named members (or was numeric); carries the raw value.
    Raw(i64),
    /// The text named no member.
    Unknown,
}

impl EnumInfo {
    /// Returns true if `raw` is the value of a declared member.
    #[must_use]
    pub fn is_defined(&self, raw: i64) -> bool {
        self.members.iter().any(|m| m.value == raw)
    }

    /// Find a member by name, ignoring ASCII case.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Label of the member with the given value.
    #[must_use]
    pub fn label(&self, raw: i64) -> Option<&'static str> {
        self.members.iter().find(|m| m.value == raw).map(|m| m.name)
    }

    /// Interpret text as an enum value.
    ///
    /// Numeric strings are taken as raw values. Otherwise labels are matched
    /// case-insensitively; flag enums accept a comma-separated label list.
    #[must_use]
    pub fn parse_label(&self, text: &str) -> ParsedLabel {
        let text = text.trim();
        if let Ok(raw) = text.parse::<i64>() {
            return ParsedLabel::Raw(raw);
        }

        if self.flags && text.contains(',') {
            let mut raw = 0_i64;
            for part in text.split(',') {
                match self.member(part.trim()) {
                    Some(m) => raw |= m.value,
                    None => return ParsedLabel::Unknown,
                }
            }
            return ParsedLabel::Raw(raw);
        }

        self.member(text)
            .map_or(ParsedLabel::Unknown, |m| ParsedLabel::Raw(m.value))
    }

    /// Render a raw value as text.
    ///
    /// Members render as their label; flag combinations as a `", "`-joined
    /// label list; anything else as the decimal number.
    #[must_use]
    pub fn format(&self, raw: i64) -> String {
        if let Some(label) = self.label(raw) {
            return label.to_string();
        }

        if self.flags && raw != 0 {
            let mut remaining = raw;
            let mut labels = Vec::new();
            for m in self.members.iter().filter(|m| m.value != 0) {
                if raw & m.value == m.value {
                    labels.push(m.name);
                    remaining &= !m.value;
                }
            }
            if remaining == 0 && !labels.is_empty() {
                return labels.join(", ");
            }
        }

        self.widen(raw).to_string()
    }

    /// Raw value as the number the underlying type holds. `u64` enums store
    /// values above `i64::MAX` wrapped into the negative range.
    #[must_use]
    pub const fn widen(&self, raw: i64) -> i128 {
        match self.underlying {
            DbType::U64 => raw as u64 as i128,
            _ => raw as i128,
        }
    }

    /// Inverse of [`widen`](Self::widen); `None` when `wide` fits neither
    /// `i64` nor `u64`.
    #[must_use]
    pub fn narrow(wide: i128) -> Option<i64> {
        i64::try_from(wide)
            .ok()
            .or_else(|| u64::try_from(wide).ok().map(|v| v as i64))
    }
}

/// An enum value tagged with its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    pub info: &'static EnumInfo,
    pub raw: i64,
}

impl EnumValue {
    #[must_use]
    pub const fn new(info: &'static EnumInfo, raw: i64) -> Self {
        Self { info, raw }
    }

    /// Returns true if the raw value is a declared member.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.info.is_defined(self.raw)
    }
}

/// Integer types an enum can be stored as.
pub trait EnumRepr: Copy + Send + Sync + 'static {
    /// Storage type of the representation.
    const DB_TYPE: DbType;

    fn from_raw(raw: i64) -> Self;

    fn into_raw(self) -> i64;
}

macro_rules! enum_repr {
    ($($ty:ty => $db:ident),* $(,)?) => {
        $(
            impl EnumRepr for $ty {
                const DB_TYPE: DbType = DbType::$db;

                fn from_raw(raw: i64) -> Self {
                    raw as Self
                }

                fn into_raw(self) -> i64 {
                    self as i64
                }
            }
        )*
    };
}

enum_repr!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
);

/// Enum types usable as record fields.
///
/// Implemented by [`db_enum!`](crate::db_enum); hand-written implementations
/// must accept every raw value in `from_raw`.
pub trait DbEnum: Copy + Send + Sync + 'static {
    fn info() -> &'static EnumInfo;

    fn from_raw(raw: i64) -> Self;

    fn raw(self) -> i64;
}

/// Declare an open enum usable as a record field.
///
/// ```rust
/// rowbind::db_enum! {
///     pub struct Color(i32) {
///         RED = 0 => "Red",
///         GREEN = 1 => "Green",
///         BLUE = 2 => "Blue",
///     }
/// }
///
/// rowbind::db_enum! {
///     pub flags Access(u8) {
///         NONE = 0 => "None",
///         READ = 1 => "Read",
///         WRITE = 2 => "Write",
///     }
/// }
///
/// assert_eq!(Color::GREEN.0, 1);
/// assert_eq!(Color(5).0, 5);
/// ```
#[macro_export]
macro_rules! db_enum {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($repr:ty) {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $label:literal ),* $(,)?
        }
    ) => {
        $crate::db_enum!(@emit false, [$(#[$meta])*] $vis $name $repr {
            $( [$(#[$vmeta])*] $variant = $value => $label ),*
        });
    };
    (
        $(#[$meta:meta])*
        $vis:vis flags $name:ident($repr:ty) {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $label:literal ),* $(,)?
        }
    ) => {
        $crate::db_enum!(@emit true, [$(#[$meta])*] $vis $name $repr {
            $( [$(#[$vmeta])*] $variant = $value => $label ),*
        });
    };
    (@emit $flags:literal, [$($meta:tt)*] $vis:vis $name:ident $repr:ty {
        $( [$($vmeta:tt)*] $variant:ident = $value:literal => $label:literal ),*
    }) => {
        $($meta)*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(transparent)]
        $vis struct $name(pub $repr);

        impl $name {
            $(
                $($vmeta)*
                pub const $variant: Self = Self($value);
            )*
        }

        impl $crate::types::DbEnum for $name {
            fn info() -> &'static $crate::types::EnumInfo {
                static INFO: $crate::types::EnumInfo = $crate::types::EnumInfo {
                    name: stringify!($name),
                    underlying: <$repr as $crate::types::EnumRepr>::DB_TYPE,
                    flags: $flags,
                    members: &[
                        $(
                            $crate::types::EnumMember {
                                name: $label,
                                value: {
                                    const VALUE: $repr = $value;
                                    VALUE as i64
                                },
                            }
                        ),*
                    ],
                };
                &INFO
            }

            fn from_raw(raw: i64) -> Self {
                Self(<$repr as $crate::types::EnumRepr>::from_raw(raw))
            }

            fn raw(self) -> i64 {
                <$repr as $crate::types::EnumRepr>::into_raw(self.0)
            }
        }

        impl $crate::types::FieldValue for $name {
            fn field_type() -> $crate::types::FieldType {
                $crate::types::FieldType::of::<Self>(
                    $crate::types::ValueKind::Enum(<Self as $crate::types::DbEnum>::info()),
                    false,
                )
            }

            fn from_db(value: $crate::DbValue) -> $crate::Result<Self> {
                $crate::types::enum_from_db::<Self>(value)
            }

            fn to_db(&self) -> $crate::DbValue {
                $crate::DbValue::Enum($crate::types::EnumValue::new(
                    <Self as $crate::types::DbEnum>::info(),
                    $crate::types::DbEnum::raw(*self),
                ))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    static PERMS: EnumInfo = EnumInfo {
        name: "Perms",
        underlying: DbType::U8,
        flags: true,
        members: &[
            EnumMember {
                name: "None",
                value: 0,
            },
            EnumMember {
                name: "Read",
                value: 1,
            },
            EnumMember {
                name: "Write",
                value: 2,
            },
            EnumMember {
                name: "Exec",
                value: 4,
            },
        ],
    };

    crate::db_enum! {
        /// Colors used in tests.
        pub struct Color(i32) {
            RED = 0 => "Red",
            GREEN = 1 => "Green",
            BLUE = 2 => "Blue",
        }
    }

    #[test]
    fn test_parse_label_case_insensitive() {
        let info = Color::info();
        assert_eq!(info.parse_label("green"), ParsedLabel::Raw(1));
        assert_eq!(info.parse_label(" BLUE "), ParsedLabel::Raw(2));
        assert_eq!(info.parse_label("purple"), ParsedLabel::Unknown);
    }

    #[test]
    fn test_parse_label_numeric_string() {
        assert_eq!(Color::info().parse_label("7"), ParsedLabel::Raw(7));
        assert_eq!(Color::info().parse_label("-1"), ParsedLabel::Raw(-1));
    }

    #[test]
    fn test_parse_flags_list() {
        assert_eq!(PERMS.parse_label("Read, Exec"), ParsedLabel::Raw(5));
        assert_eq!(PERMS.parse_label("read,bogus"), ParsedLabel::Unknown);
    }

    #[test]
    fn test_format() {
        assert_eq!(Color::info().format(2), "Blue");
        assert_eq!(Color::info().format(9), "9");
        assert_eq!(PERMS.format(3), "Read, Write");
        assert_eq!(PERMS.format(0), "None");
        assert_eq!(PERMS.format(8), "8");
    }

    #[test]
    fn test_db_enum_macro() {
        assert_eq!(Color::BLUE, Color(2));
        assert_eq!(Color::default(), Color::RED);
        assert_eq!(Color::info().underlying, DbType::I32);
        assert!(!Color::info().flags);
        assert_eq!(Color::from_raw(5).raw(), 5);
        assert!(Color::info().is_defined(1));
        assert!(!Color::info().is_defined(5));
    }
}
