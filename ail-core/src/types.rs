#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Prim {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Str,
    Unit,
}

impl Prim {
    pub fn from_name(name: &str) -> Option<Prim> {
        Some(match name {
            "i8" => Prim::I8,
            "i16" => Prim::I16,
            "i32" => Prim::I32,
            "i64" => Prim::I64,
            "u8" => Prim::U8,
            "u16" => Prim::U16,
            "u32" => Prim::U32,
            "u64" => Prim::U64,
            "f32" => Prim::F32,
            "f64" => Prim::F64,
            "bool" => Prim::Bool,
            "str" => Prim::Str,
            "()" => Prim::Unit,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Prim::I8 => "i8",
            Prim::I16 => "i16",
            Prim::I32 => "i32",
            Prim::I64 => "i64",
            Prim::U8 => "u8",
            Prim::U16 => "u16",
            Prim::U32 => "u32",
            Prim::U64 => "u64",
            Prim::F32 => "f32",
            Prim::F64 => "f64",
            Prim::Bool => "bool",
            Prim::Str => "str",
            Prim::Unit => "()",
        }
    }

    pub fn is_int(self) -> bool {
        self.int_range().is_some()
    }

    pub fn is_signed_int(self) -> bool {
        matches!(self, Prim::I8 | Prim::I16 | Prim::I32 | Prim::I64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Prim::F32 | Prim::F64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_int() || self.is_float()
    }

    /// Inclusive value range of an integer type.
    pub fn int_range(self) -> Option<(i128, i128)> {
        Some(match self {
            Prim::I8 => (i8::MIN.into(), i8::MAX.into()),
            Prim::I16 => (i16::MIN.into(), i16::MAX.into()),
            Prim::I32 => (i32::MIN.into(), i32::MAX.into()),
            Prim::I64 => (i64::MIN.into(), i64::MAX.into()),
            Prim::U8 => (0, u8::MAX.into()),
            Prim::U16 => (0, u16::MAX.into()),
            Prim::U32 => (0, u32::MAX.into()),
            Prim::U64 => (0, u64::MAX.into()),
            _ => return None,
        })
    }
}

/// A resolved type.
///
/// `Named` carries the declaring module so equally named types from two
/// modules stay distinct. `Error` is the poison type given to a node after a
/// fault has been reported; it is compatible with every other type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Prim),
    Named {
        module: String,
        name: String,
        args: Vec<Type>,
    },
    Param(String),
    Error,
}

/// How a value behaves when it is used as an operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// Copied on use, never invalidated.
    Copy,
    /// Consumed on value-producing use.
    Move,
}

impl Type {
    pub const UNIT: Type = Type::Primitive(Prim::Unit);
    pub const BOOL: Type = Type::Primitive(Prim::Bool);
    pub const I32: Type = Type::Primitive(Prim::I32);
    pub const F64: Type = Type::Primitive(Prim::F64);
    pub const STR: Type = Type::Primitive(Prim::Str);

    pub fn named(module: impl Into<String>, name: impl Into<String>, args: Vec<Type>) -> Type {
        Type::Named {
            module: module.into(),
            name: name.into(),
            args,
        }
    }

    pub fn prim(&self) -> Option<Prim> {
        match self {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_bool(&self) -> bool {
        self.prim() == Some(Prim::Bool)
    }

    pub fn is_unit(&self) -> bool {
        self.prim() == Some(Prim::Unit)
    }

    /// Every primitive, `str` included, is Copy; user types and type
    /// parameters are Move. The poison type is treated as Copy so a type
    /// error never cascades into ownership errors.
    pub fn ownership(&self) -> Ownership {
        match self {
            Type::Primitive(_) | Type::Error => Ownership::Copy,
            Type::Named { .. } | Type::Param(_) => Ownership::Move,
        }
    }

    pub fn is_move(&self) -> bool {
        self.ownership() == Ownership::Move
    }

    pub fn contains_error(&self) -> bool {
        match self {
            Type::Error => true,
            Type::Named { args, .. } => args.iter().any(Type::contains_error),
            _ => false,
        }
    }

    /// Structural equality where the poison type matches anything.
    pub fn compatible(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Error, _) | (_, Type::Error) => true,
            (
                Type::Named {
                    module: m1,
                    name: n1,
                    args: a1,
                },
                Type::Named {
                    module: m2,
                    name: n2,
                    args: a2,
                },
            ) => {
                m1 == m2
                    && n1 == n2
                    && a1.len() == a2.len()
                    && a1.iter().zip(a2).all(|(x, y)| x.compatible(y))
            }
            (a, b) => a == b,
        }
    }

    /// Replaces declaration parameters with use-site arguments.
    pub fn substitute(&self, map: &HashMap<String, Type>) -> Type {
        match self {
            Type::Param(p) => map.get(p).cloned().unwrap_or_else(|| self.clone()),
            Type::Named { module, name, args } => Type::Named {
                module: module.clone(),
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(map)).collect(),
            },
            other => other.clone(),
        }
    }

    /// Binds the parameters in `self` so that it equals `actual`.
    ///
    /// Returns false on a structural mismatch or a conflicting binding.
    pub fn bind_params(&self, actual: &Type, map: &mut HashMap<String, Option<Type>>) -> bool {
        match (self, actual) {
            (_, Type::Error) => true,
            (Type::Param(p), _) if map.contains_key(p) => match map.get(p).cloned().flatten() {
                Some(bound) => bound.compatible(actual),
                None => {
                    map.insert(p.clone(), Some(actual.clone()));
                    true
                }
            },
            (
                Type::Named {
                    module: m1,
                    name: n1,
                    args: a1,
                },
                Type::Named {
                    module: m2,
                    name: n2,
                    args: a2,
                },
            ) => {
                m1 == m2
                    && n1 == n2
                    && a1.len() == a2.len()
                    && a1.iter().zip(a2).all(|(x, y)| x.bind_params(y, map))
            }
            (expected, actual) => expected.compatible(actual),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => f.write_str(p.name()),
            Type::Param(p) => f.write_str(p),
            Type::Error => f.write_str("{error}"),
            Type::Named { name, args, .. } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}
