//! Enum name/value tables
//!
//! Each registered enum gets one [`EnumInfo`]: its enumerator names in
//! declaration order, their `i64` values, and maps in both directions.
//! Values follow declaration rules: explicit values are kept, implicit ones
//! continue from the previous value, and the first implicit value is 0.
//!
//! ```ignore
//! #[derive(Clone, Copy, ReflectEnum)]
//! enum Letter { A, B = 5, C }
//!
//! assert_eq!(Enum::<Letter>::to_string(&Letter::C)?, "C");
//! assert_eq!(Enum::<Letter>::info().to_value("B")?, 5);
//! assert!(Enum::<Letter>::get_value("Z").is_none());
//! ```
//!
//! Tables can also be built at runtime from declaration text with
//! [`declare`].

pub mod declaration;

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::debug;

use crate::error::{MirrorError, MirrorResult};
use crate::identity::TypeIdentity;

/// A fieldless enum with a name/value table
///
/// Usually derived with `#[derive(ReflectEnum)]`.
pub trait ReflectEnum: Any + Sized {
    /// Enum name used in messages
    const NAME: &'static str;

    /// Enumerator list as written, e.g. `"A, B = 5, C"`
    const DECLARATION: &'static str;

    /// Enumerator names in declaration order
    const NAMES: &'static [&'static str];

    /// Explicitly assigned values, `None` for implicit enumerators
    const EXPLICIT: &'static [Option<i64>];

    fn to_i64(&self) -> i64;

    fn from_i64(value: i64) -> Option<Self>;
}

/// Name/value table of one enum
#[derive(Debug, Clone)]
pub struct EnumInfo {
    name: String,
    identity: Option<TypeIdentity>,
    names: Vec<String>,
    values: Vec<i64>,
    by_name: HashMap<String, i64>,
    /// Index of the first enumerator holding each value
    by_value: HashMap<i64, usize>,
}

impl EnumInfo {
    fn build(name: &str, identity: Option<TypeIdentity>, names: Vec<String>, values: Vec<i64>) -> Self {
        let mut by_name = HashMap::with_capacity(names.len());
        let mut by_value = HashMap::with_capacity(values.len());
        for (index, (n, &v)) in names.iter().zip(&values).enumerate() {
            by_name.insert(n.clone(), v);
            by_value.entry(v).or_insert(index);
        }
        Self {
            name: name.to_string(),
            identity,
            names,
            values,
            by_name,
            by_value,
        }
    }

    /// Table from names and their explicit values (`None` where implicit)
    pub fn derive(name: &str, names: &[&str], explicit: &[Option<i64>]) -> Self {
        let slots: Vec<Option<i64>> = (0..names.len())
            .map(|i| explicit.get(i).copied().flatten())
            .collect();
        Self::build(
            name,
            None,
            names.iter().map(|n| n.to_string()).collect(),
            declaration::derive_values(&slots),
        )
    }

    /// Table from declaration text and two evaluations of it (see
    /// [`declaration::classify`])
    pub fn from_passes(name: &str, text: &str, normal: &[i64], prefilled: &[i64]) -> MirrorResult<Self> {
        let names = declaration::names(text);
        if names.len() != normal.len() || names.len() != prefilled.len() {
            return Err(MirrorError::InvalidDeclaration {
                enum_name: name.to_string(),
                reason: format!(
                    "{} names but {}/{} evaluated values",
                    names.len(),
                    normal.len(),
                    prefilled.len()
                ),
            });
        }
        Ok(Self::derive(name, &names, &declaration::classify(normal, prefilled)))
    }

    /// Table parsed from declaration text (`Name`, `Name = literal`,
    /// `Name = EarlierName`)
    pub fn parse(name: &str, text: &str) -> MirrorResult<Self> {
        let parsed = declaration::parse(name, text)?;
        let explicit: Vec<Option<i64>> = parsed.iter().map(|e| e.explicit).collect();
        let names: Vec<String> = parsed.into_iter().map(|e| e.name).collect();
        Ok(Self::build(name, None, names, declaration::derive_values(&explicit)))
    }

    fn of_type<E: ReflectEnum>() -> Self {
        let mut info = Self::derive(E::NAME, E::NAMES, E::EXPLICIT);
        info.identity = Some(TypeIdentity::of::<E>());
        info
    }

    fn miss(&self, value: String) -> MirrorError {
        MirrorError::InvalidEnumConversion {
            enum_name: self.name.clone(),
            value,
        }
    }

    /// Enum name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native type, for tables built from a Rust enum
    pub fn identity(&self) -> Option<TypeIdentity> {
        self.identity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names in declaration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values in declaration order
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// `(name, value)` pairs in declaration order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    /// Name of `value`; the first enumerator wins when several share it
    pub fn to_string(&self, value: i64) -> MirrorResult<&str> {
        self.get_string(value).ok_or_else(|| self.miss(value.to_string()))
    }

    pub fn get_string(&self, value: i64) -> Option<&str> {
        self.by_value.get(&value).map(|&i| self.names[i].as_str())
    }

    /// Value of the enumerator called `name`
    pub fn to_value(&self, name: &str) -> MirrorResult<i64> {
        self.get_value(name).ok_or_else(|| self.miss(format!("'{name}'")))
    }

    pub fn get_value(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }

    /// Whether `name` is an enumerator
    pub fn is_value(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}

/// Tables of Rust enums, keyed by type
static ENUMS: LazyLock<DashMap<TypeIdentity, Arc<EnumInfo>>> = LazyLock::new(DashMap::new);

/// Tables declared at runtime, keyed by name
static DECLARED: LazyLock<DashMap<String, Arc<EnumInfo>>> = LazyLock::new(DashMap::new);

/// Table of `E`, built on first use
pub fn of<E: ReflectEnum>() -> Arc<EnumInfo> {
    ENUMS
        .entry(TypeIdentity::of::<E>())
        .or_insert_with(|| {
            let info = EnumInfo::of_type::<E>();
            debug!("Registered enum {} ({} values)", info.name(), info.len());
            Arc::new(info)
        })
        .value()
        .clone()
}

/// Table registered for a native type
pub fn find(identity: TypeIdentity) -> Option<Arc<EnumInfo>> {
    ENUMS.get(&identity).map(|entry| entry.value().clone())
}

/// Parse `text` and register the table under `name`, replacing any earlier
/// declaration of that name
pub fn declare(name: &str, text: &str) -> MirrorResult<Arc<EnumInfo>> {
    let info = Arc::new(EnumInfo::parse(name, text)?);
    DECLARED.insert(name.to_string(), info.clone());
    debug!("Declared enum {} ({} values)", name, info.len());
    Ok(info)
}

/// Table declared at runtime under `name`
pub fn find_declared(name: &str) -> Option<Arc<EnumInfo>> {
    DECLARED.get(name).map(|entry| entry.value().clone())
}

pub(crate) fn clear() {
    ENUMS.clear();
    DECLARED.clear();
}

/// Typed view of the table of `E`
pub struct Enum<E>(PhantomData<fn() -> E>);

impl<E: ReflectEnum> Enum<E> {
    pub fn info() -> Arc<EnumInfo> {
        of::<E>()
    }

    pub fn name() -> &'static str {
        E::NAME
    }

    fn miss(value: String) -> MirrorError {
        MirrorError::InvalidEnumConversion {
            enum_name: E::NAME.to_string(),
            value,
        }
    }

    /// Name of `value`
    pub fn to_string(value: &E) -> MirrorResult<&'static str> {
        Self::get_string(value).ok_or_else(|| Self::miss(value.to_i64().to_string()))
    }

    pub fn get_string(value: &E) -> Option<&'static str> {
        let info = of::<E>();
        let index = *info.by_value.get(&value.to_i64())?;
        E::NAMES.get(index).copied()
    }

    /// Enumerator called `name`
    pub fn to_value(name: &str) -> MirrorResult<E> {
        Self::get_value(name).ok_or_else(|| Self::miss(format!("'{name}'")))
    }

    pub fn get_value(name: &str) -> Option<E> {
        of::<E>().get_value(name).and_then(E::from_i64)
    }

    pub fn is_value(name: &str) -> bool {
        of::<E>().is_value(name)
    }

    pub fn names() -> &'static [&'static str] {
        E::NAMES
    }

    /// Enumerators in declaration order
    pub fn values() -> Vec<E> {
        of::<E>().values().iter().filter_map(|&v| E::from_i64(v)).collect()
    }

    pub fn len() -> usize {
        E::NAMES.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Letter {
        A,
        B = 5,
        C,
    }

    impl ReflectEnum for Letter {
        const NAME: &'static str = "Letter";
        const DECLARATION: &'static str = "A, B = 5, C";
        const NAMES: &'static [&'static str] = &["A", "B", "C"];
        const EXPLICIT: &'static [Option<i64>] = &[None, Some(5), None];

        fn to_i64(&self) -> i64 {
            *self as i64
        }

        fn from_i64(value: i64) -> Option<Self> {
            match value {
                0 => Some(Self::A),
                5 => Some(Self::B),
                6 => Some(Self::C),
                _ => None,
            }
        }
    }

    #[test]
    fn test_parsed_table() {
        let info = EnumInfo::parse("Letter", "A, B = 5, C").unwrap();
        assert_eq!(info.values(), &[0, 5, 6]);
        assert_eq!(info.to_string(6).unwrap(), "C");
        assert_eq!(info.to_value("B").unwrap(), 5);
        assert!(info.get_value("Z").is_none());
        assert!(matches!(
            info.to_value("Z"),
            Err(MirrorError::InvalidEnumConversion { .. })
        ));
        assert!(info.to_string(1).is_err());
        assert_eq!(info.len(), 3);
    }

    #[test]
    fn test_aliases_keep_first_name() {
        let info = EnumInfo::parse("Level", "Low, Default = Low, High").unwrap();
        assert_eq!(info.values(), &[0, 0, 1]);
        assert_eq!(info.get_string(0), Some("Low"));
        assert_eq!(info.get_value("Default"), Some(0));
    }

    #[test]
    fn test_pairs_in_order() {
        let info = EnumInfo::parse("Dir", "North = 1, East, South = 10, West").unwrap();
        let pairs: Vec<_> = info.pairs().collect();
        assert_eq!(pairs, vec![("North", 1), ("East", 2), ("South", 10), ("West", 11)]);
    }

    #[test]
    fn test_from_passes() {
        let info = EnumInfo::from_passes("Letter", "A, B = 5, C", &[3, 5, 9], &[!3, 5, !9]).unwrap();
        assert_eq!(info.values(), &[0, 5, 6]);
        assert!(EnumInfo::from_passes("Letter", "A, B", &[1], &[1]).is_err());
    }

    #[test]
    fn test_typed_view() {
        assert_eq!(Enum::<Letter>::to_string(&Letter::C).unwrap(), "C");
        assert_eq!(Enum::<Letter>::to_value("B").unwrap(), Letter::B);
        assert_eq!(Enum::<Letter>::get_value("Z"), None);
        assert_eq!(Enum::<Letter>::values(), vec![Letter::A, Letter::B, Letter::C]);
        assert!(Enum::<Letter>::is_value("A"));

        let info = of::<Letter>();
        assert_eq!(info.identity(), Some(TypeIdentity::of::<Letter>()));
        assert!(Arc::ptr_eq(&info, &find(TypeIdentity::of::<Letter>()).unwrap()));
    }

    #[test]
    fn test_runtime_declaration() {
        let info = declare("enums::Runtime", "Zero, Two = 2").unwrap();
        assert_eq!(info.values(), &[0, 2]);
        let found = find_declared("enums::Runtime").unwrap();
        assert_eq!(found.to_string(2).unwrap(), "Two");
        assert!(declare("enums::Broken", "A = ?").is_err());
    }
}
