//! Value interception hooks.
//!
//! A [`PropertyHandler`] transforms a single value on its way into a record
//! (`get`) or into a statement parameter (`set`). A [`ClassHandler`] sees the
//! whole instance. Exactly one property handler (or none) runs per value per
//! direction; handlers never chain.
//!
//! Resolution order for a property:
//!
//! 1. a binding for that property in the [`HandlerRegistry`],
//! 2. a handler attached to the property's descriptor,
//! 3. a type-wide binding for the property's declared Rust type,
//! 4. none (pass-through).

mod registry;

pub use registry::HandlerRegistry;

use std::fmt;

use crate::Result;
use crate::types::DbValue;

/// Direction of the value transfer a handler takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Row to record.
    Read,
    /// Record to parameter.
    Write,
}

/// What a handler is being invoked for.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    /// Column or parameter name the value comes from or goes to.
    pub field: &'a str,
    pub declaring_type: &'a str,
    /// Property name; empty for class handlers.
    pub property: &'a str,
    pub phase: Phase,
}

/// Per-value hook.
///
/// On read, `get` receives the cell after coercion (or [`DbValue::Null`]) and
/// returns the value handed to the property. On write, `set` receives the
/// property value and returns the parameter value; coercion is skipped for
/// handled properties.
pub trait PropertyHandler: Send + Sync {
    fn get(&self, value: DbValue, ctx: &HandlerContext<'_>) -> Result<DbValue>;

    fn set(&self, value: DbValue, ctx: &HandlerContext<'_>) -> Result<DbValue>;
}

/// Per-instance hook.
pub trait ClassHandler<T>: Send + Sync {
    /// Called with every finished instance. Returning `None` is treated as a
    /// programming error and fails the row with a null-hook-result error.
    fn get(&self, instance: T, ctx: &HandlerContext<'_>) -> Result<Option<T>>;

    /// Called with every instance before its values are extracted for a
    /// statement. An error aborts the batch before the sink is touched.
    fn set(&self, instance: &T, ctx: &HandlerContext<'_>) -> Result<()> {
        let _ = (instance, ctx);
        Ok(())
    }
}

/// A [`PropertyHandler`] built from two closures.
pub struct FnHandler<G, S> {
    get: G,
    set: S,
}

impl<G, S> FnHandler<G, S>
where
    G: Fn(DbValue) -> Result<DbValue> + Send + Sync,
    S: Fn(DbValue) -> Result<DbValue> + Send + Sync,
{
    pub const fn new(get: G, set: S) -> Self {
        Self { get, set }
    }
}

impl<G, S> fmt::Debug for FnHandler<G, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<G, S> PropertyHandler for FnHandler<G, S>
where
    G: Fn(DbValue) -> Result<DbValue> + Send + Sync,
    S: Fn(DbValue) -> Result<DbValue> + Send + Sync,
{
    fn get(&self, value: DbValue, _ctx: &HandlerContext<'_>) -> Result<DbValue> {
        (self.get)(value)
    }

    fn set(&self, value: DbValue, _ctx: &HandlerContext<'_>) -> Result<DbValue> {
        (self.set)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl PropertyHandler for Upper {
        fn get(&self, value: DbValue, _ctx: &HandlerContext<'_>) -> Result<DbValue> {
            Ok(match value {
                DbValue::String(s) => DbValue::String(s.to_uppercase()),
                other => other,
            })
        }

        fn set(&self, value: DbValue, _ctx: &HandlerContext<'_>) -> Result<DbValue> {
            Ok(match value {
                DbValue::String(s) => DbValue::String(s.to_lowercase()),
                other => other,
            })
        }
    }

    fn ctx(phase: Phase) -> HandlerContext<'static> {
        HandlerContext {
            field: "Name",
            declaring_type: "User",
            property: "name",
            phase,
        }
    }

    #[test]
    fn test_property_handler_both_directions() {
        let h = Upper;
        assert_eq!(
            h.get(DbValue::from("ada"), &ctx(Phase::Read)).unwrap(),
            DbValue::from("ADA")
        );
        assert_eq!(
            h.set(DbValue::from("ADA"), &ctx(Phase::Write)).unwrap(),
            DbValue::from("ada")
        );
    }

    #[test]
    fn test_fn_handler() {
        let h = FnHandler::new(
            |v: DbValue| -> Result<DbValue> {
                Ok(if v.is_null() { DbValue::from("n/a") } else { v })
            },
            |v: DbValue| -> Result<DbValue> { Ok(v) },
        );
        assert_eq!(
            h.get(DbValue::Null, &ctx(Phase::Read)).unwrap(),
            DbValue::from("n/a")
        );
        assert_eq!(h.set(DbValue::I32(1), &ctx(Phase::Write)).unwrap(), DbValue::I32(1));
    }

    #[test]
    fn test_default_class_set_accepts() {
        struct Keep;
        impl ClassHandler<i32> for Keep {
            fn get(&self, instance: i32, _ctx: &HandlerContext<'_>) -> Result<Option<i32>> {
                Ok(Some(instance))
            }
        }
        assert!(Keep.set(&1, &ctx(Phase::Write)).is_ok());
        assert_eq!(Keep.get(2, &ctx(Phase::Read)).unwrap(), Some(2));
    }
}
