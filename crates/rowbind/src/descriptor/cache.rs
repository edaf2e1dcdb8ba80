//! Process-wide descriptor memo.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use super::{Record, TypeDescriptor};

type Entry = Arc<dyn Any + Send + Sync>;

static DESCRIPTORS: LazyLock<RwLock<HashMap<TypeId, Entry>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Descriptor of `T`, built on first use and shared afterwards.
///
/// Concurrent first calls may each run [`Record::describe`]; the first one
/// to register wins and every caller gets that instance.
#[must_use]
pub fn describe<T: Record>() -> Arc<TypeDescriptor<T>> {
    if let Some(found) = lookup::<T>() {
        return found;
    }

    let fresh = Arc::new(T::describe());
    let mut map = DESCRIPTORS.write();
    let entry = map.entry(TypeId::of::<T>()).or_insert_with(|| {
        tracing::debug!(
            descriptor.type_name = fresh.type_name(),
            descriptor.properties = fresh.properties().len(),
            descriptor.constructor_params = fresh.constructor().map_or(0, |c| c.params().len()),
            "described record type"
        );
        Arc::clone(&fresh) as Entry
    });

    Arc::clone(entry)
        .downcast::<TypeDescriptor<T>>()
        .unwrap_or(fresh)
}

fn lookup<T: Record>() -> Option<Arc<TypeDescriptor<T>>> {
    let map = DESCRIPTORS.read();
    map.get(&TypeId::of::<T>())
        .cloned()
        .and_then(|entry| entry.downcast::<TypeDescriptor<T>>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertyDescriptor;

    #[derive(Default)]
    struct Sample {
        id: i64,
    }

    impl Record for Sample {
        fn describe() -> TypeDescriptor<Self> {
            TypeDescriptor::builder("Sample")
                .property(PropertyDescriptor::field(
                    "id",
                    |p: &Self| &p.id,
                    |p: &mut Self, v| p.id = v,
                ))
                .default_construct()
                .build()
        }
    }

    struct Empty;

    impl Record for Empty {
        fn describe() -> TypeDescriptor<Self> {
            TypeDescriptor::builder("Empty").build()
        }
    }

    #[test]
    fn test_describe_is_memoized() {
        let a = describe::<Sample>();
        let b = describe::<Sample>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.type_name(), "Sample");
    }

    #[test]
    fn test_describe_concurrent_first_use() {
        let all: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(describe::<Empty>)).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(all.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert!(all[0].is_empty());
    }
}
