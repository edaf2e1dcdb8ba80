//! The [`Record`] trait and the [`record!`](crate::record) macro.

use super::TypeDescriptor;

/// A type that can be mapped to and from rows.
///
/// Implement by hand with [`TypeDescriptor::builder`] or declare the type
/// through [`record!`](crate::record).
pub trait Record: Send + Sync + Sized + 'static {
    /// Describe the type. Called once per process; see
    /// [`describe`](crate::descriptor::describe).
    fn describe() -> TypeDescriptor<Self>;
}

/// Declare a plain struct together with its [`Record`] implementation.
///
/// Every field becomes a property and a parameter of an all-fields
/// constructor. A field may name its column with `=> "Column"`.
///
/// ```rust
/// rowbind::record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct User {
///         pub id: i32 => "Id",
///         pub name: String => "Name",
///         pub tag: Option<String>,
///     }
/// }
///
/// let d = rowbind::descriptor::describe::<User>();
/// assert_eq!(d.properties().len(), 3);
/// assert_eq!(d.property("id").unwrap().mapped_name(), "Id");
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty $(=> $column:literal)? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $fty, )*
        }

        impl $crate::Record for $name {
            fn describe() -> $crate::TypeDescriptor<Self> {
                $crate::TypeDescriptor::builder(stringify!($name))
                    $(
                        .property(
                            $crate::PropertyDescriptor::field(
                                stringify!($field),
                                |record: &Self| &record.$field,
                                |record: &mut Self, value: $fty| record.$field = value,
                            )
                            $(.mapped_as($column))?
                        )
                    )*
                    .constructor(
                        vec![ $( $crate::ParamDescriptor::of::<$fty>(stringify!($field)) ),* ],
                        |args: ::std::vec::Vec<$crate::DbValue>| -> $crate::Result<Self> {
                            #[allow(unused_mut, unused_variables)]
                            let mut args = args.into_iter();
                            Ok(Self {
                                $(
                                    $field: <$fty as $crate::FieldValue>::from_db(
                                        args.next().unwrap_or_default(),
                                    )
                                    .map_err(|e| e.in_column(stringify!($field)))?,
                                )*
                            })
                        },
                    )
                    .build()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::descriptor::describe;
    use crate::{DbValue, Record};

    crate::record! {
        #[derive(Debug, Default, PartialEq)]
        struct Account {
            id: i64 => "AccountId",
            owner: String,
            balance: Option<f64>,
        }
    }

    #[test]
    fn test_record_properties() {
        let d = Account::describe();
        assert_eq!(d.type_name(), "Account");
        let names: Vec<_> = d.properties().iter().map(|p| p.mapped_name()).collect();
        assert_eq!(names, vec!["AccountId", "owner", "balance"]);
    }

    #[test]
    fn test_record_constructor() {
        let d = describe::<Account>();
        let ctor = d.constructor().unwrap();
        assert_eq!(ctor.params()[0].mapped_name(), "AccountId");

        let args = vec![DbValue::I64(7), DbValue::from("Ada"), DbValue::Null];
        let built = (ctor.build_fn())(args).unwrap();
        assert_eq!(
            built,
            Account {
                id: 7,
                owner: "Ada".into(),
                balance: None,
            }
        );
    }

    #[test]
    fn test_record_constructor_missing_args_default() {
        let d = describe::<Account>();
        let built = (d.constructor().unwrap().build_fn())(Vec::new()).unwrap();
        assert_eq!(built, Account::default());
    }

    #[test]
    fn test_record_constructor_names_bad_field() {
        let d = describe::<Account>();
        let err = (d.constructor().unwrap().build_fn())(vec![DbValue::from("x")]).unwrap_err();
        assert!(err.is_value_conversion());
        assert!(err.to_string().contains("'id'"));
    }
}
