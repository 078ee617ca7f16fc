/// Declare a record kind: a unit type implementing `RecordKind` plus an enum
/// naming each of its attributes.
///
/// ```rust
/// use store_object::record_kind;
/// use store_object::record::{Record, RecordKind};
/// use type_mapping::FieldType;
///
/// record_kind! {
///     pub struct Session: SessionField {
///         Id("id", FieldType::Text) [not_null];
///         Lifetime("lifetime", FieldType::Integer);
///         SetCookie("set_cookie", FieldType::Boolean) [not_null, has_default] = false;
///     }
/// }
///
/// let session = Record::<Session>::new();
/// assert_eq!(Session::schema().len(), 3);
/// assert!(session.is_empty());
/// ```
///
/// Flags in brackets map onto `AttributeDef` builder methods. Conversion
/// hooks go in a trailing `impl { ... }` block. Re-declaring a name is a
/// no-op: the later variant refers to the first declaration.
#[macro_export]
macro_rules! record_kind {
    (
        $(#[$meta:meta])*
        $vis:vis struct $kind:ident : $field:ident {
            $(
                $variant:ident ($name:literal, $ty:expr)
                    $([$($flag:ident),* $(,)?])?
                    $(= $default:expr)?;
            )*
        }
        $(impl { $($hooks:tt)* })?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $kind;

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $field {
            $($variant,)*
        }

        impl $crate::record::FieldId for $field {
            fn index(self) -> usize {
                // Slot in the built schema; a re-declared name shares the
                // slot of its first declaration
                static SLOTS: ::std::sync::LazyLock<::std::vec::Vec<usize>> =
                    ::std::sync::LazyLock::new(|| {
                        let schema = <$kind as $crate::record::RecordKind>::schema();
                        let names: &[&str] = &[$($name),*];
                        names
                            .iter()
                            .filter_map(|name| schema.position(name))
                            .collect()
                    });
                SLOTS[self as usize]
            }

            fn name(self) -> &'static str {
                match self {
                    $($field::$variant => $name,)*
                }
            }
        }

        impl $crate::record::RecordKind for $kind {
            type Field = $field;

            fn schema() -> &'static $crate::record::Schema {
                static SCHEMA: ::std::sync::LazyLock<$crate::record::Schema> =
                    ::std::sync::LazyLock::new(|| {
                        let mut schema = $crate::record::Schema::new();
                        $(
                            schema.declare(
                                $crate::record::AttributeDef::new($name, $ty)
                                    $($(.$flag())*)?
                                    $(.with_default($default))?
                            );
                        )*
                        schema
                    });
                &SCHEMA
            }

            $($($hooks)*)?
        }
    };
}
