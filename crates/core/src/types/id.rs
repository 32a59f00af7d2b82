//! Newtype IDs for type-safe entity references.
//!
//! The backend hands out opaque string identifiers (document ids), so every
//! wrapper here holds a `String`. Use the `define_id!` macro to create new
//! wrappers that cannot be mixed up with each other.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `as_str()`, `Display`, `From<String>` and `From<&str>`
///
/// # Example
///
/// ```rust
/// # use eyewear_core::define_id;
/// define_id!(FrameId);
/// define_id!(LensId);
///
/// let frame = FrameId::new("65a1");
/// assert_eq!(frame.as_str(), "65a1");
///
/// // These are different types, so this won't compile:
/// // let _: LensId = frame;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(AccessoryId);
define_id!(CategoryId);
define_id!(ReviewId);
define_id!(OrderId);
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_transparently() {
        let id = ProductId::new("65f0c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"65f0c1\"");

        let parsed: ProductId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(parsed.as_str(), "abc");
    }

    #[test]
    fn test_id_display() {
        assert_eq!(OrderId::from("ord_1").to_string(), "ord_1");
    }
}
