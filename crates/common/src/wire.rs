//! Enums with a stable wire name per variant.

/// Declares a fieldless enum whose variants map to fixed strings.
///
/// Generates serde (de)serialization by wire name, `as_str`, `Display`,
/// `FromStr` and an `ALL` slice. The calling crate must depend on `serde`.
///
/// ```ignore
/// wire_enum! {
///     pub enum Priority: "priority" {
///         Low => "LOW",
///         High => "HIGH",
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $what:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err($crate::ParseEnumError::new($what, s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    wire_enum! {
        #[derive(Default)]
        enum Light: "light" {
            #[default]
            Red => "RED",
            Green => "GREEN",
        }
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(Light::default(), Light::Red);
        assert_eq!(Light::Green.to_string(), "GREEN");
        assert_eq!("RED".parse::<Light>(), Ok(Light::Red));
        assert_eq!(Light::ALL.len(), 2);

        let err = "BLUE".parse::<Light>().unwrap_err();
        assert_eq!(err.to_string(), "unknown light: BLUE");
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Light::Green).unwrap(), "\"GREEN\"");
        let light: Light = serde_json::from_str("\"RED\"").unwrap();
        assert_eq!(light, Light::Red);
    }
}
