//! Modelos del sistema
//!
//! Este módulo contiene los modelos de dominio. Los enums se guardan como
//! TEXT en PostgreSQL y se convierten una sola vez al leer la fila.

/// Genera `as_str`, `FromStr` y `Display` para enums guardados como texto
macro_rules! text_enum {
    ($name:ident, $error:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("{} '{}'", $error, other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod auth;
pub mod payment;
pub mod ride;
pub mod user;
