//! Intermediate representations of translation data.

pub mod nkv;
pub mod translation;

pub use nkv::{
    NestedKeyValue,
    NkvError,
};
pub use translation::{
    LocaleTranslations,
    PartialTranslation,
};
