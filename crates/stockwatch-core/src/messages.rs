//! Localizable validation messages.
//!
//! Templates are looked up by `(entity, field, constraint)`. A catalog entry may use
//! `*` for the entity or the field to act as a fallback for every entity or field.
//! Templates may reference `{entity}`, `{field}` and `{min}`.
//!
//! One catalog is active per process. It is installed once at start-up through
//! [`install`] or [`install_locale`]. A message rendered before that fixes the
//! English catalog for the rest of the process.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Constraint, Entity};

const WILDCARD: &str = "*";

/// Supported message locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    De,
}

impl Locale {
    pub const ALL: [Self; 2] = [Self::En, Self::De];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = CatalogError;

    /// Accepts bare language codes as well as tags such as `de_DE.UTF-8` or `en-US`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let language = value
            .trim()
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "en" => Ok(Self::En),
            "de" => Ok(Self::De),
            _ => Err(CatalogError::UnknownLocale {
                value: value.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown locale '{value}', expected one of en, de")]
    UnknownLocale { value: String },

    #[error("message catalog '{installed}' is already installed, cannot switch to '{requested}'")]
    AlreadyInstalled { installed: Locale, requested: Locale },
}

/// Identity of a message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey {
    pub entity: Entity,
    pub field: &'static str,
    pub constraint: Constraint,
}

impl MessageKey {
    pub const fn new(entity: Entity, field: &'static str, constraint: Constraint) -> Self {
        Self {
            entity,
            field,
            constraint,
        }
    }
}

impl Display for MessageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.entity,
            self.field,
            self.constraint.as_str()
        )
    }
}

/// Source of message templates for one locale.
pub trait MessageCatalog: Send + Sync {
    fn locale(&self) -> Locale;

    /// Template for the key, most specific entry first.
    fn template(&self, entity: Entity, field: &str, constraint: &str) -> Option<&'static str>;
}

/// Catalog backed by a static table of `(entity, field, constraint, template)` rows.
#[derive(Debug)]
pub struct TableCatalog {
    locale: Locale,
    entries: &'static [(&'static str, &'static str, &'static str, &'static str)],
}

impl TableCatalog {
    pub const fn new(
        locale: Locale,
        entries: &'static [(&'static str, &'static str, &'static str, &'static str)],
    ) -> Self {
        Self { locale, entries }
    }

    fn find(&self, entity: &str, field: &str, constraint: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(e, f, c, _)| *e == entity && *f == field && *c == constraint)
            .map(|(_, _, _, template)| *template)
    }
}

impl MessageCatalog for TableCatalog {
    fn locale(&self) -> Locale {
        self.locale
    }

    fn template(&self, entity: Entity, field: &str, constraint: &str) -> Option<&'static str> {
        let entity = entity.as_str();
        self.find(entity, field, constraint)
            .or_else(|| self.find(entity, WILDCARD, constraint))
            .or_else(|| self.find(WILDCARD, WILDCARD, constraint))
    }
}

pub static ENGLISH: TableCatalog = TableCatalog::new(
    Locale::En,
    &[
        (
            "statistic",
            "sectorAndIgDefined",
            "mutuallyExclusive",
            "A statistic can be defined either for a sector or for an industry group, not for both.",
        ),
        (
            "priceAlert",
            "symbol",
            "required",
            "Please enter the symbol of the instrument to watch.",
        ),
        ("*", "*", "required", "The field '{field}' of {entity} is required."),
        ("*", "*", "min", "The field '{field}' of {entity} must be at least {min}."),
        ("*", "*", "positive", "The field '{field}' of {entity} must be greater than zero."),
        ("*", "*", "nonNegative", "The field '{field}' of {entity} must not be negative."),
        (
            "*",
            "*",
            "mutuallyExclusive",
            "The fields named by '{field}' of {entity} must not be set together.",
        ),
    ],
);

pub static GERMAN: TableCatalog = TableCatalog::new(
    Locale::De,
    &[
        (
            "statistic",
            "sectorAndIgDefined",
            "mutuallyExclusive",
            "Eine Statistik kann entweder für eine Branche oder für eine Industriegruppe definiert werden, nicht für beide.",
        ),
        (
            "priceAlert",
            "symbol",
            "required",
            "Bitte geben Sie das Symbol des zu beobachtenden Instruments an.",
        ),
        ("*", "*", "required", "Das Attribut '{field}' von {entity} ist ein Pflichtfeld."),
        ("*", "*", "min", "Das Attribut '{field}' von {entity} muss mindestens {min} sein."),
        ("*", "*", "positive", "Das Attribut '{field}' von {entity} muss größer als null sein."),
        ("*", "*", "nonNegative", "Das Attribut '{field}' von {entity} darf nicht negativ sein."),
        (
            "*",
            "*",
            "mutuallyExclusive",
            "Die Attribute '{field}' von {entity} dürfen nicht gemeinsam gesetzt sein.",
        ),
    ],
);

static ACTIVE: OnceLock<&'static dyn MessageCatalog> = OnceLock::new();

pub fn catalog_for(locale: Locale) -> &'static dyn MessageCatalog {
    match locale {
        Locale::En => &ENGLISH,
        Locale::De => &GERMAN,
    }
}

/// Installs the process-wide catalog.
///
/// Installing a catalog for the locale that is already active is a no-op.
pub fn install(catalog: &'static dyn MessageCatalog) -> Result<(), CatalogError> {
    let installed = *ACTIVE.get_or_init(|| catalog);
    if installed.locale() == catalog.locale() {
        Ok(())
    } else {
        Err(CatalogError::AlreadyInstalled {
            installed: installed.locale(),
            requested: catalog.locale(),
        })
    }
}

pub fn install_locale(locale: Locale) -> Result<(), CatalogError> {
    install(catalog_for(locale))
}

/// The process-wide catalog. The first lookup fixes English if nothing was installed.
pub fn active() -> &'static dyn MessageCatalog {
    *ACTIVE.get_or_init(|| catalog_for(Locale::En))
}

/// Renders the message for a violated constraint.
///
/// Falls back to the key itself when the catalog has no template, so a missing
/// translation never hides which rule failed.
pub fn render(
    catalog: &dyn MessageCatalog,
    entity: Entity,
    field: &'static str,
    constraint: Constraint,
) -> String {
    let Some(template) = catalog.template(entity, field, constraint.as_str()) else {
        return MessageKey::new(entity, field, constraint).to_string();
    };

    let mut message = template
        .replace("{entity}", entity.as_str())
        .replace("{field}", field);
    if let Constraint::Min(min) = constraint {
        message = message.replace("{min}", &min.to_string());
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    static EMPTY: TableCatalog = TableCatalog::new(Locale::En, &[]);

    #[test]
    fn specific_entry_wins_over_wildcard() {
        let template = ENGLISH
            .template(Entity::Statistic, "sectorAndIgDefined", "mutuallyExclusive")
            .expect("template");
        assert!(template.starts_with("A statistic can be defined"));
    }

    #[test]
    fn renders_min_parameter() {
        let message = render(&ENGLISH, Entity::PriceAlert, "id", Constraint::Min(1));
        assert_eq!(message, "The field 'id' of priceAlert must be at least 1.");
    }

    #[test]
    fn renders_german_templates() {
        let message = render(&GERMAN, Entity::PriceAlert, "price", Constraint::Positive);
        assert_eq!(
            message,
            "Das Attribut 'price' von priceAlert muss größer als null sein."
        );
    }

    #[test]
    fn missing_template_falls_back_to_key() {
        let message = render(&EMPTY, Entity::HorizontalLine, "price", Constraint::Positive);
        assert_eq!(message, "horizontalLine.price.positive");
    }

    #[test]
    fn parses_locale_tags() {
        assert_eq!("de_DE.UTF-8".parse::<Locale>(), Ok(Locale::De));
        assert_eq!("EN-us".parse::<Locale>(), Ok(Locale::En));
        assert!(matches!(
            "fr".parse::<Locale>(),
            Err(CatalogError::UnknownLocale { .. })
        ));
    }

    #[test]
    fn catalog_cannot_be_switched_once_installed() {
        install_locale(Locale::En).expect("english is the default");
        assert!(install_locale(Locale::En).is_ok());
        assert!(matches!(
            install_locale(Locale::De),
            Err(CatalogError::AlreadyInstalled {
                installed: Locale::En,
                requested: Locale::De
            })
        ));
        assert_eq!(active().locale(), Locale::En);
    }

    #[test]
    fn first_lookup_fixes_the_catalog() {
        let before = active().locale();
        assert_eq!(before, Locale::En);
        assert!(matches!(
            install_locale(Locale::De),
            Err(CatalogError::AlreadyInstalled { .. })
        ));
        assert_eq!(active().locale(), before);
    }
}
