//! Persona catalog: the immutable, ordered table of personas.
//!
//! Built once at startup from the bundled TOML or a user-supplied file and
//! then shared read-only (`Arc<PersonaCatalog>`). Registration order is the
//! order of `[[personas]]` tables in the file.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::CatalogSettings;
use crate::error::{Error, Result};

use super::types::Persona;

/// Bundled executive catalog.
const BUNDLED_CATALOG: &str = include_str!("../../config/personas.toml");

/// On-disk shape of a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    personas: Vec<Persona>,
}

/// Ordered, validated persona table.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
}

impl PersonaCatalog {
    /// Build a catalog from personas in registration order.
    ///
    /// Fails if the list is empty, an id is blank or repeated, or a
    /// `redirect_target` names a persona outside the catalog.
    pub fn new(personas: Vec<Persona>) -> Result<Self> {
        if personas.is_empty() {
            return Err(Error::catalog_invalid("catalog contains no personas"));
        }

        let mut seen = HashSet::new();
        for persona in &personas {
            if persona.id.trim().is_empty() {
                return Err(Error::catalog_invalid("persona id cannot be empty"));
            }
            if !seen.insert(persona.id.to_lowercase()) {
                return Err(Error::catalog_invalid(format!(
                    "duplicate persona id '{}'",
                    persona.id
                )));
            }
        }

        for persona in &personas {
            if !seen.contains(&persona.redirect_target.to_lowercase()) {
                return Err(Error::catalog_invalid(format!(
                    "persona '{}' redirects to unknown persona '{}'",
                    persona.id, persona.redirect_target
                )));
            }
        }

        Ok(Self { personas })
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(|e| Error::CatalogParse {
            message: e.message().to_string(),
            source: Some(e),
        })?;
        Self::new(file.personas)
    }

    /// Load a catalog from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let catalog = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            personas = catalog.len(),
            "Persona catalog loaded"
        );
        Ok(catalog)
    }

    /// The bundled executive catalog (CEO, CTO, CFO, CMO, COO).
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_CATALOG)
    }

    /// Load the catalog named by the settings, or the bundled one.
    pub fn load(settings: &CatalogSettings) -> Result<Self> {
        match settings.file {
            Some(ref file) => Self::from_file(Path::new(file)),
            None => {
                debug!("Using bundled persona catalog");
                Self::bundled()
            }
        }
    }

    /// Personas in registration order.
    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    /// Look up a persona by id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    /// Look up a persona by id, failing with `PersonaNotFound`.
    pub fn require(&self, id: &str) -> Result<&Persona> {
        self.get(id).ok_or_else(|| Error::PersonaNotFound { id: id.to_string() })
    }

    /// The first-registered persona, used when nothing else matches.
    pub fn default_persona(&self) -> &Persona {
        // `new` guarantees at least one persona
        &self.personas[0]
    }

    /// First persona whose department label contains `name`, case-insensitively.
    pub fn lookup_by_department(&self, name: &str) -> Option<&Persona> {
        let needle = name.to_lowercase();
        self.personas
            .iter()
            .find(|p| p.department.to_lowercase().contains(&needle))
    }

    /// Number of personas.
    pub fn len(&self) -> usize {
        self.personas.len()
    }

    /// Always false for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn persona(id: &str, redirect: &str) -> Persona {
        Persona {
            id: id.to_string(),
            name: format!("{} name", id),
            title: format!("{} title", id),
            department: format!("{} department", id),
            description: String::new(),
            specialties: vec![],
            keywords: vec![],
            forbidden: vec![],
            redirect_target: redirect.to_string(),
        }
    }

    #[test]
    fn test_bundled_catalog_order() {
        let catalog = PersonaCatalog::bundled().unwrap();
        let ids: Vec<&str> = catalog.personas().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["ceo", "cto", "cfo", "cmo", "coo"]);
        assert_eq!(catalog.default_persona().id, "ceo");
    }

    #[test]
    fn test_bundled_keywords() {
        let catalog = PersonaCatalog::bundled().unwrap();
        let ceo = catalog.get("ceo").unwrap();
        assert!(ceo.keywords.iter().any(|k| k == "strategy"));
        let cfo = catalog.get("CFO").unwrap();
        assert!(cfo.keywords.iter().any(|k| k == "revenue"));
        assert_eq!(cfo.name, "Robert Williams");
    }

    #[test]
    fn test_lookup_by_department() {
        let catalog = PersonaCatalog::bundled().unwrap();
        assert_eq!(catalog.lookup_by_department("tech").unwrap().id, "cto");
        assert_eq!(catalog.lookup_by_department("FINANCE").unwrap().id, "cfo");
        assert_eq!(catalog.lookup_by_department("ops"), None);
        assert!(catalog.lookup_by_department("legal").is_none());
    }

    #[test]
    fn test_lookup_by_department_first_match_wins() {
        let catalog = PersonaCatalog::bundled().unwrap();
        // "e" occurs in every department label; Executive is registered first
        assert_eq!(catalog.lookup_by_department("e").unwrap().id, "ceo");
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let err = PersonaCatalog::new(vec![]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CatalogInvalid);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = PersonaCatalog::new(vec![persona("a", "a"), persona("A", "a")]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CatalogInvalid);
    }

    #[test]
    fn test_unknown_redirect_rejected() {
        let err = PersonaCatalog::new(vec![persona("a", "b")]).unwrap_err();
        assert!(err.to_string().contains("unknown persona 'b'"));
    }

    #[test]
    fn test_parse_error() {
        let err = PersonaCatalog::from_toml_str("[[personas]]\nid = 3").unwrap_err();
        assert_eq!(err.code(), ErrorCode::CatalogParse);
    }

    #[test]
    fn test_require_unknown() {
        let catalog = PersonaCatalog::bundled().unwrap();
        let err = catalog.require("cxo").unwrap_err();
        assert_eq!(err.code(), ErrorCode::PersonaNotFound);
    }
}
