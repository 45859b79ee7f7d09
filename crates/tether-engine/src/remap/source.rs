//! TOML remap sources
//!
//! ```toml
//! [[remap]]
//! owner = "Point"
//! kind = "method"
//! name = "getX"
//! type = "int"
//! rename = "getXCoord"
//! from = "1.0"
//! to = "2.0"
//!
//! [[class]]
//! name = "geo.Point"
//! rename = "geo.shape.Point"
//! from = "2.0"
//! to = "3.0"
//! ```
//!
//! Type strings use the template type syntax (`int`, `List<String>`,
//! `geo.Point[]`).

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::signature::{MemberKind, MemberSignature, TypeRef};
use crate::template::parse_type;
use crate::version::{VersionRange, VersionTag};

use super::table::{ClassRemap, RemapEntry, RemapError};

/// Errors that can occur while loading a remap source
#[derive(Debug, Error)]
pub enum RemapSourceError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parse error
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid entry
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Entry rejected by the table rules
    #[error(transparent)]
    Remap(#[from] RemapError),
}

#[derive(Debug, Deserialize)]
struct RemapFile {
    #[serde(default)]
    remap: Vec<RemapSource>,
    #[serde(default)]
    class: Vec<ClassSource>,
}

/// Entries read from one remap source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapDocument {
    /// Member renames (`[[remap]]`)
    pub entries: Vec<RemapEntry>,
    /// Class path renames (`[[class]]`)
    pub classes: Vec<ClassRemap>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassSource {
    name: String,
    rename: String,
    from: VersionTag,
    to: VersionTag,
}

impl ClassSource {
    fn into_entry(self, index: usize) -> Result<ClassRemap, RemapSourceError> {
        let invalid = |msg: String| RemapSourceError::ValidationError(format!("class #{}: {}", index, msg));
        let range = VersionRange::new(self.from, self.to).map_err(|e| invalid(e.to_string()))?;
        if self.name == self.rename {
            return Err(invalid("entry does not change the class path".to_string()));
        }
        Ok(ClassRemap::new(&self.name, &self.rename, range))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SourceKind {
    Field,
    Method,
    Constructor,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemapSource {
    owner: String,
    kind: SourceKind,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    params: Vec<String>,
    #[serde(rename = "type", default)]
    member_type: Option<String>,
    #[serde(default)]
    rename: Option<String>,
    #[serde(default)]
    to_params: Option<Vec<String>>,
    #[serde(default)]
    to_type: Option<String>,
    from: VersionTag,
    to: VersionTag,
}

impl RemapSource {
    fn into_entry(self, index: usize) -> Result<RemapEntry, RemapSourceError> {
        let invalid = |msg: &str| RemapSourceError::ValidationError(format!("remap #{}: {}", index, msg));
        let parse = |text: &str| parse_type(text).map_err(|e| invalid(&format!("type '{}': {}", text, e)));
        let parse_all = |texts: &[String]| texts.iter().map(|t| parse(t.as_str())).collect::<Result<Vec<_>, _>>();

        let range = VersionRange::new(self.from.clone(), self.to.clone()).map_err(|e| invalid(&e.to_string()))?;

        let kind = match self.kind {
            SourceKind::Field => MemberKind::Field,
            SourceKind::Method => MemberKind::Method,
            SourceKind::Constructor => MemberKind::Constructor,
        };

        let build = |name: Option<&str>, params: Vec<TypeRef>, ty: Option<TypeRef>| -> Result<MemberSignature, RemapSourceError> {
            match kind {
                MemberKind::Field => {
                    if !params.is_empty() {
                        return Err(invalid("fields take no parameters"));
                    }
                    let name = name.ok_or_else(|| invalid("missing 'name'"))?;
                    let ty = ty.ok_or_else(|| invalid("fields need a 'type'"))?;
                    Ok(MemberSignature::field(name, ty))
                }
                MemberKind::Method => {
                    let name = name.ok_or_else(|| invalid("missing 'name'"))?;
                    Ok(MemberSignature::method(name, params, ty.unwrap_or_else(TypeRef::void)))
                }
                MemberKind::Constructor => Ok(MemberSignature::constructor(TypeRef::named(&self.owner), params)),
            }
        };

        let from_params = parse_all(&self.params)?;
        let from_type = self.member_type.as_deref().map(parse).transpose()?;
        let from = build(self.name.as_deref(), from_params.clone(), from_type.clone())?;

        let to_name = self.rename.as_deref().or(self.name.as_deref());
        let to_params = match &self.to_params {
            Some(params) => parse_all(params)?,
            None => from_params,
        };
        let to_type = match self.to_type.as_deref() {
            Some(text) => Some(parse(text)?),
            None => from_type,
        };
        let to_signature = build(to_name, to_params, to_type)?;

        if from == to_signature {
            return Err(invalid("entry does not change the member"));
        }
        Ok(RemapEntry::new(&self.owner, from, to_signature, range))
    }
}

/// Parse remap entries from TOML text
pub fn load_toml_str(text: &str) -> Result<RemapDocument, RemapSourceError> {
    let file: RemapFile = toml::from_str(text)?;
    let entries = file
        .remap
        .into_iter()
        .enumerate()
        .map(|(i, source)| source.into_entry(i))
        .collect::<Result<Vec<_>, _>>()?;
    let classes = file
        .class
        .into_iter()
        .enumerate()
        .map(|(i, source)| source.into_entry(i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RemapDocument { entries, classes })
}

/// Parse remap entries from a TOML file
pub fn load_file(path: &Path) -> Result<RemapDocument, RemapSourceError> {
    let content = std::fs::read_to_string(path)?;
    load_toml_str(&content)
}
