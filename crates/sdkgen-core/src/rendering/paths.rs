//! Relative output paths of generated files.

// Internal imports (std, crate)
use std::collections::{BTreeMap, HashMap};

use crate::conventions::LanguageConventions;
use crate::ir::{ClassId, CodeModel, EnumId, NamespaceId, TypeDefinition};
use crate::{Error, Result};

/// What a generated file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileUnit {
    Class(ClassId),
    Enum(EnumId),
    /// `index.ts` or `__init__.py` of a namespace
    Namespace(NamespaceId),
}

/// Every generated file of one language, keyed by relative path
#[derive(Debug, Clone, Default)]
pub struct PathMap {
    files: BTreeMap<String, FileUnit>,
    by_unit: HashMap<FileUnit, String>,
    /// Lowercased path of every file, for case-insensitive collision checks
    lowered: HashMap<String, FileUnit>,
}

impl PathMap {
    pub fn files(&self) -> impl Iterator<Item = (&str, FileUnit)> {
        self.files.iter().map(|(path, unit)| (path.as_str(), *unit))
    }

    pub fn path_of(&self, unit: FileUnit) -> Option<&str> {
        self.by_unit.get(&unit).map(String::as_str)
    }

    /// Path of the file declaring a type, through its outer class when nested
    pub fn definition_path(&self, model: &CodeModel, definition: TypeDefinition) -> Option<&str> {
        let unit = match definition {
            TypeDefinition::Class(id) => FileUnit::Class(model.top_level_class(id)),
            TypeDefinition::Enum(id) => FileUnit::Enum(id),
        };
        self.path_of(unit)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn insert(&mut self, path: String, unit: FileUnit, model: &CodeModel) -> Result<()> {
        let lowered = path.to_lowercase();
        if let Some(existing) = self.lowered.get(&lowered).copied() {
            return Err(Error::PathCollision {
                path: self.path_of(existing).unwrap_or(&path).to_string(),
                first: describe(model, existing),
                second: describe(model, unit),
            });
        }
        self.lowered.insert(lowered, unit);
        self.by_unit.insert(unit, path.clone());
        self.files.insert(path, unit);
        Ok(())
    }
}

fn describe(model: &CodeModel, unit: FileUnit) -> String {
    match unit {
        FileUnit::Class(id) => model.full_name(TypeDefinition::Class(id)),
        FileUnit::Enum(id) => model.full_name(TypeDefinition::Enum(id)),
        FileUnit::Namespace(id) => format!("namespace {}", model.namespace(id).name),
    }
}

/// Directory of a namespace relative to the output root, client prefix stripped
pub fn namespace_directory(
    conventions: &dyn LanguageConventions,
    client_namespace: &str,
    dotted: &str,
) -> String {
    let relative = if dotted == client_namespace {
        ""
    } else {
        dotted
            .strip_prefix(client_namespace)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(dotted)
    };
    relative
        .split('.')
        .filter(|s| !s.is_empty())
        .map(|segment| conventions.directory_name(segment))
        .collect::<Vec<_>>()
        .join("/")
}

fn join(directory: &str, stem: &str, extension: &str) -> String {
    if directory.is_empty() {
        format!("{}.{}", stem, extension)
    } else {
        format!("{}/{}.{}", directory, stem, extension)
    }
}

/// Map every top-level type, and every namespace file when the language has
/// one, to a relative path
pub fn segment(
    model: &CodeModel,
    conventions: &dyn LanguageConventions,
    client_namespace: &str,
) -> Result<PathMap> {
    let extension = conventions.file_extension();
    let reserved = conventions.namespace_file_name();
    // A type named like the namespace file gets a suffixed stem
    let stem_of = |name: &str| {
        let type_name = conventions.type_name(name);
        let stem = conventions.file_name(&type_name);
        match reserved {
            Some(reserved) if stem.eq_ignore_ascii_case(reserved) => {
                conventions.file_name(&format!("{}Escaped", type_name))
            }
            _ => stem,
        }
    };
    let mut map = PathMap::default();
    for (namespace_id, namespace) in model.namespaces() {
        if namespace.name.is_empty() {
            continue;
        }
        let directory = namespace_directory(conventions, client_namespace, &namespace.name);
        if let Some(stem) = conventions.namespace_file_name() {
            map.insert(join(&directory, stem, extension), FileUnit::Namespace(namespace_id), model)?;
        }
        for id in namespace.classes() {
            let stem = stem_of(&model.class(*id).name);
            map.insert(join(&directory, &stem, extension), FileUnit::Class(*id), model)?;
        }
        for id in namespace.enums() {
            let stem = stem_of(&model.enumeration(*id).name);
            map.insert(join(&directory, &stem, extension), FileUnit::Enum(*id), model)?;
        }
    }
    log::trace!("{} files planned for {}", map.len(), conventions.language());
    Ok(map)
}

fn split_file(path: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = path.split('/').collect();
    let file = parts.pop().unwrap_or_default();
    let stem = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file);
    (parts, stem)
}

fn common_prefix(a: &[&str], b: &[&str]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Module specifier of `to` as seen from `from`, for ES imports (`../models/user`)
pub fn relative_module_path(from: &str, to: &str) -> String {
    let (from_dirs, _) = split_file(from);
    let (to_dirs, stem) = split_file(to);
    let shared = common_prefix(&from_dirs, &to_dirs);
    let mut segments: Vec<&str> = Vec::new();
    if shared == from_dirs.len() {
        segments.push(".");
    } else {
        segments.extend(std::iter::repeat("..").take(from_dirs.len() - shared));
    }
    segments.extend(&to_dirs[shared..]);
    segments.push(stem);
    segments.join("/")
}

/// Relative package path of `to` as seen from `from` (`..models.user`)
pub fn relative_package_path(from: &str, to: &str) -> String {
    let (from_dirs, _) = split_file(from);
    let (to_dirs, stem) = split_file(to);
    let shared = common_prefix(&from_dirs, &to_dirs);
    let dots = ".".repeat(1 + from_dirs.len() - shared);
    let mut segments: Vec<&str> = to_dirs[shared..].to_vec();
    segments.push(stem);
    format!("{}{}", dots, segments.join("."))
}
