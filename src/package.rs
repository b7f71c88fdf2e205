//! Project packages: root discovery, the `config.snc` manifest and
//! scaffolding.

use crate::{FILE_EXTENSION, PROGRAM_ENTRY};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub const MANIFEST_FILE_NAME: &str = "config.snc";

/// The project manifest.
///
/// A line-oriented `@key value` format. The front-end treats it opaquely
/// and only ever consumes the target triple; everything else is carried
/// for the driver and the code generator.
#[derive(Default, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    /// The LLVM target triple.
    pub target: Option<String>,
    pub dependencies: Vec<Dependency>,
}

/// A `@use <package>@<version>` directive.
#[derive(Debug, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version: Option<String>,
}

impl Manifest {
    pub fn parse(source: &str) -> Self {
        let mut manifest = Self::default();

        for line in source.lines() {
            let line = line.trim();
            let Some(directive) = line.strip_prefix('@') else {
                continue;
            };

            let (key, value) = match directive.split_once(char::is_whitespace) {
                Some((key, value)) => (key, value.trim()),
                None => (directive, ""),
            };

            match key {
                "name" => manifest.name = Some(value.to_owned()),
                "version" => manifest.version = Some(value.to_owned()),
                "author" => manifest.author = Some(value.to_owned()),
                "description" => manifest.description = Some(value.to_owned()),
                "license" => manifest.license = Some(value.to_owned()),
                "target" => manifest.target = Some(value.to_owned()),
                "use" => {
                    let (name, version) = match value.split_once('@') {
                        Some((name, version)) => (name, Some(version.to_owned())),
                        None => (value, None),
                    };
                    manifest.dependencies.push(Dependency {
                        name: name.to_owned(),
                        version,
                    });
                }
                // unknown directives are preserved verbatim by the driver,
                // not interpreted
                _ => {}
            }
        }

        manifest
    }

    /// Load the manifest placed next to the project root, if any.
    pub fn load(directory: &Path) -> io::Result<Option<Self>> {
        let path = directory.join(MANIFEST_FILE_NAME);

        if !path.is_file() {
            return Ok(None);
        }

        let source = fs::read_to_string(path)?;
        Ok(Some(Self::parse(&source)))
    }

    /// Search for a manifest in the given directory and its ancestors.
    pub fn discover(directory: &Path) -> io::Result<Option<Self>> {
        for ancestor in directory.ancestors() {
            if let Some(manifest) = Self::load(ancestor)? {
                return Ok(Some(manifest));
            }
        }

        Ok(None)
    }
}

/// The platform-specific root of installed libraries.
pub fn library_root() -> PathBuf {
    if cfg!(windows) {
        let programs = std::env::var_os("ProgramFiles")
            .map_or_else(|| PathBuf::from(r"C:\Program Files"), PathBuf::from);
        programs.join("sonic_lib")
    } else {
        let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("/"), PathBuf::from);
        home.join(".local/share/lib/sonic_lib")
    }
}

/// Resolve the path argument of `compile` to the entry source file.
///
/// A directory is treated as `<dir>/src/main.sn`.
pub fn entry_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join("src")
            .join(format!("{PROGRAM_ENTRY}.{FILE_EXTENSION}"))
    } else {
        path.to_owned()
    }
}

/// Scaffold a new project folder.
pub fn create_project(name: &str) -> io::Result<PathBuf> {
    let root = std::env::current_dir()?.join(name);
    fs::create_dir(&root)?;

    let source = root.join("src");
    fs::create_dir(&source)?;
    fs::write(
        source.join(format!("{PROGRAM_ENTRY}.{FILE_EXTENSION}")),
        "func main() -> void {\n}\n",
    )?;

    fs::write(
        root.join(MANIFEST_FILE_NAME),
        format!("@name {name}\n@version 0.1.0\n@license MIT\n"),
    )?;

    Ok(root)
}

#[cfg(test)]
mod test {
    use super::{Dependency, Manifest};

    #[test]
    fn manifest_directives() {
        let manifest = Manifest::parse(
            "\
@name demo
@version 0.1.0
@author Someone
@target x86_64-unknown-linux-gnu

this line is ignored
@use math@1.2.0
@use fmt
",
        );

        assert_eq!(manifest.name.as_deref(), Some("demo"));
        assert_eq!(manifest.version.as_deref(), Some("0.1.0"));
        assert_eq!(manifest.author.as_deref(), Some("Someone"));
        assert_eq!(manifest.target.as_deref(), Some("x86_64-unknown-linux-gnu"));
        assert_eq!(
            manifest.dependencies,
            vec![
                Dependency {
                    name: "math".into(),
                    version: Some("1.2.0".into())
                },
                Dependency {
                    name: "fmt".into(),
                    version: None
                },
            ]
        );
    }

    #[test]
    fn manifest_empty_and_unknown() {
        let manifest = Manifest::parse("@unknown thing\n@name\n");

        assert_eq!(manifest.name.as_deref(), Some(""));
        assert_eq!(manifest.version, None);
        assert!(manifest.dependencies.is_empty());
    }
}
