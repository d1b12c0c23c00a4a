//! Supported target languages.
//!
//! # Examples
//!
//! ```
//! use sdkgen_core::language::GenerationLanguage;
//! use std::str::FromStr;
//!
//! let language = GenerationLanguage::from_str("TypeScript").unwrap();
//! assert_eq!(language, GenerationLanguage::TypeScript);
//! assert_eq!(language.as_str(), "typescript");
//! assert_eq!(GenerationLanguage::default(), GenerationLanguage::CSharp);
//! ```

// Internal imports (std, crate)
use std::fmt;
use std::str::FromStr;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};

/// Target languages a code model can be rendered into
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum GenerationLanguage {
    /// C# against the .NET abstractions
    #[default]
    #[value(name = "csharp", alias = "cs")]
    CSharp,
    /// Java against the JVM abstractions
    Java,
    /// TypeScript against the JavaScript abstractions
    #[value(name = "typescript", alias = "ts")]
    TypeScript,
    /// Python against the Python abstractions
    #[value(alias = "py")]
    Python,
}

impl FromStr for GenerationLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csharp" | "cs" | "c#" => Ok(Self::CSharp),
            "java" => Ok(Self::Java),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "python" | "py" => Ok(Self::Python),
            _ => Err(format!("Unknown language: {}", s)),
        }
    }
}

impl GenerationLanguage {
    /// Returns the language identifier as a string slice
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CSharp => "csharp",
            Self::Java => "java",
            Self::TypeScript => "typescript",
            Self::Python => "python",
        }
    }

    /// Returns an iterator over all supported languages
    pub fn all() -> impl Iterator<Item = Self> {
        use GenerationLanguage::*;
        [CSharp, Java, TypeScript, Python].iter().copied()
    }
}

impl fmt::Display for GenerationLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
