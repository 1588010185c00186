//! Shader Macro Definition System
//!
//! An ordered set of `#define` entries with deterministic text emission.
//!
//! Entries are kept sorted by name, so two sets built in different orders
//! emit byte-identical source.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_materials::renderer::pipeline::ShaderDefines;
//!
//! let mut defines = ShaderDefines::new();
//! defines.set_flag("USE_AO");
//! defines.set_value("MAX_LIGHT", 128);
//!
//! assert_eq!(defines.to_source(), "#define MAX_LIGHT 128\n#define USE_AO\n");
//! ```

use std::borrow::Cow;
use std::fmt::{Display, Write as _};

type DefineName = Cow<'static, str>;

/// Sorted `#define` entries; a `None` value is a bare flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderDefines {
    defines: Vec<(DefineName, Option<String>)>,
}

impl ShaderDefines {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            defines: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            defines: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace `name`.
    pub fn set(&mut self, name: impl Into<DefineName>, value: Option<String>) {
        let name = name.into();
        match self.position(&name) {
            Ok(idx) => self.defines[idx].1 = value,
            Err(idx) => self.defines.insert(idx, (name, value)),
        }
    }

    /// Set a bare flag define.
    #[inline]
    pub fn set_flag(&mut self, name: impl Into<DefineName>) {
        self.set(name, None);
    }

    /// Set a define with a value.
    #[inline]
    pub fn set_value(&mut self, name: impl Into<DefineName>, value: impl Display) {
        self.set(name, Some(value.to_string()));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_ok()
    }

    /// Value of a define: `None` if absent, `Some(None)` for a bare flag.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.position(name)
            .ok()
            .map(|idx| self.defines[idx].1.as_deref())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Emit one `#define` line per entry.
    #[must_use]
    pub fn to_source(&self) -> String {
        let mut source = String::with_capacity(self.defines.len() * 24);
        for (name, value) in &self.defines {
            // Writing into a String cannot fail.
            let _ = match value {
                Some(value) => writeln!(source, "#define {name} {value}"),
                None => writeln!(source, "#define {name}"),
            };
        }
        source
    }

    /// Parse `#define` lines back into a set. Other lines are ignored.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut defines = Self::new();
        for line in source.lines() {
            let Some(rest) = line.trim_start().strip_prefix("#define") else {
                continue;
            };
            let mut parts = rest.trim().splitn(2, char::is_whitespace);
            let Some(name) = parts.next().filter(|n| !n.is_empty()) else {
                continue;
            };
            let value = parts
                .next()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned);
            defines.set(name.to_owned(), value);
        }
        defines
    }

    #[inline]
    fn position(&self, name: &str) -> Result<usize, usize> {
        self.defines
            .binary_search_by(|(existing, _)| (**existing).cmp(name))
    }
}

/// Bare flags only.
impl From<&[&'static str]> for ShaderDefines {
    fn from(flags: &[&'static str]) -> Self {
        let mut result = Self::with_capacity(flags.len());
        for flag in flags {
            result.set_flag(*flag);
        }
        result
    }
}
