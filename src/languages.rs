//! Filename to language resolution
//!
//! An ordered rule table of case-insensitive filename globs is consulted
//! first; when no rule matches, the file extension itself becomes the
//! language id. Rules earlier in the table win, so whole-filename rules
//! like `Directory.Build.props` sit ahead of the `*.props` catch-all.

use std::fmt;

/// Opaque, lowercase language identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageId(String);

impl LanguageId {
    pub fn new(id: &str) -> Self {
        Self(id.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Built-in rule table, ordered most-specific first.
pub const DEFAULT_RULES: &[(&str, &str)] = &[
    ("directory.build.props", "markup"),
    ("directory.packages.props", "markup"),
    ("*.props", "markup"),
    ("*.csproj", "markup"),
    ("*.sln", "solution"),
    ("*.feature", "gherkin"),
    ("*.js", "javascript"),
    ("*.mjs", "javascript"),
    ("*.cjs", "javascript"),
    ("*.jsx", "jsx"),
    ("*.ts", "typescript"),
    ("*.tsx", "tsx"),
    ("*.py", "python"),
    ("*.go", "go"),
    ("*.rs", "rust"),
    ("*.java", "java"),
    ("*.cs", "csharp"),
    ("*.c", "c"),
    ("*.h", "c"),
    ("*.cpp", "cpp"),
    ("*.cc", "cpp"),
    ("*.hpp", "cpp"),
    ("*.html", "markup"),
    ("*.htm", "markup"),
    ("*.xml", "markup"),
    ("*.svg", "markup"),
    ("*.css", "css"),
    ("*.scss", "scss"),
    ("*.less", "less"),
    ("*.json", "json"),
    ("*.yaml", "yaml"),
    ("*.yml", "yaml"),
    ("*.toml", "toml"),
    ("*.md", "markdown"),
    ("*.sh", "bash"),
    ("*.bash", "bash"),
    ("*.ps1", "powershell"),
    ("*.sql", "sql"),
];

/// Resolves display filenames to language ids.
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    rules: Vec<(String, LanguageId)>,
}

impl Default for LanguageResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageResolver {
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(glob, id)| (glob.to_string(), LanguageId::new(id)))
                .collect(),
        }
    }

    /// Add a rule ahead of all existing ones. Later prepends take
    /// precedence over earlier ones.
    pub fn prepend_rule(&mut self, glob: &str, id: LanguageId) {
        self.rules.insert(0, (glob.to_ascii_lowercase(), id));
    }

    /// Map a filename to a language id.
    ///
    /// First matching glob rule wins. With no match, the non-empty
    /// segment after the last `.` is used verbatim as the id. Names
    /// without a dot resolve to None.
    pub fn resolve(&self, filename: Option<&str>) -> Option<LanguageId> {
        let name = filename?.trim();
        if name.is_empty() {
            return None;
        }
        let lower = name.to_ascii_lowercase();

        for (glob, id) in &self.rules {
            if glob_match(glob, &lower) {
                return Some(id.clone());
            }
        }

        match lower.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => Some(LanguageId::new(ext)),
            _ => None,
        }
    }
}

/// Whole-name glob match where `*` spans any run of characters and every
/// other character, `.` included, matches literally. Inputs are expected
/// pre-lowercased.
fn glob_match(pattern: &str, name: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = name.chars().collect();
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < txt.len() {
        if p < pat.len() && (pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}
