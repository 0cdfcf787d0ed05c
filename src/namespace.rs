use std::fmt;

pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// SBML Level and Version, which select level-dependent behaviour of the
/// reader, writer and math checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SbmlNamespace {
    pub level: u32,
    pub version: u32,
}

impl SbmlNamespace {
    pub fn new(level: u32, version: u32) -> Self {
        Self { level, version }
    }

    pub fn uri(&self) -> String {
        match self.level {
            1 => "http://www.sbml.org/sbml/level1".to_string(),
            2 if self.version == 1 => "http://www.sbml.org/sbml/level2".to_string(),
            _ => format!(
                "http://www.sbml.org/sbml/level{}/version{}/core",
                self.level, self.version
            ),
        }
    }

    /// `units` on `<cn>` only exists from Level 3 onwards.
    pub fn allows_units(&self) -> bool {
        self.level >= 3
    }

    pub fn is_at_least(&self, level: u32, version: u32) -> bool {
        (self.level, self.version) >= (level, version)
    }
}

impl Default for SbmlNamespace {
    fn default() -> Self {
        Self {
            level: 3,
            version: 2,
        }
    }
}

impl fmt::Display for SbmlNamespace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L{}V{}", self.level, self.version)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub namespace: SbmlNamespace,
    /// Maximum element nesting accepted before reading is abandoned.
    pub max_depth: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            namespace: SbmlNamespace::default(),
            max_depth: 256,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub namespace: SbmlNamespace,
    pub indent: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            namespace: SbmlNamespace::default(),
            indent: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SbmlNamespace;

    #[test]
    fn level_version_ordering() {
        let l2v4 = SbmlNamespace::new(2, 4);
        assert!(l2v4.is_at_least(2, 4));
        assert!(!l2v4.is_at_least(3, 1));
        assert!(SbmlNamespace::new(3, 1).is_at_least(2, 4));
        assert!(!l2v4.allows_units());
        assert_eq!(
            SbmlNamespace::new(3, 2).uri(),
            "http://www.sbml.org/sbml/level3/version2/core"
        );
    }
}
