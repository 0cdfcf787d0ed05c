use std::fmt;
use std::fmt::Write;

use thiserror::Error;

/// Failure of a structural operation on an [`crate::ast::AstNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("invalid object: node of unknown type cannot be used here")]
    InvalidObject,
    #[error("operation failed: node kind does not accept this operation")]
    OperationFailed,
    #[error("operation failed: index {index} out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("operation failed: expression nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Error => write!(f, "Error"),
            Severity::Fatal => write!(f, "Fatal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Problems found while reading MathML.
    MathML,
    /// Violations of the SBML math consistency rules.
    MathConsistency,
    Internal,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Category::MathML => write!(f, "MathML"),
            Category::MathConsistency => write!(f, "Math consistency"),
            Category::Internal => write!(f, "Internal"),
        }
    }
}

/// Every diagnostic the crate can produce. The table of numeric ids,
/// severities, categories and short messages is fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DisallowedMathMLSymbol,
    DisallowedMathMLEncodingUse,
    DisallowedDefinitionURLUse,
    BadCsymbolDefinitionURLValue,
    DisallowedMathTypeAttributeUse,
    DisallowedMathTypeAttributeValue,
    LambdaOnlyAllowedInFunctionDef,
    BooleanOpsNeedBooleanArgs,
    NumericOpsNeedNumericArgs,
    ArgsToEqNeedSameType,
    PiecewiseNeedsConsistentTypes,
    PieceNeedsBoolean,
    ApplyCiMustBeUserFunction,
    ApplyCiMustBeModelComponent,
    KineticLawParametersAreLocalOnly,
    MathResultMustBeNumeric,
    OpsNeedCorrectNumberOfArgs,
    InvalidNoArgsPassedToFunctionDef,
    DisallowedMathUnitsUse,
    InvalidUnitsValue,
    BadMathML,
    FailedMathMLReadOfDouble,
    FailedMathMLReadOfInteger,
    FailedMathMLReadOfExponential,
    FailedMathMLReadOfRational,
    BadMathMLNodeType,
    MathNestingTooDeep,
}

impl ErrorCode {
    pub fn id(&self) -> u32 {
        match self {
            ErrorCode::DisallowedMathMLSymbol => 10202,
            ErrorCode::DisallowedMathMLEncodingUse => 10203,
            ErrorCode::DisallowedDefinitionURLUse => 10204,
            ErrorCode::BadCsymbolDefinitionURLValue => 10205,
            ErrorCode::DisallowedMathTypeAttributeUse => 10206,
            ErrorCode::DisallowedMathTypeAttributeValue => 10207,
            ErrorCode::LambdaOnlyAllowedInFunctionDef => 10208,
            ErrorCode::BooleanOpsNeedBooleanArgs => 10209,
            ErrorCode::NumericOpsNeedNumericArgs => 10210,
            ErrorCode::ArgsToEqNeedSameType => 10211,
            ErrorCode::PiecewiseNeedsConsistentTypes => 10212,
            ErrorCode::PieceNeedsBoolean => 10213,
            ErrorCode::ApplyCiMustBeUserFunction => 10214,
            ErrorCode::ApplyCiMustBeModelComponent => 10215,
            ErrorCode::KineticLawParametersAreLocalOnly => 10216,
            ErrorCode::MathResultMustBeNumeric => 10217,
            ErrorCode::OpsNeedCorrectNumberOfArgs => 10218,
            ErrorCode::InvalidNoArgsPassedToFunctionDef => 10219,
            ErrorCode::DisallowedMathUnitsUse => 10220,
            ErrorCode::InvalidUnitsValue => 10221,
            ErrorCode::BadMathML => 99219,
            ErrorCode::FailedMathMLReadOfDouble => 99220,
            ErrorCode::FailedMathMLReadOfInteger => 99221,
            ErrorCode::FailedMathMLReadOfExponential => 99222,
            ErrorCode::FailedMathMLReadOfRational => 99223,
            ErrorCode::BadMathMLNodeType => 99224,
            ErrorCode::MathNestingTooDeep => 99225,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::BadMathML
            | ErrorCode::BadMathMLNodeType
            | ErrorCode::MathNestingTooDeep => Severity::Fatal,
            ErrorCode::DisallowedMathUnitsUse
            | ErrorCode::DisallowedMathMLEncodingUse
            | ErrorCode::DisallowedDefinitionURLUse => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn category(&self) -> Category {
        match self.id() {
            10208..=10219 | 10221 => Category::MathConsistency,
            99225 => Category::Internal,
            _ => Category::MathML,
        }
    }

    /// Serious errors abort reading: the reader returns no tree.
    pub fn is_serious(&self) -> bool {
        matches!(
            self,
            ErrorCode::BadMathML
                | ErrorCode::BadMathMLNodeType
                | ErrorCode::DisallowedMathMLSymbol
                | ErrorCode::BadCsymbolDefinitionURLValue
                | ErrorCode::MathNestingTooDeep
        )
    }

    pub fn short_message(&self) -> &'static str {
        match self {
            ErrorCode::DisallowedMathMLSymbol => "Disallowed MathML symbol found",
            ErrorCode::DisallowedMathMLEncodingUse => "Use of the MathML 'encoding' attribute is not allowed on this element",
            ErrorCode::DisallowedDefinitionURLUse => "Use of the MathML 'definitionURL' attribute is not allowed on this element",
            ErrorCode::BadCsymbolDefinitionURLValue => "Invalid <csymbol> 'definitionURL' attribute value",
            ErrorCode::DisallowedMathTypeAttributeUse => "Use of the MathML 'type' attribute is not allowed on this element",
            ErrorCode::DisallowedMathTypeAttributeValue => "Disallowed MathML 'type' attribute value",
            ErrorCode::LambdaOnlyAllowedInFunctionDef => "Use of <lambda> not permitted outside of FunctionDefinition objects",
            ErrorCode::BooleanOpsNeedBooleanArgs => "Non-Boolean argument given to Boolean operator",
            ErrorCode::NumericOpsNeedNumericArgs => "Non-numerical argument given to numerical operator",
            ErrorCode::ArgsToEqNeedSameType => "Arguments to <eq> and <neq> must have the same data types",
            ErrorCode::PiecewiseNeedsConsistentTypes => "Terms in a <piecewise> expression must have consistent data types",
            ErrorCode::PieceNeedsBoolean => "The second argument of a <piece> expression must yield a Boolean value",
            ErrorCode::ApplyCiMustBeUserFunction => "A <ci> element in this context must refer to a function definition",
            ErrorCode::ApplyCiMustBeModelComponent => "A <ci> element in this context must refer to a model component",
            ErrorCode::KineticLawParametersAreLocalOnly => "Cannot use a KineticLaw local parameter outside of its local scope",
            ErrorCode::MathResultMustBeNumeric => "A formula's result in this context must be a numerical value",
            ErrorCode::OpsNeedCorrectNumberOfArgs => "Incorrect number of arguments given to MathML operator",
            ErrorCode::InvalidNoArgsPassedToFunctionDef => "Incorrect number of arguments given to function invocation",
            ErrorCode::DisallowedMathUnitsUse => "Attribute 'units' is only permitted on <cn> elements in SBML Level 3",
            ErrorCode::InvalidUnitsValue => "Invalid value given for the 'units' attribute",
            ErrorCode::BadMathML => "Invalid MathML",
            ErrorCode::FailedMathMLReadOfDouble => "Missing or invalid floating-point number in MathML",
            ErrorCode::FailedMathMLReadOfInteger => "Missing or invalid integer in MathML",
            ErrorCode::FailedMathMLReadOfExponential => "Missing or invalid exponential expression in MathML",
            ErrorCode::FailedMathMLReadOfRational => "Missing or invalid rational expression in MathML",
            ErrorCode::BadMathMLNodeType => "Invalid MathML element",
            ErrorCode::MathNestingTooDeep => "MathML expression is nested too deeply",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    code: ErrorCode,
    severity: Severity,
    line: Option<u64>,
    column: Option<u64>,
    text: String,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, text: String, location: Option<(u64, u64)>) -> Self {
        Self {
            code,
            severity: code.severity(),
            line: location.map(|(line, _)| line),
            column: location.map(|(_, column)| column),
            text,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn category(&self) -> Category {
        self.code.category()
    }

    pub fn line(&self) -> Option<u64> {
        self.line
    }

    pub fn column(&self) -> Option<u64> {
        self.column
    }

    pub fn message(&self) -> &str {
        &self.text
    }

    pub fn as_error_message(&self, f: &mut String) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(
                f,
                "Line {}, Column {}: {} {}: {}",
                line, col, self.severity, self.code, self.text
            ),
            _ => write!(f, "{} {}: {}", self.severity, self.code, self.text),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "{line}:{col}: ")?;
        }
        write!(
            f,
            "{} {} ({}): {}",
            self.severity,
            self.code,
            self.code.short_message(),
            self.text
        )
    }
}

/// Diagnostics accumulated over one read or validate invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorLog {
    errors: Vec<Diagnostic>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, new: Diagnostic) {
        self.errors.push(new);
    }

    pub fn log(&mut self, code: ErrorCode, text: String, location: Option<(u64, u64)>) {
        self.errors.push(Diagnostic::new(code, text, location));
    }

    pub fn extend(&mut self, new: ErrorLog) {
        self.errors.extend(new.errors)
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, index: usize) -> Option<&Diagnostic> {
        self.errors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter()
    }

    pub fn num_with_severity(&self, severity: Severity) -> usize {
        self.errors
            .iter()
            .filter(|err| err.severity == severity)
            .count()
    }

    pub fn num_with_code(&self, code: ErrorCode) -> usize {
        self.errors.iter().filter(|err| err.code == code).count()
    }

    pub fn contains(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|err| err.code == code)
    }

    pub fn has_serious(&self) -> bool {
        self.errors.iter().any(|err| err.code.is_serious())
    }

    pub fn has_error_contains(&self, text: &str) -> bool {
        self.errors.iter().any(|err| err.text.contains(text))
    }

    pub fn as_error_message(&self) -> String {
        let mut buf = String::new();
        for err in &self.errors {
            // writing into a String cannot fail
            let _ = err.as_error_message(&mut buf);
            buf.push('\n');
        }
        buf
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for err in &self.errors {
            writeln!(f, "{err}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_table() {
        assert_eq!(ErrorCode::ArgsToEqNeedSameType.id(), 10211);
        assert_eq!(ErrorCode::FailedMathMLReadOfInteger.id(), 99221);
        assert_eq!(
            ErrorCode::ArgsToEqNeedSameType.category(),
            Category::MathConsistency
        );
        assert_eq!(ErrorCode::BadMathML.category(), Category::MathML);
        assert!(ErrorCode::BadMathMLNodeType.is_serious());
        assert!(!ErrorCode::FailedMathMLReadOfInteger.is_serious());
        assert_eq!(ErrorCode::DisallowedMathUnitsUse.severity(), Severity::Warning);
    }

    #[test]
    fn log_accumulates() {
        let mut log = ErrorLog::new();
        assert!(log.is_empty());
        log.log(ErrorCode::BadMathML, "no <math>".to_string(), Some((3, 7)));
        log.log(
            ErrorCode::FailedMathMLReadOfDouble,
            "bad real".to_string(),
            None,
        );
        assert_eq!(log.len(), 2);
        assert!(log.has_serious());
        assert_eq!(log.num_with_severity(Severity::Fatal), 1);
        assert!(log.has_error_contains("bad real"));
        let msg = log.as_error_message();
        assert!(msg.contains("Line 3, Column 7: Fatal 99219: no <math>"));
        assert!(msg.contains("Error 99220: bad real"));
    }
}
