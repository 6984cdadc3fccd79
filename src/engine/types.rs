// Core types for the scanning workflow engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::traits::DocumentRecord;

macro_rules! code_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self(code.to_string())
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self(code)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

code_type!(
    /// Unique code of a scan mode (e.g. `RECV`, `PRTLBL`)
    ModeCode
);
code_type!(
    /// Code of a state within a mode (e.g. `RNBR`, `ITEM`)
    StateCode
);
code_type!(
    /// Code of an operator command (e.g. `PRINT`)
    CommandCode
);
code_type!(
    /// Code of a cross-mode redirect
    RedirectCode
);

/// A message template with positional arguments.
///
/// Templates use `{0}`, `{1}`, ... placeholders. Arguments are kept apart from
/// the template so the operator layer can translate the template before
/// substituting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub template: String,
    pub args: Vec<String>,
}

impl Message {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(template: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            template: template.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Substitute positional arguments into the template.
    ///
    /// Placeholders without a matching argument are left as they are.
    /// Each placeholder is resolved once; argument text is never rescanned.
    pub fn render(&self) -> String {
        let mut rendered = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let tail = &rest[open..];
            let arg = tail.find('}').and_then(|close| {
                let index = tail[1..close].parse::<usize>().ok()?;
                self.args.get(index).map(|arg| (arg, close))
            });
            match arg {
                Some((arg, close)) => {
                    rendered.push_str(arg);
                    rest = &tail[close + 1..];
                }
                None => {
                    rendered.push('{');
                    rest = &tail[1..];
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Severity of a report shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Info,
    Warning,
    Error,
}

impl ReportKind {
    /// Info and warning reports are positive; only errors are negative.
    pub fn is_positive(self) -> bool {
        !self.is_negative()
    }

    pub fn is_negative(self) -> bool {
        matches!(self, ReportKind::Error)
    }
}

/// An entry in the session's report log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub kind: ReportKind,
    pub message: Message,
    pub at: DateTime<Utc>,
}

impl Report {
    pub fn new(kind: ReportKind, message: Message) -> Self {
        Self {
            kind,
            message,
            at: Utc::now(),
        }
    }

    pub fn info(message: Message) -> Self {
        Self::new(ReportKind::Info, message)
    }

    pub fn warning(message: Message) -> Self {
        Self::new(ReportKind::Warning, message)
    }

    pub fn error(message: Message) -> Self {
        Self::new(ReportKind::Error, message)
    }
}

/// Identifier scheme an item barcode may be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierScheme {
    /// Any known identifier (inventory id or any alternate)
    Any,
    /// Plain barcode alternate
    Barcode,
    /// Customer part number
    CustomerPart,
    /// Vendor part number
    VendorPart,
}

impl IdentifierScheme {
    /// Barcode prefix that marks an alternate id of this scheme
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            IdentifierScheme::Any => None,
            IdentifierScheme::Barcode => Some("BC:"),
            IdentifierScheme::CustomerPart => Some("CPN:"),
            IdentifierScheme::VendorPart => Some("VPN:"),
        }
    }
}

/// Kind of value a state expects to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ValueKind {
    DocumentRef,
    Item { scheme: IdentifierScheme },
    Location,
    Quantity,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::DocumentRef => f.write_str("document reference"),
            ValueKind::Item { scheme: IdentifierScheme::Any } => f.write_str("inventory item"),
            ValueKind::Item { scheme } => write!(f, "inventory item ({scheme:?})"),
            ValueKind::Location => f.write_str("location"),
            ValueKind::Quantity => f.write_str("quantity"),
            ValueKind::Text => f.write_str("text"),
        }
    }
}

/// A scan accepted by a state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedValue {
    pub kind: ValueKind,
    /// The barcode as scanned
    pub raw: String,
    /// Canonical value after parsing (e.g. upper-cased ref number, resolved item id)
    pub value: String,
    /// Non-blocking remarks raised while validating
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Message>,
    /// Record resolved while validating a document reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentRecord>,
}

impl ScannedValue {
    pub fn new(kind: ValueKind, raw: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            value: value.into(),
            warnings: Vec::new(),
            document: None,
        }
    }

    pub fn with_document(mut self, document: DocumentRecord) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_warning(mut self, warning: Message) -> Self {
        self.warnings.push(warning);
        self
    }
}

/// The session's current-state marker.
///
/// `Completed` and `Cancelled` only exist while the host decides where the
/// session goes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "position", content = "state")]
pub enum Position {
    At(StateCode),
    Completed,
    Cancelled,
}

impl Position {
    pub fn state(&self) -> Option<&StateCode> {
        match self {
            Position::At(state) => Some(state),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Position::At(_))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::At(state) => write!(f, "{state}"),
            Position::Completed => f.write_str("<completed>"),
            Position::Cancelled => f.write_str("<cancelled>"),
        }
    }
}
