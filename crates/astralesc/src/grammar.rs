//! The fixed grammar that drives the transformer.
//!
//! Each [`Mode`] stands for one grammatical unit of an XML document. A mode
//! lists the indicator strings that either open a nested unit ([`Action::Push`])
//! or close the current one ([`Action::Pop`]). Indicators are tested in
//! declaration order and the first match wins, so in every mode a longer
//! indicator must come before any shorter indicator that is its prefix.
//!
//! The table is pure data: it never looks at buffers or input.

/// A parse mode, i.e. the kind of grammatical unit the transformer is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Document content outside of any markup. Permanent base of the stack.
    TopLevel,
    /// `<? ... ?>`
    ProcessingInstruction,
    /// `<!-- ... -->`
    Comment,
    /// `<![CDATA[ ... ]]>`
    Cdata,
    /// `& ... ;`
    Entity,
    /// Start, end or empty-element tag, and `<!ATTLIST ...>` declarations.
    Tag,
    /// Attribute value in single quotes. Escapes supplementary characters.
    SingleQuoteAttribute,
    /// Attribute value in double quotes. Escapes supplementary characters.
    DoubleQuoteAttribute,
    /// Declaration inside a DOCTYPE whose quoted values are not attribute
    /// values (`<!ELEMENT ...>`, `<!ENTITY ...>`, ...).
    PlainTag,
    /// Single-quoted literal that is never escaped.
    PlainSingleQuoteAttribute,
    /// Double-quoted literal that is never escaped.
    PlainDoubleQuoteAttribute,
    /// `<!DOCTYPE ... >` including its internal subset.
    Doctype,
}

/// What happens to the mode stack when a transition's indicator matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Enter a nested grammatical unit.
    Push(Mode),
    /// Leave the current grammatical unit.
    Pop,
}

/// An indicator and the stack action it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Literal ASCII text that must appear next in the input.
    pub indicator: &'static str,
    /// Action taken once the indicator has been copied to the output.
    pub action: Action,
}

const fn push(indicator: &'static str, mode: Mode) -> Transition {
    Transition {
        indicator,
        action: Action::Push(mode),
    }
}

const fn stop(indicator: &'static str) -> Transition {
    Transition {
        indicator,
        action: Action::Pop,
    }
}

const TOP_LEVEL: &[Transition] = &[
    push("<?", Mode::ProcessingInstruction),
    push("<!DOCTYPE", Mode::Doctype),
    push("<!--", Mode::Comment),
    push("<![CDATA[", Mode::Cdata),
    push("<", Mode::Tag),
    push("&", Mode::Entity),
];

const PROCESSING_INSTRUCTION: &[Transition] = &[stop("?>")];
const COMMENT: &[Transition] = &[stop("-->")];
const CDATA: &[Transition] = &[stop("]]>")];
const ENTITY: &[Transition] = &[stop(";")];

const TAG: &[Transition] = &[
    push("'", Mode::SingleQuoteAttribute),
    push("\"", Mode::DoubleQuoteAttribute),
    stop(">"),
];

const PLAIN_TAG: &[Transition] = &[
    push("'", Mode::PlainSingleQuoteAttribute),
    push("\"", Mode::PlainDoubleQuoteAttribute),
    stop(">"),
];

const SINGLE_QUOTE: &[Transition] = &[stop("'")];
const DOUBLE_QUOTE: &[Transition] = &[stop("\"")];

// `<!ATTLIST` default values are real attribute values, every other
// declaration goes through the plain variants.
const DOCTYPE: &[Transition] = &[
    push("<?", Mode::ProcessingInstruction),
    push("<!--", Mode::Comment),
    push("<!ATTLIST", Mode::Tag),
    push("<", Mode::PlainTag),
    push("\"", Mode::PlainDoubleQuoteAttribute),
    push("'", Mode::PlainSingleQuoteAttribute),
    stop(">"),
];

/// Length of the longest indicator in the grammar, in UTF-16 code units.
pub const MAX_INDICATOR_LEN: usize = 9;

impl Mode {
    /// All modes, in declaration order.
    pub const ALL: [Mode; 12] = [
        Mode::TopLevel,
        Mode::ProcessingInstruction,
        Mode::Comment,
        Mode::Cdata,
        Mode::Entity,
        Mode::Tag,
        Mode::SingleQuoteAttribute,
        Mode::DoubleQuoteAttribute,
        Mode::PlainTag,
        Mode::PlainSingleQuoteAttribute,
        Mode::PlainDoubleQuoteAttribute,
        Mode::Doctype,
    ];

    /// Whether supplementary characters are rewritten while this mode is on
    /// top of the stack.
    #[must_use]
    pub const fn escapes(self) -> bool {
        matches!(self, Mode::SingleQuoteAttribute | Mode::DoubleQuoteAttribute)
    }

    /// The transitions of this mode, in priority order.
    #[must_use]
    pub const fn transitions(self) -> &'static [Transition] {
        match self {
            Mode::TopLevel => TOP_LEVEL,
            Mode::ProcessingInstruction => PROCESSING_INSTRUCTION,
            Mode::Comment => COMMENT,
            Mode::Cdata => CDATA,
            Mode::Entity => ENTITY,
            Mode::Tag => TAG,
            Mode::SingleQuoteAttribute | Mode::PlainSingleQuoteAttribute => SINGLE_QUOTE,
            Mode::DoubleQuoteAttribute | Mode::PlainDoubleQuoteAttribute => DOUBLE_QUOTE,
            Mode::PlainTag => PLAIN_TAG,
            Mode::Doctype => DOCTYPE,
        }
    }
}
