//! Core types for spark-dom.
//!
//! These types define the contract between the binding engine and the host
//! document: node handles, node kinds and the capabilities they carry, the
//! closed set of writable node properties, and interaction event payloads.

use std::fmt;

// =============================================================================
// Node Handle
// =============================================================================

/// Opaque handle to a node in a [`Document`](crate::Document).
///
/// Handles are generation-checked: once a node is released its handle goes
/// stale, and a later node reusing the same slot gets a different generation.
/// Every operation on a stale handle is a no-op.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Slot index inside the document arena.
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}v{}", self.index, self.generation)
    }
}

// =============================================================================
// Capabilities (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Optional node properties a node kind supports.
    ///
    /// Bindings check these instead of the node's concrete type; a binding
    /// whose capability is missing silently does nothing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Caps: u8 {
        /// `disabled` flag (form controls).
        const DISABLE = 1 << 0;
        /// String `value` (button, input, option, select, textarea).
        const VALUE = 1 << 1;
        /// `href` (anchor-like nodes).
        const HREF = 1 << 2;
        /// Label `for` target.
        const LABEL_FOR = 1 << 3;
        /// `placeholder` text.
        const PLACEHOLDER = 1 << 4;
        /// `checked` flag.
        const CHECK = 1 << 5;
        /// Editable text whose value changes on key-up.
        const TEXT_INPUT = 1 << 6;
    }
}

// =============================================================================
// Node Kinds
// =============================================================================

/// Input element flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Password,
    Checkbox,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Checkbox => "checkbox",
        }
    }
}

/// Kind of a document node. Determines the node's [`Caps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Body,
    Div,
    Section,
    Header,
    Footer,
    P,
    H1,
    Span,
    Strong,
    Ul,
    Li,
    Img,
    A,
    Area,
    Base,
    Link,
    Label,
    Button,
    Input(InputType),
    TextArea,
    Select,
    Option,
    OptGroup,
    FieldSet,
}

impl NodeKind {
    /// HTML tag name of this kind.
    pub fn tag_name(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Div => "div",
            Self::Section => "section",
            Self::Header => "header",
            Self::Footer => "footer",
            Self::P => "p",
            Self::H1 => "h1",
            Self::Span => "span",
            Self::Strong => "strong",
            Self::Ul => "ul",
            Self::Li => "li",
            Self::Img => "img",
            Self::A => "a",
            Self::Area => "area",
            Self::Base => "base",
            Self::Link => "link",
            Self::Label => "label",
            Self::Button => "button",
            Self::Input(_) => "input",
            Self::TextArea => "textarea",
            Self::Select => "select",
            Self::Option => "option",
            Self::OptGroup => "optgroup",
            Self::FieldSet => "fieldset",
        }
    }

    /// Capabilities supported by this kind.
    pub fn caps(self) -> Caps {
        match self {
            Self::Button | Self::Select | Self::Option => Caps::DISABLE | Caps::VALUE,
            Self::Input(_) => {
                Caps::DISABLE | Caps::VALUE | Caps::PLACEHOLDER | Caps::CHECK | Caps::TEXT_INPUT
            }
            Self::TextArea => Caps::DISABLE | Caps::VALUE | Caps::PLACEHOLDER | Caps::TEXT_INPUT,
            Self::FieldSet | Self::OptGroup => Caps::DISABLE,
            Self::A | Self::Area | Self::Base | Self::Link => Caps::HREF,
            Self::Label => Caps::LABEL_FOR,
            _ => Caps::empty(),
        }
    }
}

// =============================================================================
// Node Properties
// =============================================================================

/// String-valued node properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringProp {
    TextContent,
    Title,
    ClassName,
    Href,
    Value,
    HtmlFor,
    Placeholder,
}

impl StringProp {
    pub(crate) const COUNT: usize = 7;

    pub(crate) fn slot(self) -> usize {
        self as usize
    }

    /// Capability a node needs for this property to apply.
    pub fn required_caps(self) -> Caps {
        match self {
            Self::TextContent | Self::Title | Self::ClassName => Caps::empty(),
            Self::Href => Caps::HREF,
            Self::Value => Caps::VALUE,
            Self::HtmlFor => Caps::LABEL_FOR,
            Self::Placeholder => Caps::PLACEHOLDER,
        }
    }
}

/// Boolean node properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolProp {
    Disabled,
    Checked,
}

impl BoolProp {
    pub(crate) const COUNT: usize = 2;

    pub(crate) fn slot(self) -> usize {
        self as usize
    }

    /// Capability a node needs for this property to apply.
    pub fn required_caps(self) -> Caps {
        match self {
            Self::Disabled => Caps::DISABLE,
            Self::Checked => Caps::CHECK,
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Key code of the Enter key.
pub const ENTER_KEY: u32 = 13;

/// Key code of the Escape key.
pub const ESCAPE_KEY: u32 = 27;

/// Interaction event kinds a listener can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    DoubleClick,
    Blur,
    KeyUp,
    KeyDown,
}

impl EventKind {
    /// DOM event name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DoubleClick => "dblclick",
            Self::Blur => "blur",
            Self::KeyUp => "keyup",
            Self::KeyDown => "keydown",
        }
    }
}

/// Pointer event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    pub target: NodeId,
    pub button: i16,
}

/// Keyboard event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub target: NodeId,
    /// Legacy numeric key code (see [`ENTER_KEY`], [`ESCAPE_KEY`]).
    pub key_code: u32,
    pub key: String,
}

impl KeyboardEvent {
    pub fn is_enter(&self) -> bool {
        self.key_code == ENTER_KEY
    }

    pub fn is_escape(&self) -> bool {
        self.key_code == ESCAPE_KEY
    }
}

/// Focus-loss event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusEvent {
    pub target: NodeId,
    /// Node receiving focus, if any.
    pub related_target: Option<NodeId>,
}

/// An interaction event delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Click(MouseEvent),
    DoubleClick(MouseEvent),
    Blur(FocusEvent),
    KeyUp(KeyboardEvent),
    KeyDown(KeyboardEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Click(_) => EventKind::Click,
            Self::DoubleClick(_) => EventKind::DoubleClick,
            Self::Blur(_) => EventKind::Blur,
            Self::KeyUp(_) => EventKind::KeyUp,
            Self::KeyDown(_) => EventKind::KeyDown,
        }
    }

    pub fn target(&self) -> NodeId {
        match self {
            Self::Click(e) | Self::DoubleClick(e) => e.target,
            Self::Blur(e) => e.target,
            Self::KeyUp(e) | Self::KeyDown(e) => e.target,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// True when `s` holds at least one non-whitespace character.
pub fn has_text(s: Option<&str>) -> bool {
    s.is_some_and(|s| !s.trim().is_empty())
}
