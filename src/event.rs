use crate::dom::NodeId;

/// Pointer button reported with a click, numbered like `MouseEvent.which`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
    Other(u16),
}

impl MouseButton {
    pub fn from_which(which: u16) -> Self {
        match which {
            1 => Self::Primary,
            2 => Self::Middle,
            3 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

/// Browser events the host delivers to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Load,
    Focus,
    Blur,
    PointerMove { x: i64, y: i64 },
    PointerEnter(NodeId),
    PointerLeave(NodeId),
    /// Click on a post's thumbnail. `button` is `None` for a programmatic call.
    ExpandClick {
        post_id: String,
        button: Option<MouseButton>,
    },
    QuoteClick { post_id: String },
}

impl PageEvent {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::PointerMove { .. } => "mousemove",
            Self::PointerEnter(_) => "mouseenter",
            Self::PointerLeave(_) => "mouseleave",
            Self::ExpandClick { .. } => "expand",
            Self::QuoteClick { .. } => "quote",
        }
    }
}
