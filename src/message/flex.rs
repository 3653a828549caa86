//! Rich card components, serialized in the LINE flex message format.
//!
//! See <https://developers.line.biz/en/reference/messaging-api/#flex-message>.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Vertical,
    Horizontal,
    Baseline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Box(FlexBox),
    Text(Text),
    Separator(Separator),
}

impl From<FlexBox> for Component {
    fn from(b: FlexBox) -> Self {
        Component::Box(b)
    }
}

impl From<Text> for Component {
    fn from(t: Text) -> Self {
        Component::Text(t)
    }
}

impl From<Separator> for Component {
    fn from(s: Separator) -> Self {
        Component::Separator(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexBox {
    pub layout: Layout,
    pub contents: Vec<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_all: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_bottom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex: Option<u32>,
}

impl FlexBox {
    pub fn new(layout: Layout, contents: Vec<Component>) -> FlexBox {
        FlexBox {
            layout,
            contents,
            margin: None,
            spacing: None,
            padding_all: None,
            padding_bottom: None,
            background_color: None,
            corner_radius: None,
            flex: None,
        }
    }

    pub fn vertical(contents: Vec<Component>) -> FlexBox {
        FlexBox::new(Layout::Vertical, contents)
    }

    pub fn horizontal(contents: Vec<Component>) -> FlexBox {
        FlexBox::new(Layout::Horizontal, contents)
    }

    pub fn baseline(contents: Vec<Component>) -> FlexBox {
        FlexBox::new(Layout::Baseline, contents)
    }

    pub fn margin(mut self, margin: &str) -> Self {
        self.margin = Some(margin.to_string());
        self
    }

    pub fn spacing(mut self, spacing: &str) -> Self {
        self.spacing = Some(spacing.to_string());
        self
    }

    pub fn padding_all(mut self, padding: &str) -> Self {
        self.padding_all = Some(padding.to_string());
        self
    }

    pub fn padding_bottom(mut self, padding: &str) -> Self {
        self.padding_bottom = Some(padding.to_string());
        self
    }

    pub fn background(mut self, color: &str) -> Self {
        self.background_color = Some(color.to_string());
        self
    }

    pub fn corner_radius(mut self, radius: &str) -> Self {
        self.corner_radius = Some(radius.to_string());
        self
    }

    pub fn flex(mut self, flex: u32) -> Self {
        self.flex = Some(flex);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Text {
        Text {
            text: text.into(),
            ..Text::default()
        }
    }

    pub fn size(mut self, size: &str) -> Self {
        self.size = Some(size.to_string());
        self
    }

    pub fn bold(mut self) -> Self {
        self.weight = Some("bold".to_string());
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn margin(mut self, margin: &str) -> Self {
        self.margin = Some(margin.to_string());
        self
    }

    pub fn align(mut self, align: &str) -> Self {
        self.align = Some(align.to_string());
        self
    }

    pub fn flex(mut self, flex: u32) -> Self {
        self.flex = Some(flex);
        self
    }

    pub fn wrap(mut self) -> Self {
        self.wrap = Some(true);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Separator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
}

impl Separator {
    pub fn new() -> Separator {
        Separator::default()
    }

    pub fn margin(mut self, margin: &str) -> Self {
        self.margin = Some(margin.to_string());
        self
    }
}

/// A single-bubble rich card.
///
/// The body holds the ordered display sections; the header is optional and
/// rendered above them.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Shown in notifications and by clients that cannot render the card.
    pub alt_text: String,
    pub header: Option<FlexBox>,
    pub body: FlexBox,
    pub header_background: Option<String>,
    pub body_background: Option<String>,
}

impl Card {
    pub fn new(alt_text: impl Into<String>) -> Card {
        Card {
            alt_text: alt_text.into(),
            header: None,
            body: FlexBox::vertical(Vec::new()),
            header_background: None,
            body_background: None,
        }
    }

    pub fn sections(&self) -> &[Component] {
        &self.body.contents
    }

    /// The `contents` object of a flex message.
    pub fn bubble(&self) -> Bubble<'_> {
        let styles = Styles {
            header: block_style(&self.header_background),
            body: block_style(&self.body_background),
        };
        Bubble {
            type_: "bubble",
            size: "mega",
            header: self.header.as_ref().map(|b| Tagged {
                type_: "box",
                inner: b,
            }),
            body: Tagged {
                type_: "box",
                inner: &self.body,
            },
            styles: (styles.header.is_some() || styles.body.is_some()).then_some(styles),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Bubble<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    size: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<Tagged<'a>>,
    body: Tagged<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    styles: Option<Styles<'a>>,
}

#[derive(Debug, Serialize)]
struct Tagged<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    #[serde(flatten)]
    inner: &'a FlexBox,
}

#[derive(Debug, Serialize)]
struct Styles<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<BlockStyle<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<BlockStyle<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockStyle<'a> {
    background_color: &'a str,
}

fn block_style(color: &Option<String>) -> Option<BlockStyle<'_>> {
    color.as_deref().map(|c| BlockStyle {
        background_color: c,
    })
}
