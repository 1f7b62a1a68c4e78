//! Multi-shape feed parsing.
//!
//! Hot-entry feeds arrive in four shapes: well-formed XML RSS, RSS that only
//! survives a lenient HTML parse, Atom, and (as a last resort) a raw HTML
//! link list. The probe chain tries each shape in that fixed order and
//! normalizes whatever it finds into [`ItemNode`] values, so the caller never
//! branches on the source shape except through the accessors.

use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{ElementRef, Html, Node, Selector};

// ============================================================================
// Item Nodes
// ============================================================================

/// Which probe produced an item. Mostly useful for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedShape {
    XmlRss,
    HtmlRss,
    Atom,
    Anchor,
}

/// An `<item>` collected by the strict XML pass.
///
/// Raw slots are kept separate so the description and timestamp accessors can
/// apply their fixed priority regardless of element order in the document.
#[derive(Debug, Clone, Default)]
pub struct XmlItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    content: Option<String>,
    pubdate: Option<String>,
    dc_date: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

impl XmlItem {
    fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.summary.as_deref())
            .or(self.content.as_deref())
    }

    fn timestamp(&self) -> Option<&str> {
        self.pubdate
            .as_deref()
            .or(self.dc_date.as_deref())
            .or(self.published.as_deref())
            .or(self.updated.as_deref())
    }
}

/// Fields extracted from a lenient-markup item or Atom entry.
#[derive(Debug, Clone)]
pub struct MarkupFields {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    timestamp: Option<String>,
}

/// A pseudo-item synthesized from an `a.entry-link` anchor.
#[derive(Debug, Clone)]
pub struct AnchorItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

/// A single feed item, tagged with the shape that produced it.
///
/// Every variant supports the same field contract: title, link, description,
/// and raw timestamp. RSS shapes carry the link as element text while Atom
/// carries it as an `href` attribute; that difference is absorbed here.
#[derive(Debug, Clone)]
pub enum ItemNode {
    XmlRss(XmlItem),
    HtmlRss(MarkupFields),
    Atom(MarkupFields),
    Anchor(AnchorItem),
}

impl ItemNode {
    pub fn shape(&self) -> FeedShape {
        match self {
            ItemNode::XmlRss(_) => FeedShape::XmlRss,
            ItemNode::HtmlRss(_) => FeedShape::HtmlRss,
            ItemNode::Atom(_) => FeedShape::Atom,
            ItemNode::Anchor(_) => FeedShape::Anchor,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            ItemNode::XmlRss(i) => i.title.as_deref(),
            ItemNode::HtmlRss(f) | ItemNode::Atom(f) => f.title.as_deref(),
            ItemNode::Anchor(a) => a.title.as_deref(),
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            ItemNode::XmlRss(i) => i.link.as_deref(),
            ItemNode::HtmlRss(f) | ItemNode::Atom(f) => f.link.as_deref(),
            ItemNode::Anchor(a) => a.link.as_deref(),
        }
    }

    /// First of description / summary / content.
    pub fn description(&self) -> Option<&str> {
        match self {
            ItemNode::XmlRss(i) => i.description(),
            ItemNode::HtmlRss(f) | ItemNode::Atom(f) => f.description.as_deref(),
            ItemNode::Anchor(a) => a.description.as_deref(),
        }
    }

    /// Raw publication timestamp, first of pubDate / dc:date / published /
    /// updated. Anchor items never carry one.
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            ItemNode::XmlRss(i) => i.timestamp(),
            ItemNode::HtmlRss(f) | ItemNode::Atom(f) => f.timestamp.as_deref(),
            ItemNode::Anchor(_) => None,
        }
    }
}

// ============================================================================
// Probe Chain
// ============================================================================

/// How much of an unrecognized payload to log for diagnosis.
const PAYLOAD_SAMPLE_CHARS: usize = 500;

/// Parse a feed payload into items, tolerating all four source shapes.
///
/// Never fails: an unrecognized or empty payload yields an empty vec and a
/// logged sample of the content.
pub fn parse_items(bytes: &[u8], category: &str) -> Vec<ItemNode> {
    if let Some(items) = parse_strict_xml(bytes) {
        tracing::info!(
            category = category,
            count = items.len(),
            "Found items (XML format)"
        );
        return items;
    }

    let text = String::from_utf8_lossy(bytes);
    let document = Html::parse_document(&text);
    let root = document.root_element();

    // RSS that only survives a lenient HTML parse
    if let Some(channel) = first_descendant(root, "channel") {
        let items: Vec<ItemNode> = named_descendants(channel, "item")
            .map(|item| ItemNode::HtmlRss(markup_fields(item)))
            .collect();
        if !items.is_empty() {
            tracing::info!(
                category = category,
                count = items.len(),
                "Found items (RSS-in-HTML format)"
            );
            return items;
        }
    }

    // Atom
    if let Some(feed) = first_descendant(root, "feed") {
        let entries: Vec<ItemNode> = named_descendants(feed, "entry")
            .map(|entry| ItemNode::Atom(atom_fields(entry)))
            .collect();
        if !entries.is_empty() {
            tracing::info!(
                category = category,
                count = entries.len(),
                "Found entries (Atom format)"
            );
            return entries;
        }
    }

    // Raw HTML link list
    let anchors = parse_anchor_list(&document);
    if !anchors.is_empty() {
        tracing::info!(
            category = category,
            count = anchors.len(),
            "Found links (HTML format)"
        );
        return anchors;
    }

    let sample: String = text.chars().take(PAYLOAD_SAMPLE_CHARS).collect();
    tracing::warn!(
        category = category,
        sample = %sample,
        "No items found in any format"
    );
    Vec::new()
}

// ============================================================================
// Strict XML Pass
// ============================================================================

/// Field slots an `<item>` child element can route into.
#[derive(Debug, Clone, Copy)]
enum XmlField {
    Title,
    Link,
    Description,
    Summary,
    Content,
    PubDate,
    DcDate,
    Published,
    Updated,
}

impl XmlField {
    fn from_name(name: &str) -> Option<Self> {
        // Local names only; "date" is dc:date, "encoded" is content:encoded.
        match name {
            "title" => Some(Self::Title),
            "link" => Some(Self::Link),
            "description" => Some(Self::Description),
            "summary" => Some(Self::Summary),
            "content" | "encoded" => Some(Self::Content),
            "pubdate" => Some(Self::PubDate),
            "date" => Some(Self::DcDate),
            "published" => Some(Self::Published),
            "updated" => Some(Self::Updated),
            _ => None,
        }
    }
}

/// Strict XML probe: collect `<item>` elements with a streaming reader.
///
/// Returns `None` when the payload is not well-formed XML or contains no
/// items, signalling the caller to fall through to the lenient parse.
fn parse_strict_xml(bytes: &[u8]) -> Option<Vec<ItemNode>> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut items: Vec<ItemNode> = Vec::new();
    let mut current: Option<XmlItem> = None;
    let mut field: Option<XmlField> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                if name == "item" {
                    current = Some(XmlItem::default());
                    field = None;
                } else if current.is_some() {
                    field = XmlField::from_name(&name);
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                if name == "item" {
                    if let Some(item) = current.take() {
                        items.push(ItemNode::XmlRss(item));
                    }
                }
                field = None;
            }
            Ok(Event::Text(t)) => {
                if let Ok(text) = t.unescape() {
                    append_field(&mut current, field, &text);
                }
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                append_field(&mut current, field, &text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            // Not well-formed XML: hand the payload to the lenient parse.
            Err(_) => return None,
        }
        buf.clear();
    }

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn append_field(current: &mut Option<XmlItem>, field: Option<XmlField>, text: &str) {
    let (Some(item), Some(field)) = (current.as_mut(), field) else {
        return;
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    let slot = match field {
        XmlField::Title => &mut item.title,
        XmlField::Link => &mut item.link,
        XmlField::Description => &mut item.description,
        XmlField::Summary => &mut item.summary,
        XmlField::Content => &mut item.content,
        XmlField::PubDate => &mut item.pubdate,
        XmlField::DcDate => &mut item.dc_date,
        XmlField::Published => &mut item.published,
        XmlField::Updated => &mut item.updated,
    };
    match slot {
        Some(existing) => existing.push_str(trimmed),
        None => *slot = Some(trimmed.to_string()),
    }
}

// ============================================================================
// Lenient Markup Pass
// ============================================================================

fn first_descendant<'a>(el: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    named_descendants(el, name).next()
}

fn named_descendants<'a, 'b>(
    el: ElementRef<'a>,
    name: &'b str,
) -> impl Iterator<Item = ElementRef<'a>> + 'b
where
    'a: 'b,
{
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == name)
}

/// First non-empty text among the named descendant elements, in priority
/// order of `names`.
fn descendant_text(el: ElementRef<'_>, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(found) = first_descendant(el, name) {
            let text = element_text(found);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Link extraction for RSS parsed as HTML.
///
/// html5ever treats `<link>` as a void element, so `<link>http://…</link>`
/// parses as an empty element with the URL in a trailing text node. Check the
/// href attribute, then the element's own text, then sibling text up to the
/// next element.
fn markup_link(item: ElementRef<'_>) -> Option<String> {
    let link = first_descendant(item, "link")?;

    if let Some(href) = link.value().attr("href") {
        let href = href.trim();
        if !href.is_empty() {
            return Some(href.to_string());
        }
    }

    let own = element_text(link);
    if !own.is_empty() {
        return Some(own);
    }

    for sibling in link.next_siblings() {
        match sibling.value() {
            Node::Text(t) => {
                let text = t.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
            Node::Element(_) => break,
            _ => {}
        }
    }

    None
}

fn markup_fields(item: ElementRef<'_>) -> MarkupFields {
    MarkupFields {
        title: descendant_text(item, &["title"]),
        link: markup_link(item),
        description: descendant_text(item, &["description", "summary", "content"]),
        timestamp: descendant_text(item, &["pubdate", "dc:date", "published", "updated"]),
    }
}

fn atom_fields(entry: ElementRef<'_>) -> MarkupFields {
    // Atom encodes the link as an href attribute, never element text.
    let link = first_descendant(entry, "link")
        .and_then(|l| l.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty());

    MarkupFields {
        title: descendant_text(entry, &["title"]),
        link,
        description: descendant_text(entry, &["description", "summary", "content"]),
        timestamp: descendant_text(entry, &["published", "updated"]),
    }
}

fn parse_anchor_list(document: &Html) -> Vec<ItemNode> {
    let anchor_sel = Selector::parse("a.entry-link").unwrap();
    let title_sel = Selector::parse("h3.entry-title").unwrap();
    let desc_sel = Selector::parse("p.entry-description").unwrap();

    document
        .select(&anchor_sel)
        .filter_map(|anchor| {
            let title = anchor
                .select(&title_sel)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())?;
            let link = anchor
                .value()
                .attr("href")
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty());
            let description = anchor
                .select(&desc_sel)
                .next()
                .map(element_text)
                .filter(|d| !d.is_empty());
            Some(ItemNode::Anchor(AnchorItem {
                title: Some(title),
                link,
                description,
            }))
        })
        .collect()
}

// ============================================================================
// Timestamp Normalization
// ============================================================================

/// Canonical timestamp representation stored in the database.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a feed timestamp, trying four literal formats in fixed order.
///
/// Offset-bearing formats keep their wall-clock fields; no timezone
/// conversion is performed. Returns `None` when nothing matches — callers
/// substitute the current time, which intentionally loses the feed's real
/// value for exotic date formats.
pub fn parse_timestamp(raw: &str) -> Option<String> {
    use chrono::{DateTime, NaiveDateTime};

    let raw = raw.trim();

    // RFC 822
    if let Ok(dt) = DateTime::parse_from_str(raw, "%a, %d %b %Y %H:%M:%S %z") {
        return Some(dt.naive_local().format(TIMESTAMP_FORMAT).to_string());
    }
    // ISO 8601 with offset
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.naive_local().format(TIMESTAMP_FORMAT).to_string());
    }
    // ISO 8601 UTC
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ") {
        return Some(dt.format(TIMESTAMP_FORMAT).to_string());
    }
    // Plain
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        return Some(dt.format(TIMESTAMP_FORMAT).to_string());
    }

    None
}

/// Current local wall-clock time in the canonical format.
pub fn now_stamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

// ============================================================================
// Tests
// ============================================================================
