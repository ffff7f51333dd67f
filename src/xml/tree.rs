//! Event-preserving XML tree.
//!
//! Elements carry their namespace-resolved name and attributes for lookups,
//! and the original start tag for output. Everything that is not an element
//! (text, CDATA, comments, the prolog) is kept as the raw event it was read
//! as, so writing the tree back reproduces the input byte for byte except
//! where a node was explicitly changed.

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::{Error, Result};

/// A namespace URI plus local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedName {
    pub namespace: Option<Vec<u8>>,
    pub local: Vec<u8>,
}

impl ExpandedName {
    fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace.as_deref() == namespace.map(str::as_bytes) && self.local == local.as_bytes()
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: ExpandedName,
    pub value: String,
}

/// How a text payload is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// `<![CDATA[...]]>`, taken literally by parsers.
    CData,
    /// Character data with markup characters escaped.
    Escaped,
}

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Event(Event<'static>),
}

#[derive(Debug, Clone)]
pub struct Element {
    name: ExpandedName,
    attributes: Vec<Attribute>,
    start: BytesStart<'static>,
    /// `None` for `<empty/>` elements.
    end: Option<BytesEnd<'static>>,
    children: Vec<Node>,
}

impl Element {
    fn open(
        reader: &NsReader<&[u8]>,
        namespace: Option<Vec<u8>>,
        start: BytesStart<'static>,
    ) -> Result<Self> {
        let name = ExpandedName {
            namespace,
            local: start.local_name().as_ref().to_vec(),
        };

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let (resolved, local) = reader.resolve_attribute(attr.key);
            attributes.push(Attribute {
                name: ExpandedName {
                    namespace: namespace_of(resolved),
                    local: local.as_ref().to_vec(),
                },
                value: decode_value(&attr.value),
            });
        }

        Ok(Self {
            name,
            attributes,
            start,
            end: None,
            children: Vec::new(),
        })
    }

    pub fn name(&self) -> &ExpandedName {
        &self.name
    }

    /// Prefixed name as written in the source, e.g. `w:p`.
    pub fn qualified_name(&self) -> String {
        String::from_utf8_lossy(self.start.name().as_ref()).into_owned()
    }

    /// True if this element is `local` in `namespace`.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.matches(Some(namespace), local)
    }

    /// Value of the attribute with the given expanded name. Unprefixed
    /// attributes have no namespace.
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.matches(namespace, local))
            .map(|a| a.value.as_str())
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Event(_) => None,
        })
    }

    /// First direct child element named `local` in `namespace`.
    pub fn child(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.child_elements().find(|el| el.is(namespace, local))
    }

    /// First descendant satisfying `pred`, depth-first in document order.
    /// The element itself is not considered.
    pub fn find_first<P>(&self, pred: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        self.find_first_by(&pred)
    }

    fn find_first_by(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        self.child_elements()
            .find_map(|el| if pred(el) { Some(el) } else { el.find_first_by(pred) })
    }

    /// Mutable counterpart of [`Element::find_first`].
    pub fn find_first_mut<P>(&mut self, pred: P) -> Option<&mut Element>
    where
        P: Fn(&Element) -> bool,
    {
        self.find_first_mut_by(&pred)
    }

    fn find_first_mut_by(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(el) => {
                if pred(el) {
                    Some(el)
                } else {
                    el.find_first_mut_by(pred)
                }
            }
            Node::Event(_) => None,
        })
    }

    /// Call `f` on every descendant, parents before their children.
    pub fn visit_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        for node in &mut self.children {
            if let Node::Element(el) = node {
                f(el);
                el.visit_mut(f);
            }
        }
    }

    /// Concatenated character data of this element and its descendants,
    /// as it appears in the source (entities not expanded).
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Element(el) => el.collect_text(out),
                Node::Event(Event::Text(t)) => out.push_str(&String::from_utf8_lossy(t)),
                Node::Event(Event::CData(t)) => out.push_str(&String::from_utf8_lossy(t)),
                Node::Event(_) => {}
            }
        }
    }

    /// Encoding of the element's direct text content. CDATA wins if present;
    /// an element with no text at all reports CDATA.
    pub fn text_encoding(&self) -> TextEncoding {
        let has = |cdata: bool| {
            self.children.iter().any(|node| match node {
                Node::Event(Event::CData(_)) => cdata,
                Node::Event(Event::Text(_)) => !cdata,
                _ => false,
            })
        };
        if !has(true) && has(false) {
            TextEncoding::Escaped
        } else {
            TextEncoding::CData
        }
    }

    /// Replace all children with a single text node. An `<empty/>` element
    /// gains an explicit end tag.
    pub fn set_text(&mut self, text: &str, encoding: TextEncoding) {
        // a CDATA section cannot contain its own terminator
        let encoding = if text.contains("]]>") {
            TextEncoding::Escaped
        } else {
            encoding
        };
        let event = match encoding {
            TextEncoding::CData => Event::CData(BytesCData::new(text).into_owned()),
            TextEncoding::Escaped => Event::Text(BytesText::new(text).into_owned()),
        };
        self.children = vec![Node::Event(event)];
        if self.end.is_none() {
            self.end = Some(self.start.to_end().into_owned());
        }
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        match &self.end {
            None => writer.write_event(Event::Empty(self.start.clone()))?,
            Some(end) => {
                writer.write_event(Event::Start(self.start.clone()))?;
                for node in &self.children {
                    write_node(node, writer)?;
                }
                writer.write_event(Event::End(end.clone()))?;
            }
        }
        Ok(())
    }
}

/// A parsed XML document: the root element plus whatever surrounds it.
#[derive(Debug, Clone)]
pub struct Document {
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl Document {
    /// Parse a complete document.
    ///
    /// # Errors
    ///
    /// [`Error::Xml`] for tokenizer failures such as mismatched end tags,
    /// [`Error::MalformedDocument`] for unclosed elements or a missing or
    /// duplicated root element.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = NsReader::from_reader(xml);
        let mut buf = Vec::new();
        let mut open: Vec<Element> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();

        loop {
            let (resolved, event) = reader.read_resolved_event_into(&mut buf)?;
            let namespace = namespace_of(resolved);

            match event {
                Event::Start(start) => {
                    open.push(Element::open(&reader, namespace, start.into_owned())?);
                }
                Event::Empty(start) => {
                    let el = Element::open(&reader, namespace, start.into_owned())?;
                    attach(&mut open, &mut nodes, Node::Element(el));
                }
                Event::End(end) => {
                    let mut el = open.pop().ok_or_else(|| {
                        Error::malformed(format!(
                            "unexpected end tag </{}>",
                            String::from_utf8_lossy(end.name().as_ref())
                        ))
                    })?;
                    el.end = Some(end.into_owned());
                    attach(&mut open, &mut nodes, Node::Element(el));
                }
                Event::Eof => break,
                other => attach(&mut open, &mut nodes, Node::Event(other.into_owned())),
            }
            buf.clear();
        }

        if let Some(el) = open.last() {
            return Err(Error::malformed(format!(
                "unclosed element <{}>",
                el.qualified_name()
            )));
        }

        let mut prolog = Vec::new();
        let mut root = None;
        let mut epilog = Vec::new();
        for node in nodes {
            match node {
                Node::Element(el) if root.is_none() => root = Some(el),
                Node::Element(_) => return Err(Error::malformed("more than one root element")),
                other if root.is_none() => prolog.push(other),
                other => epilog.push(other),
            }
        }
        let root = root.ok_or_else(|| Error::malformed("no root element"))?;

        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Serialize without adding an XML declaration.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.prolog {
            write_node(node, &mut writer)?;
        }
        self.root.write_to(&mut writer)?;
        for node in &self.epilog {
            write_node(node, &mut writer)?;
        }
        Ok(writer.into_inner())
    }
}

fn write_node(node: &Node, writer: &mut Writer<Vec<u8>>) -> Result<()> {
    match node {
        Node::Element(el) => el.write_to(writer),
        Node::Event(event) => {
            writer.write_event(event.clone())?;
            Ok(())
        }
    }
}

fn attach(open: &mut [Element], top: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

fn namespace_of(resolved: ResolveResult) -> Option<Vec<u8>> {
    match resolved {
        ResolveResult::Bound(ns) => Some(ns.as_ref().to_vec()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn decode_value(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    match quick_xml::escape::unescape(&raw) {
        Ok(value) => value.into_owned(),
        Err(_) => raw.into_owned(),
    }
}
