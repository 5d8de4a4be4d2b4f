//! Destination of the style declarations generated while converting.
//!
//! Converting a fragment can mint new styles: table and column styles,
//! automatic paragraph and cell styles, list styles. They cannot be written
//! inline, so the converter hands them to a [`StyleRegistry`], which collects
//! them per target part of the document. [`NameAllocator`] provides the unique
//! names tables and lists need.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::style::{ListKind, ListProperties};

/// Part of the final document a declaration must be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleTarget {
    /// Automatic styles of `content.xml`
    Content,
    /// Common styles of `styles.xml`
    StylesBase,
    /// Automatic styles of `styles.xml`
    Styles,
}

impl StyleTarget {
    /// Closing tag the declarations are inserted in front of
    pub const fn hook(&self) -> &'static str {
        match self {
            Self::Content | Self::Styles => "</office:automatic-styles>",
            Self::StylesBase => "</office:styles>",
        }
    }
}

/// Sink for generated style declarations.
///
/// Registration must be idempotent: registering a declaration equal to one
/// already held is a no-op.
pub trait StyleRegistry: Send + Sync {
    /// Record a declaration for a target part
    fn register(&self, target: StyleTarget, declaration: String);
}

/// Provider of names unique within one output document
pub trait NameAllocator: Send + Sync {
    /// A fresh name for an element of some kind (`"table"`, `"list"`)
    fn unique_name(&self, kind: &str) -> String;
}

#[derive(Debug, Default)]
struct Collected {
    content: Vec<String>,
    styles: Vec<String>,
    styles_base: Vec<String>,
    seen: HashSet<(StyleTarget, String)>,
}

impl Collected {
    fn bucket(&mut self, target: StyleTarget) -> &mut Vec<String> {
        match target {
            StyleTarget::Content => &mut self.content,
            StyleTarget::Styles => &mut self.styles,
            StyleTarget::StylesBase => &mut self.styles_base,
        }
    }
}

/// Default registry: an append-only, deduplicating collection shared by all
/// conversions of a document.
///
/// # Examples
///
/// ```
/// use xhtml_odf::odf::registry::{DynamicStyles, StyleRegistry, StyleTarget};
///
/// let styles = DynamicStyles::new();
/// styles.register(StyleTarget::Content, "<style:style style:name=\"T1\"/>".into());
/// styles.register(StyleTarget::Content, "<style:style style:name=\"T1\"/>".into());
/// assert_eq!(styles.declarations(StyleTarget::Content).len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DynamicStyles {
    inner: Mutex<Collected>,
}

impl DynamicStyles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the declarations collected for a target, in registration
    /// order
    pub fn declarations(&self, target: StyleTarget) -> Vec<String> {
        self.inner.lock().bucket(target).clone()
    }

    /// Whether nothing was registered at all
    pub fn is_empty(&self) -> bool {
        self.inner.lock().seen.is_empty()
    }

    /// Insert the declarations collected for `target` into the XML of the
    /// corresponding document part, in front of the target's hook.
    ///
    /// For [`StyleTarget::StylesBase`] the default bulleted and numbered list
    /// styles are injected too, since converted lists reference them.
    pub fn inject_in(&self, target: StyleTarget, xml: &str) -> String {
        let mut declarations = self.declarations(target);
        if target == StyleTarget::StylesBase {
            let list = ListProperties::new(ListKind::Numbered);
            declarations.push(list.dump_style("podNumberedList"));
            let list = ListProperties::new(ListKind::Bulleted);
            declarations.push(list.dump_style("podBulletedList"));
        }
        if declarations.is_empty() {
            return xml.to_string();
        }
        let hook = target.hook();
        let mut replacement = declarations.concat();
        replacement.push_str(hook);
        xml.replace(hook, &replacement)
    }
}

impl StyleRegistry for DynamicStyles {
    fn register(&self, target: StyleTarget, declaration: String) {
        let mut inner = self.inner.lock();
        if inner.seen.insert((target, declaration.clone())) {
            log::trace!("registering {:?} style: {}", target, declaration);
            inner.bucket(target).push(declaration);
        }
    }
}

/// Default name allocator: `Table1`, `Table2`, `List1`, ...
///
/// Counters are kept per kind.
#[derive(Debug, Default)]
pub struct SequentialNames {
    counters: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl SequentialNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of names handed out so far
    pub fn allocated(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

impl NameAllocator for SequentialNames {
    fn unique_name(&self, kind: &str) -> String {
        let mut counters = self.counters.lock();
        let counter = counters.entry(kind.to_string()).or_insert(0);
        *counter += 1;
        self.total.fetch_add(1, Ordering::Relaxed);
        let mut chars = kind.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("{}{}", capitalized, counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_deduplicates_per_target() {
        let styles = DynamicStyles::new();
        styles.register(StyleTarget::Content, "<a/>".into());
        styles.register(StyleTarget::Content, "<b/>".into());
        styles.register(StyleTarget::Content, "<a/>".into());
        styles.register(StyleTarget::Styles, "<a/>".into());
        assert_eq!(styles.declarations(StyleTarget::Content), vec!["<a/>", "<b/>"]);
        assert_eq!(styles.declarations(StyleTarget::Styles), vec!["<a/>"]);
        assert!(styles.declarations(StyleTarget::StylesBase).is_empty());
    }

    #[test]
    fn test_inject_in() {
        let styles = DynamicStyles::new();
        let xml = "<office:automatic-styles></office:automatic-styles>";
        assert_eq!(styles.inject_in(StyleTarget::Content, xml), xml);

        styles.register(StyleTarget::Content, "<s/>".into());
        assert_eq!(
            styles.inject_in(StyleTarget::Content, xml),
            "<office:automatic-styles><s/></office:automatic-styles>"
        );

        let base = styles.inject_in(StyleTarget::StylesBase, "<office:styles></office:styles>");
        assert!(base.contains("style:name=\"podNumberedList\""));
        assert!(base.contains("style:name=\"podBulletedList\""));
        assert!(base.ends_with("</office:styles>"));
    }

    #[test]
    fn test_sequential_names() {
        let names = SequentialNames::new();
        assert_eq!(names.unique_name("table"), "Table1");
        assert_eq!(names.unique_name("table"), "Table2");
        assert_eq!(names.unique_name("list"), "List1");
        assert_eq!(names.allocated(), 3);
    }

    #[test]
    fn test_registry_is_shared_across_threads() {
        let styles = std::sync::Arc::new(DynamicStyles::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let styles = styles.clone();
                std::thread::spawn(move || {
                    styles.register(StyleTarget::Content, "<shared/>".into());
                    styles.register(StyleTarget::Content, format!("<own{}/>", i));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(styles.declarations(StyleTarget::Content).len(), 5);
    }
}
