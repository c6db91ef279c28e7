//! Attribute data structures

use std::fmt;

/// Which of the two attribute tables of an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Archive-level metadata (`manifest.tsv`)
    Manifest,
    /// Component-specific specs (`parameters.tsv`)
    Parameters,
}

impl AttributeKind {
    /// File name of the table inside an archive
    pub fn file_name(self) -> &'static str {
        match self {
            AttributeKind::Manifest => crate::archive::MANIFEST_FILE,
            AttributeKind::Parameters => crate::archive::PARAMETERS_FILE,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Manifest => write!(f, "Manifest"),
            AttributeKind::Parameters => write!(f, "Parameters"),
        }
    }
}

/// A name/value pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" = \"{}\"", self.name, self.value)
    }
}

/// Ordered attribute list. Duplicate names are allowed; lookups return the first match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTable {
    kind: AttributeKind,
    attributes: Vec<Attribute>,
}

impl AttributeTable {
    pub fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
        }
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Append without checking for an existing attribute of the same name
    pub fn push(&mut self, attr: Attribute) {
        self.attributes.push(attr);
    }

    /// First attribute with the given name
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    pub fn get_index(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    /// Overwrite the value of the first attribute named `name`, or append a new one.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        match self.get_mut(name) {
            Some(attr) => attr.value = value.into(),
            None => self.push(Attribute::new(name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attributes.iter()
    }

    pub fn clear(&mut self) {
        self.attributes.clear();
    }

    pub fn as_slice(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl Extend<Attribute> for AttributeTable {
    fn extend<I: IntoIterator<Item = Attribute>>(&mut self, iter: I) {
        self.attributes.extend(iter);
    }
}

impl<'a> IntoIterator for &'a AttributeTable {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}
