use indexmap::IndexSet;
use std::fmt;

/// Handle into the resource arena owned by [`super::ResourceStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) usize);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Android resource types, ordered alphabetically by their `R` class name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Anim,
    Animator,
    Array,
    Attr,
    Bool,
    Color,
    Dimen,
    Drawable,
    Font,
    Fraction,
    Id,
    Integer,
    Interpolator,
    Layout,
    Macro,
    Menu,
    Mipmap,
    Navigation,
    Plurals,
    Raw,
    String,
    Style,
    Styleable,
    Transition,
    Xml,
}

impl ResourceType {
    pub const ALL: [ResourceType; 25] = [
        ResourceType::Anim,
        ResourceType::Animator,
        ResourceType::Array,
        ResourceType::Attr,
        ResourceType::Bool,
        ResourceType::Color,
        ResourceType::Dimen,
        ResourceType::Drawable,
        ResourceType::Font,
        ResourceType::Fraction,
        ResourceType::Id,
        ResourceType::Integer,
        ResourceType::Interpolator,
        ResourceType::Layout,
        ResourceType::Macro,
        ResourceType::Menu,
        ResourceType::Mipmap,
        ResourceType::Navigation,
        ResourceType::Plurals,
        ResourceType::Raw,
        ResourceType::String,
        ResourceType::Style,
        ResourceType::Styleable,
        ResourceType::Transition,
        ResourceType::Xml,
    ];

    /// Name used in `R` classes, resource URLs and resource tables
    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Anim => "anim",
            ResourceType::Animator => "animator",
            ResourceType::Array => "array",
            ResourceType::Attr => "attr",
            ResourceType::Bool => "bool",
            ResourceType::Color => "color",
            ResourceType::Dimen => "dimen",
            ResourceType::Drawable => "drawable",
            ResourceType::Font => "font",
            ResourceType::Fraction => "fraction",
            ResourceType::Id => "id",
            ResourceType::Integer => "integer",
            ResourceType::Interpolator => "interpolator",
            ResourceType::Layout => "layout",
            ResourceType::Macro => "macro",
            ResourceType::Menu => "menu",
            ResourceType::Mipmap => "mipmap",
            ResourceType::Navigation => "navigation",
            ResourceType::Plurals => "plurals",
            ResourceType::Raw => "raw",
            ResourceType::String => "string",
            ResourceType::Style => "style",
            ResourceType::Styleable => "styleable",
            ResourceType::Transition => "transition",
            ResourceType::Xml => "xml",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Resource type for a `res/` folder name such as `drawable-hdpi-v21`
    pub fn from_folder(folder: &str) -> Option<Self> {
        let base = folder.split('-').next().unwrap_or(folder);
        match base {
            "values" => None,
            _ => Self::from_name(base),
        }
    }

    /// Resource type declared by a `values/*.xml` element tag
    pub fn from_values_tag(tag: &str) -> Option<Self> {
        match tag {
            "string-array" | "integer-array" | "array" => Some(ResourceType::Array),
            "declare-styleable" => Some(ResourceType::Styleable),
            "item" => None,
            other => Self::from_name(other),
        }
    }

    /// Types whose resources are backed by a file under `res/<type>/`
    pub fn is_file_based(&self) -> bool {
        matches!(
            self,
            ResourceType::Anim
                | ResourceType::Animator
                | ResourceType::Color
                | ResourceType::Drawable
                | ResourceType::Font
                | ResourceType::Interpolator
                | ResourceType::Layout
                | ResourceType::Menu
                | ResourceType::Mipmap
                | ResourceType::Navigation
                | ResourceType::Raw
                | ResourceType::Transition
                | ResourceType::Xml
        )
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl serde::Serialize for ResourceType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Normalize a resource name the way `R` fields are named (`a.b-c` -> `a_b_c`)
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '.' | '-' | ':' => '_',
            c => c,
        })
        .collect()
}

/// A declared resource and its reachability state
#[derive(Debug, Clone)]
pub struct Resource {
    /// Owning package name, when known
    pub package: Option<String>,
    pub resource_type: ResourceType,
    /// Normalized name
    pub name: String,
    /// Compiled resource ID (0xPPTTEEEE)
    pub id: Option<u32>,
    /// Archive-relative file paths (`res/drawable-hdpi/icon.png`)
    pub files: Vec<String>,
    /// Inline value for value-backed resources
    pub value: Option<String>,
    pub(crate) reachable: bool,
    pub(crate) references: IndexSet<ResourceId>,
}

impl Resource {
    pub fn new(package: Option<&str>, resource_type: ResourceType, name: &str, id: Option<u32>) -> Self {
        Self {
            package: package.map(str::to_string),
            resource_type,
            name: normalize_name(name),
            id,
            files: Vec::new(),
            value: None,
            reachable: false,
            references: IndexSet::new(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    /// Direct references in discovery order
    pub fn references(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.references.iter().copied()
    }

    /// `@type/name`, or `@pkg:type/name` when packages are qualified
    pub fn url(&self, qualified: bool) -> String {
        match (&self.package, qualified) {
            (Some(package), true) => {
                format!("@{}:{}/{}", package, self.resource_type, self.name)
            }
            _ => format!("@{}/{}", self.resource_type, self.name),
        }
    }
}

/// A parsed `@[+][pkg:]type/name` or `?[pkg:][type/]name` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrl {
    pub package: Option<String>,
    pub resource_type: ResourceType,
    pub name: String,
}

impl ResourceUrl {
    /// Parse a resource URL; framework (`@android:`) references yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (rest, theme_ref) = if let Some(rest) = value.strip_prefix('?') {
            (rest, true)
        } else if let Some(rest) = value.strip_prefix('@') {
            (rest.strip_prefix('+').unwrap_or(rest), false)
        } else {
            return None;
        };

        let (package, rest) = match rest.split_once(':') {
            Some((package, rest)) if !rest.contains(':') => (Some(package), rest),
            Some(_) => return None,
            None => (None, rest),
        };
        if package == Some("android") || package.is_some_and(|p| p.starts_with('*')) {
            return None;
        }

        let (resource_type, name) = match rest.split_once('/') {
            Some((ty, name)) => (ResourceType::from_name(ty)?, name),
            None if theme_ref => (ResourceType::Attr, rest),
            None => return None,
        };
        if name.is_empty() {
            return None;
        }

        Some(Self {
            package: package.map(str::to_string),
            resource_type,
            // Aapt accepts `@drawable/foo.xml` in compiled sources
            name: normalize_name(strip_file_extension(resource_type, name)),
        })
    }
}

fn strip_file_extension(resource_type: ResourceType, name: &str) -> &str {
    if !resource_type.is_file_based() {
        return name;
    }
    match name.find('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}
