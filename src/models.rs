//! Data models for Satisfactory items, recipes and production chains

/// Item ids that no recipe produces. Resolution stops here.
pub const RAW_RESOURCES: [&str; 11] = [
    "Desc_OreIron_C",
    "Desc_OreCopper_C",
    "Desc_OreGold_C",
    "Desc_RawQuartz_C",
    "Desc_OreUranium_C",
    "Desc_LiquidOil_C",
    "Desc_Stone_C",
    "Desc_Coal_C",
    "Desc_SAM_C",
    "Desc_Water_C",
    "Desc_HeavyOilResidue_C",
];

pub fn is_raw_resource(item_id: &str) -> bool {
    RAW_RESOURCES.contains(&item_id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_event: bool, // Sourced from limited-time event content
}

pub const UNKNOWN_MACHINE: &str = "[Unknown Machine]";

/// Known machine archetypes, matched against the producer class id.
const MACHINE_ARCHETYPES: [(&str, &str); 7] = [
    ("ConstructorMk1", "Constructor"),
    ("AssemblerMk1", "Assembler"),
    ("ManufacturerMk1", "Manufacturer"),
    ("Refinery", "Refinery"),
    ("Packager", "Packager"),
    ("Smelter", "Smelter"),
    ("Foundry", "Foundry"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    pub id: String,
    pub name: String,
}

impl Machine {
    /// Build a machine from its class id, naming it after the first matching archetype.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        let name = MACHINE_ARCHETYPES
            .iter()
            .find(|(pattern, _)| id.contains(pattern))
            .map_or(UNKNOWN_MACHINE, |(_, name)| name)
            .to_string();
        Machine { id, name }
    }
}

/// An item reference with the amount consumed or produced per cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub item_id: String,
    pub amount: f64,
}

impl Ingredient {
    pub fn new(item_id: impl Into<String>, amount: f64) -> Self {
        Ingredient {
            item_id: item_id.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub products: Vec<Ingredient>,
    pub machines: Vec<Machine>,
    pub duration_s: f64,
    pub is_event: bool,
}

impl Recipe {
    pub fn has_product(&self, item_id: &str) -> bool {
        self.products.iter().any(|p| p.item_id == item_id)
    }

    /// The product that drives all rate calculations.
    ///
    /// Catalog validation guarantees at least one product, so this only
    /// returns `None` for recipes built outside the catalog.
    pub fn primary_product(&self) -> Option<&Ingredient> {
        self.products.first()
    }

    pub fn is_alternate(&self) -> bool {
        self.name.contains("Alternate")
    }

    /// Display name of the first compatible machine.
    pub fn machine_name(&self) -> &str {
        self.machines
            .first()
            .map_or(UNKNOWN_MACHINE, |m| m.name.as_str())
    }
}

/// A recipe offered for a target item, as shown in a recipe picker
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeCandidate {
    pub recipe_id: String,
    pub name: String,
}

/// How a production node is satisfied
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Raw resource, gathered rather than crafted
    Raw,
    /// Nothing visible produces this item
    Unresolved,
    Produced(Recipe),
}

/// One node of a production chain.
///
/// `demand_rate` is what the parent (or the caller, for the root) asked for;
/// `output_rate` is what this node actually produces after recipe selection,
/// manual edits or rounding. Both are items per minute.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionNode {
    pub item_id: String,
    pub item_name: String,
    pub kind: NodeKind,
    pub candidates: Vec<RecipeCandidate>,
    pub demand_rate: f64,
    pub output_rate: f64,
    pub multiplier: f64,
    pub machine_count: f64,
    pub rounded: bool,
    pub children: Vec<ProductionNode>,
}

impl ProductionNode {
    pub fn recipe(&self) -> Option<&Recipe> {
        match &self.kind {
            NodeKind::Produced(recipe) => Some(recipe),
            _ => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.kind, NodeKind::Raw)
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.kind, NodeKind::Unresolved)
    }

    /// Number of recipe-backed nodes on the longest path from here down.
    pub fn depth(&self) -> usize {
        match self.kind {
            NodeKind::Produced(_) => 1 + self.children.iter().map(|c| c.depth()).max().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn node_at(&self, path: &NodePath) -> Option<&ProductionNode> {
        let mut node = self;
        for &index in path.indices() {
            node = node.children.get(index)?;
        }
        Some(node)
    }

    /// Visit every node depth-first together with its path.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&NodePath, &'a ProductionNode)) {
        fn walk_inner<'a>(
            node: &'a ProductionNode,
            path: &mut NodePath,
            visit: &mut impl FnMut(&NodePath, &'a ProductionNode),
        ) {
            visit(path, node);
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                walk_inner(child, path, visit);
                path.pop();
            }
        }
        walk_inner(self, &mut NodePath::root(), visit);
    }
}

/// Address of a node inside a production tree: child indices from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        NodePath(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        NodePath(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.0.pop()
    }
}

impl std::str::FromStr for NodePath {
    type Err = std::num::ParseIntError;

    /// Parses `root` (or an empty string) and dot-separated indices such as `0.2.1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("root") {
            return Ok(NodePath::root());
        }
        let indices = s
            .split('.')
            .map(|part| part.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NodePath(indices))
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "root");
        }
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}
