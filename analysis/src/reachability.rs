//! View reachability from the app's entry points.
//!
//! The navigation graph is built from edges with view names resolved to the
//! canonical spelling of the view records. A breadth-first traversal from
//! the root views marks everything reachable; views left over are orphans
//! (user views) or unused (system views).

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::sync::LazyLock;

use appsheet_nav_core::{NavigationEdge, View, ViewCategory, ViewNameRegistry, ViewType};
use appsheet_nav_store::RootConfig;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

pub const ALWAYS_FALSE_REASON: &str = "Always false show_if condition";

/// Whether a `show_if` condition is statically false.
///
/// Only a handful of literal forms are recognized; anything else may be
/// true.
///
/// # Examples
///
/// ```
/// use appsheet_nav_analysis::is_always_false;
///
/// assert!(is_always_false("FALSE"));
/// assert!(is_always_false("= 1 = 2"));
/// assert!(is_always_false(r#""a"="b""#));
/// assert!(!is_always_false(""));
/// assert!(!is_always_false(r#"USEREMAIL() = "x""#));
/// ```
pub fn is_always_false(condition: &str) -> bool {
    static FALSE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)^\s*=?\s*(false(\s*\(\s*\))?|1\s*=\s*2|"a"\s*=\s*"b"|true\s*=\s*false)\s*$"#)
            .expect("static regex must compile")
    });
    !condition.trim().is_empty() && FALSE_RE.is_match(condition)
}

/// Source view to target views, over canonical view names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
    edge_count: usize,
}

impl NavigationGraph {
    pub fn from_edges(edges: &[NavigationEdge], registry: &ViewNameRegistry) -> Self {
        let mut graph = Self::default();
        for edge in edges {
            let source = edge.source_view.trim();
            let target = edge.target_view.trim();
            if source.is_empty() || target.is_empty() {
                continue;
            }
            graph
                .adjacency
                .entry(registry.canonicalize(source))
                .or_default()
                .insert(registry.canonicalize(target));
            graph.edge_count += 1;
        }
        graph
    }

    pub fn targets_of(&self, view: &str) -> impl Iterator<Item = &str> {
        self.adjacency
            .get(view)
            .into_iter()
            .flat_map(|targets| targets.iter().map(String::as_str))
    }

    pub fn source_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

/// Entry views: primary views in a navigation position and views of a root
/// category, unless their `show_if` is statically false.
pub fn root_views(views: &[View], roots: &RootConfig) -> BTreeSet<String> {
    views
        .iter()
        .filter(|view| !view.name.is_empty() && !is_always_false(&view.show_if))
        .filter(|view| {
            (view.category == ViewCategory::Primary && roots.is_root_position(&view.position))
                || roots.is_root_category(view.category.as_str())
        })
        .map(|view| view.name.clone())
        .collect()
}

/// How a view entered the reachable set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReachStep {
    Root,
    Edge { from: String },
}

impl fmt::Display for ReachStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Edge { from } => write!(f, "navigation edge from {from}"),
        }
    }
}

/// Views reached by the traversal, each with the step that first reached
/// it.
#[derive(Debug, Clone, Default)]
pub struct ReachabilitySet {
    steps: HashMap<String, ReachStep>,
}

impl ReachabilitySet {
    /// Breadth-first traversal from `roots`. Each view is visited once, so
    /// navigation cycles terminate.
    pub fn traverse(graph: &NavigationGraph, roots: &BTreeSet<String>) -> Self {
        let mut steps: HashMap<String, ReachStep> = HashMap::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for root in roots {
            steps.insert(root.clone(), ReachStep::Root);
            queue.push_back(root.clone());
        }
        while let Some(current) = queue.pop_front() {
            for target in graph.targets_of(&current) {
                if steps.contains_key(target) {
                    continue;
                }
                steps.insert(
                    target.to_string(),
                    ReachStep::Edge {
                        from: current.clone(),
                    },
                );
                queue.push_back(target.to_string());
            }
        }
        Self { steps }
    }

    pub fn contains(&self, view: &str) -> bool {
        self.steps.contains_key(view)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, view: &str) -> Option<&ReachStep> {
        self.steps.get(view)
    }

    /// The chain of views from a root to `view`, root first. `None` when
    /// the view was not reached.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use appsheet_nav_analysis::{NavigationGraph, ReachabilitySet};
    /// use appsheet_nav_core::{Availability, NavigationEdge, ViewNameRegistry};
    ///
    /// let registry = ViewNameRegistry::from_names(["Menu", "Archive", "Deep"]);
    /// let edges = vec![
    ///     NavigationEdge::new("Menu", "archive", Availability::Direct),
    ///     NavigationEdge::new("Archive", "Deep", Availability::Direct),
    /// ];
    /// let graph = NavigationGraph::from_edges(&edges, &registry);
    /// let roots = BTreeSet::from(["Menu".to_string()]);
    /// let reached = ReachabilitySet::traverse(&graph, &roots);
    ///
    /// assert_eq!(reached.path_to("Deep").unwrap(), vec!["Menu", "Archive", "Deep"]);
    /// ```
    pub fn path_to(&self, view: &str) -> Option<Vec<String>> {
        let mut path = vec![view.to_string()];
        let mut current = view;
        loop {
            match self.steps.get(current)? {
                ReachStep::Root => break,
                ReachStep::Edge { from } => {
                    if path.len() > self.steps.len() {
                        return None;
                    }
                    path.push(from.clone());
                    current = from;
                }
            }
        }
        path.reverse();
        Some(path)
    }

    pub fn views(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }
}

/// An unreachable view and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreachableView {
    /// Index into the analyzed view slice.
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// Result of [`analyze_reachability`].
#[derive(Debug, Clone, Default)]
pub struct ReachabilityReport {
    pub graph: NavigationGraph,
    pub roots: BTreeSet<String>,
    pub reachable: ReachabilitySet,
    /// Unreachable user views.
    pub orphans: Vec<UnreachableView>,
    /// Unreachable system views.
    pub unused_system: Vec<UnreachableView>,
}

/// Builds the graph, traverses it from the roots, and classifies every view.
pub fn analyze_reachability(
    views: &[View],
    edges: &[NavigationEdge],
    roots: &RootConfig,
) -> ReachabilityReport {
    let registry = ViewNameRegistry::from_names(views.iter().map(|view| &view.name));
    let graph = NavigationGraph::from_edges(edges, &registry);
    let root_set = root_views(views, roots);
    let reachable = ReachabilitySet::traverse(&graph, &root_set);
    debug!(
        edges = graph.edge_count(),
        sources = graph.source_count(),
        roots = root_set.len(),
        reachable = reachable.len(),
        "traversed navigation graph"
    );

    let mut orphans = Vec::new();
    let mut unused_system = Vec::new();
    for (index, view) in views.iter().enumerate() {
        let reason = if is_always_false(&view.show_if) {
            ALWAYS_FALSE_REASON.to_string()
        } else if reachable.contains(&view.name) {
            continue;
        } else {
            unreachable_reason(view)
        };
        let entry = UnreachableView {
            index,
            name: view.name.clone(),
            reason,
        };
        if view.is_system {
            unused_system.push(entry);
        } else {
            orphans.push(entry);
        }
    }

    ReachabilityReport {
        graph,
        roots: root_set,
        reachable,
        orphans,
        unused_system,
    }
}

fn unreachable_reason(view: &View) -> String {
    let kind = if view.view_type == ViewType::Detail {
        "detail view"
    } else if view.category == ViewCategory::Ref {
        "ref view"
    } else {
        "view"
    };
    let subject = if view.is_system {
        format!("System {kind}")
    } else {
        let mut chars = kind.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    };
    format!("{subject} not reachable from any root view")
}
