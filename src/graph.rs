//! Endpoint topology reported by a MIDI service.
//!
//! Enumeration produces a tree: the root holds devices, devices hold port
//! groups, port groups hold input and output leaves. Leaves carry the
//! opaque endpoint token that [`crate::midi::Transport::open_input`] and
//! [`crate::midi::Transport::send`] address.

use std::fmt;

use crate::midi::Endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Device,
    PortGroup,
    Input,
    Output,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Root => "root",
            NodeKind::Device => "device",
            NodeKind::PortGroup => "portGroup",
            NodeKind::Input => "input",
            NodeKind::Output => "output",
        };
        write!(f, "{}", name)
    }
}

/// One node of the endpoint topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub entity: Endpoint,
    pub children: Vec<Node>,
}

impl Node {
    pub fn root() -> Node {
        Node {
            kind: NodeKind::Root,
            name: String::new(),
            manufacturer: String::new(),
            model: String::new(),
            entity: 0,
            children: Vec::new(),
        }
    }

    pub fn new(kind: NodeKind, entity: Endpoint, name: impl Into<String>) -> Node {
        Node {
            kind,
            name: name.into(),
            manufacturer: String::new(),
            model: String::new(),
            entity,
            children: Vec::new(),
        }
    }

    /// All input leaves below this node, depth first.
    pub fn inputs(&self) -> Vec<&Node> {
        self.collect(|n| n.kind == NodeKind::Input)
    }

    /// All output leaves below this node, depth first.
    pub fn outputs(&self) -> Vec<&Node> {
        self.collect(|n| n.kind == NodeKind::Output)
    }

    /// Nodes matching `pred`, in depth-first preorder, including self.
    pub fn collect(&self, pred: impl Fn(&Node) -> bool) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_into(&pred, &mut out);
        out
    }

    fn collect_into<'a>(&'a self, pred: &impl Fn(&Node) -> bool, out: &mut Vec<&'a Node>) {
        if pred(self) {
            out.push(self);
        }
        for child in &self.children {
            child.collect_into(pred, out);
        }
    }

    /// Indented multi-line rendering of the whole tree.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        use std::fmt::Write;
        let _ = writeln!(
            out,
            "{}[{}] entity={} manufacturer=\"{}\" model=\"{}\" name=\"{}\"",
            "  ".repeat(depth),
            self.kind,
            self.entity,
            self.manufacturer,
            self.model,
            self.name
        );
        for child in &self.children {
            child.dump_into(out, depth + 1);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.manufacturer, self.model, self.name, self.kind
        )
    }
}
