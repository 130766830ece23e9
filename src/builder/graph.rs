//! Stage graph primitives.
//!
//! A [`State`] is an immutable handle on the output of a build operation plus
//! the working directory later operations run in. Chaining methods on a state
//! creates new operations that take the previous output as input, so a chain
//! of states describes a DAG of operations:
//!
//! ```text
//! image(sdk) ──► copy(project) ──► exec(restore) ──► copy(context) ──► exec(build) ...
//!                    ▲                                   ▲
//! local(context) ────┴───────────────────────────────────┘
//! ```
//!
//! Every operation is identified by a content digest over the operation and
//! the digests of its inputs. Identical sub-chains therefore collapse to the
//! same vertices when a state is marshalled into a [`Definition`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::toolchain::CommandSpec;
use crate::sources::LocalSource;
use crate::util::hash::Fingerprint;

/// Permissions for files and directories created by the frontend.
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Error while marshalling a state into a definition.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("cycle detected in stage graph at `{0}`")]
    Cycle(String),

    #[error("invalid platform `{0}`: expected `os/arch[/variant]`")]
    InvalidPlatform(String),
}

/// Target platform of a definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Platform {
    pub os: String,
    pub architecture: String,
    pub variant: Option<String>,
}

impl Platform {
    /// linux/amd64
    pub fn linux_amd64() -> Self {
        Platform {
            os: "linux".to_string(),
            architecture: "amd64".to_string(),
            variant: None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(ref variant) = self.variant {
            write!(f, "/{}", variant)?;
        }
        Ok(())
    }
}

impl FromStr for Platform {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(GraphError::InvalidPlatform(s.to_string()));
        }
        match parts.as_slice() {
            [os, arch] => Ok(Platform {
                os: os.to_string(),
                architecture: arch.to_string(),
                variant: None,
            }),
            [os, arch, variant] => Ok(Platform {
                os: os.to_string(),
                architecture: arch.to_string(),
                variant: Some(variant.to_string()),
            }),
            _ => Err(GraphError::InvalidPlatform(s.to_string())),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.to_string()
    }
}

/// Behaviour flags of a copy operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyInfo {
    /// Source path may contain wildcards
    pub allow_wildcard: bool,

    /// Archives are unpacked into the destination
    pub attempt_unpack: bool,

    /// Missing destination directories are created
    pub create_dest_path: bool,
}

impl CopyInfo {
    /// Behaviour of `COPY` in a conventional Dockerfile.
    pub fn dockerfile() -> Self {
        CopyInfo {
            allow_wildcard: true,
            attempt_unpack: true,
            create_dest_path: true,
        }
    }
}

/// Where the root filesystem of a chain comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceOp {
    /// A container image
    Image { reference: String },

    /// A local source of the invocation
    Local(LocalSource),
}

/// A single filesystem action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FileAction {
    /// Copy `src` of input `from` to `dest`
    Copy {
        from: usize,
        src: String,
        dest: String,
        info: CopyInfo,
    },

    /// Create a directory
    Mkdir { path: String, mode: u32 },

    /// Create a file with the given contents
    Mkfile {
        path: String,
        mode: u32,
        #[serde(with = "hex::serde")]
        data: Vec<u8>,
    },
}

/// A command run on top of its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOp {
    /// argv, program first
    pub args: Vec<String>,

    /// Working directory
    pub cwd: String,
}

/// A build operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Op {
    Source { source: SourceOp },
    File { actions: Vec<FileAction> },
    Exec { exec: ExecOp },
}

impl Op {
    fn fingerprint(&self, fp: &mut Fingerprint) {
        match self {
            Op::Source { source } => {
                fp.update_str("source");
                match source {
                    SourceOp::Image { reference } => {
                        fp.update_str("image").update_str(reference);
                    }
                    SourceOp::Local(local) => {
                        fp.update_str("local")
                            .update_str(&local.name)
                            .update_str(&local.session_id)
                            .update_u32(local.follow_paths.len() as u32)
                            .update_strs(local.follow_paths.iter().map(String::as_str));
                    }
                }
            }
            Op::File { actions } => {
                fp.update_str("file").update_u32(actions.len() as u32);
                for action in actions {
                    match action {
                        FileAction::Copy {
                            from,
                            src,
                            dest,
                            info,
                        } => {
                            fp.update_str("copy")
                                .update_u32(*from as u32)
                                .update_str(src)
                                .update_str(dest)
                                .update_bool(info.allow_wildcard)
                                .update_bool(info.attempt_unpack)
                                .update_bool(info.create_dest_path);
                        }
                        FileAction::Mkdir { path, mode } => {
                            fp.update_str("mkdir").update_str(path).update_u32(*mode);
                        }
                        FileAction::Mkfile { path, mode, data } => {
                            fp.update_str("mkfile")
                                .update_str(path)
                                .update_u32(*mode)
                                .update_bytes(data);
                        }
                    }
                }
            }
            Op::Exec { exec } => {
                fp.update_str("exec")
                    .update_str(&exec.cwd)
                    .update_u32(exec.args.len() as u32)
                    .update_strs(exec.args.iter().map(String::as_str));
            }
        }
    }
}

#[derive(Debug)]
struct Vertex {
    op: Op,
    inputs: Vec<Arc<Vertex>>,
    digest: String,
}

impl Vertex {
    fn new(op: Op, inputs: Vec<Arc<Vertex>>) -> Arc<Self> {
        let mut fp = Fingerprint::new();
        op.fingerprint(&mut fp);
        fp.update_strs(inputs.iter().map(|i| i.digest.as_str()));

        Arc::new(Vertex {
            op,
            inputs,
            digest: format!("sha256:{}", fp.finish()),
        })
    }
}

/// The output of an operation together with the directory later operations run in.
#[derive(Debug, Clone)]
pub struct State {
    output: Arc<Vertex>,
    dir: String,
}

impl State {
    fn from_source(source: SourceOp) -> Self {
        State {
            output: Vertex::new(Op::Source { source }, Vec::new()),
            dir: "/".to_string(),
        }
    }

    /// Start a chain from a container image.
    pub fn image(reference: impl Into<String>) -> Self {
        Self::from_source(SourceOp::Image {
            reference: reference.into(),
        })
    }

    /// Start a chain from a local source of the invocation.
    pub fn local(source: LocalSource) -> Self {
        Self::from_source(SourceOp::Local(source))
    }

    /// Digest of the operation producing this state.
    pub fn digest(&self) -> &str {
        &self.output.digest
    }

    /// Current working directory.
    pub fn get_dir(&self) -> &str {
        &self.dir
    }

    /// Change the working directory. Relative paths resolve against the current one.
    pub fn dir(mut self, path: &str) -> Self {
        self.dir = resolve_path(&self.dir, path);
        self
    }

    /// Copy `src_path` from another state into `dest_path`, like `COPY --from`.
    pub fn copy_from(self, src: &State, src_path: &str, dest_path: &str) -> Self {
        let action = FileAction::Copy {
            from: 1,
            src: join_source_path(&src.dir, src_path),
            dest: resolve_path(&self.dir, dest_path),
            info: CopyInfo::dockerfile(),
        };
        self.file(action, Some(src))
    }

    /// Copy the whole of another state over `dest_path`.
    pub fn copy_all(self, src: &State, dest_path: &str) -> Self {
        self.copy_from(src, "/.", dest_path)
    }

    /// Create a directory.
    pub fn mkdir(self, path: &str, mode: u32) -> Self {
        let action = FileAction::Mkdir {
            path: resolve_path(&self.dir, path),
            mode,
        };
        self.file(action, None)
    }

    /// Create a file with the given contents.
    pub fn mkfile(self, path: &str, mode: u32, data: impl Into<Vec<u8>>) -> Self {
        let action = FileAction::Mkfile {
            path: resolve_path(&self.dir, path),
            mode,
            data: data.into(),
        };
        self.file(action, None)
    }

    /// Run a command in the current working directory.
    pub fn run(self, command: &CommandSpec) -> Self {
        let mut args = Vec::with_capacity(command.args.len() + 1);
        args.push(command.program.clone());
        args.extend(command.args.iter().cloned());

        let exec = ExecOp {
            args,
            cwd: self.dir.clone(),
        };

        State {
            output: Vertex::new(Op::Exec { exec }, vec![self.output]),
            dir: self.dir,
        }
    }

    fn file(self, action: FileAction, secondary: Option<&State>) -> Self {
        let mut inputs = vec![self.output];
        if let Some(src) = secondary {
            inputs.push(Arc::clone(&src.output));
        }

        State {
            output: Vertex::new(
                Op::File {
                    actions: vec![action],
                },
                inputs,
            ),
            dir: self.dir,
        }
    }
}

/// A marshalled operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Content digest of the operation and its inputs
    pub digest: String,

    /// Digests of the input operations, in input order
    pub inputs: Vec<String>,

    /// The operation itself
    #[serde(flatten)]
    pub op: Op,
}

/// A serialized stage graph ready for submission.
///
/// Nodes are deduplicated and listed so that every node comes after its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Platform every operation targets
    pub platform: Platform,

    /// Digest of the node whose output is the result
    pub terminal: String,

    /// All reachable nodes in dependency order
    pub nodes: Vec<Node>,
}

impl Definition {
    /// Marshal everything reachable from `state`.
    pub fn marshal(state: &State, platform: &Platform) -> Result<Self, GraphError> {
        let mut graph: DiGraph<Arc<Vertex>, ()> = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();
        let mut pending = vec![Arc::clone(&state.output)];

        while let Some(vertex) = pending.pop() {
            if index.contains_key(&vertex.digest) {
                continue;
            }
            let node = graph.add_node(Arc::clone(&vertex));
            index.insert(vertex.digest.clone(), node);
            pending.extend(vertex.inputs.iter().cloned());
        }

        for node in graph.node_indices().collect::<Vec<_>>() {
            let inputs: Vec<NodeIndex> = graph[node]
                .inputs
                .iter()
                .filter_map(|i| index.get(&i.digest).copied())
                .collect();
            for input in inputs {
                if !graph.contains_edge(input, node) {
                    graph.add_edge(input, node, ());
                }
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| GraphError::Cycle(graph[cycle.node_id()].digest.clone()))?;

        let nodes = order
            .into_iter()
            .map(|idx| {
                let vertex = &graph[idx];
                Node {
                    digest: vertex.digest.clone(),
                    inputs: vertex.inputs.iter().map(|i| i.digest.clone()).collect(),
                    op: vertex.op.clone(),
                }
            })
            .collect();

        Ok(Definition {
            platform: platform.clone(),
            terminal: state.output.digest.clone(),
            nodes,
        })
    }

    /// Get a node by digest.
    pub fn node(&self, digest: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.digest == digest)
    }

    /// The node producing the result.
    pub fn terminal_node(&self) -> Option<&Node> {
        self.node(&self.terminal)
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the definition has no operations.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The commands run by this definition, in dependency order.
    pub fn commands(&self) -> Vec<&ExecOp> {
        self.nodes
            .iter()
            .filter_map(|n| match &n.op {
                Op::Exec { exec } => Some(exec),
                _ => None,
            })
            .collect()
    }

    /// Image references used as chain roots.
    pub fn images(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|n| match &n.op {
                Op::Source {
                    source: SourceOp::Image { reference },
                } => Some(reference.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Walk the primary-input chain from the terminal node back to its root.
    ///
    /// The result is ordered root first.
    pub fn primary_chain(&self) -> Vec<&Node> {
        let mut chain = Vec::new();
        let mut current = self.terminal_node();
        while let Some(node) = current {
            chain.push(node);
            current = node.inputs.first().and_then(|d| self.node(d));
        }
        chain.reverse();
        chain
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Resolve `path` against `base` the way a working directory does.
fn resolve_path(base: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    };
    clean_path(&joined)
}

/// Like [`resolve_path`], but keeps a trailing `/.` so "contents of" is preserved.
fn join_source_path(base: &str, path: &str) -> String {
    if path == "/." || path.ends_with("/.") {
        let dir = resolve_path(base, path.trim_end_matches('.'));
        if dir == "/" {
            return "/.".to_string();
        }
        return format!("{}/.", dir);
    }
    resolve_path(base, path)
}

fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}
