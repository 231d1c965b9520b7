//! Binary knowledge file codec
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic u32 = 0x41544C35 | version u32 = 1 | node_count u32
//! node_count records in breadth-first order, id 0 = root:
//!   is_question u8 (0 or 1)
//!   text_len    u32 (bytes, no terminator)
//!   text        [u8; text_len]
//!   yes_id      i32 (-1 if absent)
//!   no_id       i32 (-1 if absent)
//! ```
//!
//! Node ids are not stored on nodes; both directions recompute them with the
//! same breadth-first walk (yes child before no child).

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{Answer, DomainError, KnowledgeTree, NodeId, NodeKind, WorkQueue};

pub const MAGIC: u32 = 0x41544C35;
pub const VERSION: u32 = 1;
pub const MAX_NODES: u32 = 100_000;
/// Exclusive upper bound on text length in bytes
pub const MAX_TEXT_LEN: u32 = 10_000;

const HEADER_LEN: usize = 12;
const ABSENT: i32 = -1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("not a knowledge file (magic {magic:#010x}, version {version})")]
    HeaderMismatch { magic: u32, version: u32 },

    #[error("corrupt knowledge file: {field} out of range ({value})")]
    Bounds { field: &'static str, value: i64 },

    #[error("corrupt knowledge file: truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("corrupt knowledge file: text of node {id} is not UTF-8")]
    InvalidText { id: usize },

    #[error("corrupt knowledge file: node {id} is not part of a single tree")]
    NotATree { id: usize },

    #[error("knowledge tree is empty")]
    EmptyTree,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Breadth-first enumeration: position in the returned vector is the node id.
fn assign_ids(
    tree: &KnowledgeTree,
    root: NodeId,
) -> Result<(Vec<NodeId>, HashMap<NodeId, i32>), CodecError> {
    let mut order = vec![root];
    let mut ids = HashMap::from([(root, 0)]);
    let mut queue = WorkQueue::new();
    queue.enqueue(root, 0)?;

    while let Some((node, _)) = queue.dequeue() {
        let Some(node) = tree.get_node(node) else {
            continue;
        };
        for child in [node.yes, node.no].into_iter().flatten() {
            if !tree.contains(child) {
                continue;
            }
            let id = order.len();
            order.push(child);
            ids.insert(child, id as i32);
            queue.enqueue(child, id)?;
        }
    }
    Ok((order, ids))
}

struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }
}

#[instrument(level = "debug", skip(tree))]
pub fn encode(tree: &KnowledgeTree) -> Result<Vec<u8>, CodecError> {
    let root = tree.root().ok_or(CodecError::EmptyTree)?;
    let (order, ids) = assign_ids(tree, root)?;
    if order.len() > MAX_NODES as usize {
        return Err(CodecError::Bounds {
            field: "node count",
            value: order.len() as i64,
        });
    }

    let mut enc = Encoder {
        buf: Vec::with_capacity(HEADER_LEN + order.len() * 32),
    };
    enc.put_u32(MAGIC);
    enc.put_u32(VERSION);
    enc.put_u32(order.len() as u32);

    for &id in &order {
        let Some(node) = tree.get_node(id) else {
            continue;
        };
        let text = node.text.as_bytes();
        if text.is_empty() || text.len() >= MAX_TEXT_LEN as usize {
            return Err(CodecError::Bounds {
                field: "text length",
                value: text.len() as i64,
            });
        }
        let child_id = |answer: Answer| {
            node.child(answer)
                .and_then(|c| ids.get(&c).copied())
                .unwrap_or(ABSENT)
        };

        enc.put_u8(u8::from(node.is_question()));
        enc.put_u32(text.len() as u32);
        enc.buf.extend_from_slice(text);
        enc.put_i32(child_id(Answer::Yes));
        enc.put_i32(child_id(Answer::No));
    }
    debug!("encode: {} nodes, {} bytes", order.len(), enc.buf.len());
    Ok(enc.buf)
}

struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(CodecError::Truncated { offset: self.pos })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn array4(&mut self) -> Result<[u8; 4], CodecError> {
        let s = self.take(4)?;
        Ok([s[0], s[1], s[2], s[3]])
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.array4()?))
    }

    fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.array4()?))
    }
}

struct Record {
    kind: NodeKind,
    text: String,
    yes: i32,
    no: i32,
}

fn child_index(id: i32, count: u32) -> Result<Option<usize>, CodecError> {
    if id < ABSENT || id >= count as i32 {
        return Err(CodecError::Bounds {
            field: "child id",
            value: i64::from(id),
        });
    }
    Ok(usize::try_from(id).ok())
}

/// Rebuild a tree from its encoded form.
///
/// Every record is parsed and validated before any node is allocated; nodes
/// are then allocated in id order and linked in a second pass, since a record
/// may name a child that comes later in the file.
#[instrument(level = "debug", skip(bytes), fields(len = bytes.len()))]
pub fn decode(bytes: &[u8]) -> Result<KnowledgeTree, CodecError> {
    let mut dec = Decoder { bytes, pos: 0 };
    let magic = dec.u32()?;
    let version = dec.u32()?;
    let count = dec.u32()?;
    if magic != MAGIC || version != VERSION {
        return Err(CodecError::HeaderMismatch { magic, version });
    }
    if count == 0 || count > MAX_NODES {
        return Err(CodecError::Bounds {
            field: "node count",
            value: i64::from(count),
        });
    }

    let mut records = Vec::with_capacity(count as usize);
    for id in 0..count as usize {
        let kind = match dec.u8()? {
            0 => NodeKind::Leaf,
            1 => NodeKind::Question,
            other => {
                return Err(CodecError::Bounds {
                    field: "node kind",
                    value: i64::from(other),
                })
            }
        };
        let text_len = dec.u32()?;
        if text_len == 0 || text_len >= MAX_TEXT_LEN {
            return Err(CodecError::Bounds {
                field: "text length",
                value: i64::from(text_len),
            });
        }
        let raw = dec.take(text_len as usize)?;
        let text = String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidText { id })?;
        let yes = dec.i32()?;
        let no = dec.i32()?;
        child_index(yes, count)?;
        child_index(no, count)?;
        records.push(Record {
            kind,
            text,
            yes,
            no,
        });
    }

    // each non-root node must hang under exactly one edge
    let mut has_parent = vec![false; records.len()];
    for record in &records {
        for child in [record.yes, record.no] {
            let Some(child) = child_index(child, count)? else {
                continue;
            };
            if child == 0 || has_parent[child] {
                return Err(CodecError::NotATree { id: child });
            }
            has_parent[child] = true;
        }
    }
    if let Some(orphan) = has_parent.iter().skip(1).position(|&p| !p) {
        return Err(CodecError::NotATree { id: orphan + 1 });
    }

    let mut tree = KnowledgeTree::new();
    let mut links = Vec::with_capacity(records.len());
    let handles: Vec<NodeId> = records
        .into_iter()
        .map(|r| {
            links.push((r.yes, r.no));
            tree.insert_node(r.kind, r.text)
        })
        .collect();

    for (&handle, &(yes, no)) in handles.iter().zip(&links) {
        let resolve = |id: i32| usize::try_from(id).ok().map(|i| handles[i]);
        tree.set_child(handle, Answer::Yes, resolve(yes))
            .map_err(|_| CodecError::NotATree { id: 0 })?;
        tree.set_child(handle, Answer::No, resolve(no))
            .map_err(|_| CodecError::NotATree { id: 0 })?;
    }
    tree.set_root(Some(handles[0]));

    // one parent per node still allows a detached cycle; it is unreachable
    let reachable = assign_ids(&tree, handles[0])?.0.len();
    if reachable != handles.len() {
        return Err(CodecError::NotATree { id: reachable });
    }
    debug!("decode: {} nodes", handles.len());
    Ok(tree)
}
