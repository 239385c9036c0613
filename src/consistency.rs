use std::collections::HashMap;

use crate::boxes::{BoxHeader, BoxKey, BoxNode, ConsistencyMask, FourCC, SizeHealth};
use crate::payload::BoxPayload;

/// Expectation for one child type (or a group of alternatives) inside a
/// container.
pub struct ChildRule {
    /// Codes that satisfy this rule. More than one code makes the rule a
    /// one-of group.
    pub codes: &'static [[u8; 4]],
    pub mandatory: bool,
    /// Maximum allowed occurrences across all codes of the rule; `None`
    /// means the child may repeat freely.
    pub max: Option<u32>,
}

/// Full child expectation table for one container type.
pub struct ChildSpec {
    pub rules: &'static [ChildRule],
    /// Pairs of codes that must not appear together.
    pub exclusive: &'static [([u8; 4], [u8; 4])],
}

const fn one(code: &'static [u8; 4], mandatory: bool, max: Option<u32>) -> ChildRule {
    ChildRule {
        codes: std::slice::from_ref(code),
        mandatory,
        max,
    }
}

pub static MOOV_CHILDREN: ChildSpec = ChildSpec {
    rules: &[
        one(b"mvhd", true, Some(1)),
        one(b"trak", true, None),
        one(b"mvex", false, Some(1)),
        one(b"udta", false, Some(1)),
    ],
    exclusive: &[],
};

pub static TRAK_CHILDREN: ChildSpec = ChildSpec {
    rules: &[
        one(b"tkhd", true, Some(1)),
        one(b"mdia", true, Some(1)),
        one(b"edts", false, Some(1)),
        one(b"udta", false, Some(1)),
    ],
    exclusive: &[],
};

pub static MDIA_CHILDREN: ChildSpec = ChildSpec {
    rules: &[
        one(b"mdhd", true, Some(1)),
        one(b"hdlr", true, Some(1)),
        one(b"minf", true, Some(1)),
    ],
    exclusive: &[],
};

pub static MINF_CHILDREN: ChildSpec = ChildSpec {
    rules: &[
        ChildRule {
            codes: &[*b"vmhd", *b"smhd", *b"nmhd"],
            mandatory: true,
            max: Some(1),
        },
        one(b"dinf", true, Some(1)),
        one(b"stbl", true, Some(1)),
    ],
    exclusive: &[(*b"vmhd", *b"smhd")],
};

pub static STBL_CHILDREN: ChildSpec = ChildSpec {
    rules: &[
        one(b"stsd", true, Some(1)),
        one(b"stts", true, Some(1)),
        one(b"ctts", false, Some(1)),
        one(b"stsc", false, Some(1)),
        one(b"stsz", false, Some(1)),
        one(b"stz2", false, Some(1)),
        one(b"stco", false, Some(1)),
        one(b"co64", false, Some(1)),
        one(b"stss", false, Some(1)),
        one(b"sdtp", false, Some(1)),
    ],
    exclusive: &[(*b"stco", *b"co64"), (*b"stsz", *b"stz2")],
};

pub static MOOF_CHILDREN: ChildSpec = ChildSpec {
    rules: &[one(b"mfhd", true, Some(1)), one(b"traf", true, None)],
    exclusive: &[],
};

pub static TRAF_CHILDREN: ChildSpec = ChildSpec {
    rules: &[
        one(b"tfhd", true, Some(1)),
        one(b"tfdt", false, Some(1)),
        one(b"trun", false, None),
    ],
    exclusive: &[],
};

pub static MVEX_CHILDREN: ChildSpec = ChildSpec {
    rules: &[one(b"mehd", false, Some(1)), one(b"trex", true, None)],
    exclusive: &[],
};

pub static DINF_CHILDREN: ChildSpec = ChildSpec {
    rules: &[one(b"dref", true, Some(1))],
    exclusive: &[],
};

pub static DREF_CHILDREN: ChildSpec = ChildSpec {
    rules: &[ChildRule {
        codes: &[*b"url ", *b"urn "],
        mandatory: true,
        max: None,
    }],
    exclusive: &[],
};

fn synthetic_node(key: BoxKey, payload: BoxPayload) -> BoxNode {
    BoxNode {
        header: BoxHeader::synthetic(key),
        name: "missing mandatory box",
        payload,
        children: Vec::new(),
        size_health: SizeHealth::Ok,
        consistency: ConsistencyMask::default(),
    }
}

/// Evaluate a container's children against its expectation table.
///
/// Runs after all children are parsed. Missing mandatory children get stub
/// nodes appended, so downstream consumers can rely on every mandatory slot
/// being represented in the tree.
pub fn evaluate(spec: &ChildSpec, node: &mut BoxNode) {
    let mut counts: HashMap<[u8; 4], u32> = HashMap::new();
    for child in &node.children {
        if let Some(cc) = child.header.key.fourcc() {
            *counts.entry(cc.0).or_insert(0) += 1;
        }
    }

    for rule in spec.rules {
        let total: u32 = rule.codes.iter().filter_map(|c| counts.get(c)).sum();
        if rule.mandatory && total == 0 {
            node.consistency.insert(ConsistencyMask::MISSING_MANDATORY);
            let stub = if rule.codes.len() == 1 {
                let key = BoxKey::FourCC(FourCC(rule.codes[0]));
                synthetic_node(key, BoxPayload::MissingMandatory { expected: key })
            } else {
                let expected: Vec<BoxKey> = rule
                    .codes
                    .iter()
                    .map(|c| BoxKey::FourCC(FourCC(*c)))
                    .collect();
                let key = expected[0];
                synthetic_node(key, BoxPayload::MissingMandatoryGroup { expected })
            };
            node.children.push(stub);
        }
        if let Some(max) = rule.max {
            if total > max {
                node.consistency.insert(ConsistencyMask::TOO_MANY);
            }
        }
    }

    for (a, b) in spec.exclusive {
        if counts.contains_key(a) && counts.contains_key(b) {
            node.consistency.insert(ConsistencyMask::CONFLICTING);
        }
    }

    for child in &node.children {
        if child.is_synthetic() {
            continue;
        }
        let expected = match child.header.key.fourcc() {
            Some(cc) => spec.rules.iter().any(|r| r.codes.contains(&cc.0)),
            // Extended-type children are never listed in the tables.
            None => false,
        };
        if !expected {
            node.consistency.insert(ConsistencyMask::UNEXPECTED);
        }
    }
}
